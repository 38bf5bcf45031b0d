//! Customer spend by yearly income band.
//!
//! Bands: Low below 30000, Middle from 30000 to 60000 inclusive, High above
//! 60000. Sales of customers without a recorded income are left out.

use super::{ratio, writer::ReportRow};
use crate::error::Result;
use crate::store::Store;
use serde::Serialize;

pub const LOW_INCOME_CEILING: f64 = 30_000.0;
pub const HIGH_INCOME_FLOOR: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeBand {
    Low,
    Middle,
    High,
}

impl IncomeBand {
    pub fn classify(income: f64) -> Self {
        if income < LOW_INCOME_CEILING {
            IncomeBand::Low
        } else if income <= HIGH_INCOME_FLOOR {
            IncomeBand::Middle
        } else {
            IncomeBand::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncomeBand::Low => "Low Income",
            IncomeBand::Middle => "Middle Income",
            IncomeBand::High => "High Income",
        }
    }
}

fn income_sql() -> String {
    format!(
        "SELECT CASE
                    WHEN YearlyIncome < {low} THEN '{low_label}'
                    WHEN YearlyIncome <= {high} THEN '{middle_label}'
                    ELSE '{high_label}'
                END AS income_group,
                COUNT(DISTINCT CustomerKey) AS customer_count,
                TOTAL(SalesAmount) AS total_spend
         FROM full_sales_data
         WHERE YearlyIncome IS NOT NULL
         GROUP BY income_group
         ORDER BY total_spend DESC, income_group",
        low = LOW_INCOME_CEILING,
        high = HIGH_INCOME_FLOOR,
        low_label = IncomeBand::Low.label(),
        middle_label = IncomeBand::Middle.label(),
        high_label = IncomeBand::High.label(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeSpend {
    pub income_group: String,
    pub customer_count: i64,
    pub total_spend: f64,
    pub spend_per_customer: Option<f64>,
}

impl ReportRow for IncomeSpend {
    const HEADER: &'static [&'static str] =
        &["income_group", "customer_count", "total_spend", "spend_per_customer"];
}

pub fn income_spend(store: &Store) -> Result<Vec<IncomeSpend>> {
    store.query(&income_sql(), |row| {
        let customer_count: i64 = row.get(1)?;
        let total_spend: f64 = row.get(2)?;
        Ok(IncomeSpend {
            income_group: row.get(0)?,
            customer_count,
            total_spend,
            spend_per_customer: ratio(total_spend, customer_count as f64),
        })
    })
}
