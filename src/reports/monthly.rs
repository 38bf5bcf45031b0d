//! Monthly sales trend.

use super::writer::ReportRow;
use crate::error::Result;
use crate::store::Store;
use serde::Serialize;

// month number is grouped on for ordering but not emitted
const MONTHLY_SQL: &str = "
    SELECT CalendarYear, EnglishMonthName,
           TOTAL(SalesAmount) AS total_sales,
           CAST(TOTAL(OrderQuantity) AS INTEGER) AS total_units
    FROM full_sales_data
    GROUP BY CalendarYear, EnglishMonthName, MonthNumberOfYear
    ORDER BY CalendarYear, MonthNumberOfYear";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    #[serde(rename = "CalendarYear")]
    pub year: Option<i64>,
    #[serde(rename = "EnglishMonthName")]
    pub month: Option<String>,
    pub total_sales: f64,
    pub total_units: i64,
}

impl ReportRow for MonthlySales {
    const HEADER: &'static [&'static str] =
        &["CalendarYear", "EnglishMonthName", "total_sales", "total_units"];
}

pub fn monthly_sales(store: &Store) -> Result<Vec<MonthlySales>> {
    store.query(MONTHLY_SQL, |row| {
        Ok(MonthlySales {
            year: row.get(0)?,
            month: row.get(1)?,
            total_sales: row.get(2)?,
            total_units: row.get(3)?,
        })
    })
}
