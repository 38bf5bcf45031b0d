//! Product profitability for products with revenue above 1000.

use super::{ratio, writer::ReportRow};
use crate::error::Result;
use crate::store::Store;
use serde::Serialize;
use std::cmp::Ordering;

pub const MIN_REVENUE: f64 = 1000.0;

fn profitability_sql() -> String {
    format!(
        "SELECT EnglishProductName, EnglishProductSubcategoryName,
                TOTAL(SalesAmount) AS total_revenue,
                TOTAL(TotalProductCost) AS total_cost,
                CAST(TOTAL(OrderQuantity) AS INTEGER) AS total_units
         FROM full_sales_data
         GROUP BY EnglishProductName, EnglishProductSubcategoryName
         HAVING TOTAL(SalesAmount) > {}
         ORDER BY total_revenue DESC, EnglishProductName",
        MIN_REVENUE
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductProfit {
    #[serde(rename = "EnglishProductName")]
    pub product: Option<String>,
    #[serde(rename = "EnglishProductSubcategoryName")]
    pub subcategory: Option<String>,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub profit_margin: Option<f64>,
    pub total_units: i64,
}

impl ReportRow for ProductProfit {
    const HEADER: &'static [&'static str] = &[
        "EnglishProductName",
        "EnglishProductSubcategoryName",
        "total_revenue",
        "total_cost",
        "total_profit",
        "profit_margin",
        "total_units",
    ];
}

/// `(revenue - cost) / revenue`, undefined for zero revenue.
pub fn profit_margin(revenue: f64, cost: f64) -> Option<f64> {
    ratio(revenue - cost, revenue)
}

pub fn product_profitability(store: &Store) -> Result<Vec<ProductProfit>> {
    let mut rows = store.query(&profitability_sql(), |row| {
        let total_revenue: f64 = row.get(2)?;
        let total_cost: f64 = row.get(3)?;
        Ok(ProductProfit {
            product: row.get(0)?,
            subcategory: row.get(1)?,
            total_revenue,
            total_cost,
            total_profit: total_revenue - total_cost,
            profit_margin: profit_margin(total_revenue, total_cost),
            total_units: row.get(4)?,
        })
    })?;

    // highest margin first, undefined margins last
    rows.sort_by(|a, b| match (a.profit_margin, b.profit_margin) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_formula() {
        assert_eq!(profit_margin(200.0, 150.0), Some(0.25));
        assert_eq!(profit_margin(100.0, 130.0), Some(-0.3));
        assert_eq!(profit_margin(0.0, 15.0), None);
    }

    #[test]
    fn test_filters_small_products_and_orders_by_margin() {
        let store = Store::open_in_memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE full_sales_data (EnglishProductName TEXT, EnglishProductSubcategoryName TEXT,
                     SalesAmount REAL, TotalProductCost REAL, OrderQuantity INTEGER);
                 INSERT INTO full_sales_data VALUES
                     ('Road Bike', 'Road Bikes', 2000.0, 1200.0, 1),
                     ('Road Bike', 'Road Bikes', 2000.0, 1600.0, 1),
                     ('Touring Bike', 'Touring Bikes', 1500.0, 750.0, 1),
                     ('Helmet', 'Helmets', 600.0, 100.0, 10),
                     ('Helmet', 'Helmets', 400.0, 100.0, 10);",
            )
            .unwrap();

        let rows = product_profitability(&store).unwrap();
        // Helmet has exactly 1000 revenue and is excluded
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product.as_deref(), Some("Touring Bike"));
        assert_eq!(rows[0].profit_margin, Some(0.5));
        assert_eq!(rows[1].product.as_deref(), Some("Road Bike"));
        assert_eq!(rows[1].total_profit, 1200.0);
        assert_eq!(rows[1].profit_margin, Some(0.3));
        assert_eq!(rows[1].total_units, 2);
    }
}
