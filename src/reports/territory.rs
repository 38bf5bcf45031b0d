//! Sales per territory with distinct order counts.

use super::{ratio, writer::ReportRow};
use crate::error::Result;
use crate::store::Store;
use serde::Serialize;

const TERRITORY_SQL: &str = "
    SELECT SalesTerritoryCountry, SalesTerritoryRegion,
           TOTAL(SalesAmount) AS total_sales,
           COUNT(DISTINCT SalesOrderNumber) AS order_count
    FROM full_sales_data
    GROUP BY SalesTerritoryCountry, SalesTerritoryRegion
    ORDER BY total_sales DESC, SalesTerritoryCountry, SalesTerritoryRegion";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerritorySales {
    #[serde(rename = "SalesTerritoryCountry")]
    pub country: Option<String>,
    #[serde(rename = "SalesTerritoryRegion")]
    pub region: Option<String>,
    pub total_sales: f64,
    pub order_count: i64,
    pub avg_order_value: Option<f64>,
}

impl ReportRow for TerritorySales {
    const HEADER: &'static [&'static str] = &[
        "SalesTerritoryCountry",
        "SalesTerritoryRegion",
        "total_sales",
        "order_count",
        "avg_order_value",
    ];
}

pub fn territory_sales(store: &Store) -> Result<Vec<TerritorySales>> {
    store.query(TERRITORY_SQL, |row| {
        let total_sales: f64 = row.get(2)?;
        let order_count: i64 = row.get(3)?;
        Ok(TerritorySales {
            country: row.get(0)?,
            region: row.get(1)?,
            total_sales,
            order_count,
            avg_order_value: ratio(total_sales, order_count as f64),
        })
    })
}
