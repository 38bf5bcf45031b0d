//! Revenue and units per product category and subcategory.

use super::{ratio, writer::ReportRow};
use crate::error::Result;
use crate::store::Store;
use serde::Serialize;

const CATEGORY_SQL: &str = "
    SELECT EnglishProductCategoryName, EnglishProductSubcategoryName,
           TOTAL(SalesAmount) AS total_revenue,
           CAST(TOTAL(OrderQuantity) AS INTEGER) AS total_units
    FROM full_sales_data
    GROUP BY EnglishProductCategoryName, EnglishProductSubcategoryName
    ORDER BY total_revenue DESC, EnglishProductCategoryName, EnglishProductSubcategoryName";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    #[serde(rename = "EnglishProductCategoryName")]
    pub category: Option<String>,
    #[serde(rename = "EnglishProductSubcategoryName")]
    pub subcategory: Option<String>,
    pub total_revenue: f64,
    pub total_units: i64,
    /// Empty when the group sold no units
    pub avg_price: Option<f64>,
}

impl ReportRow for CategorySales {
    const HEADER: &'static [&'static str] = &[
        "EnglishProductCategoryName",
        "EnglishProductSubcategoryName",
        "total_revenue",
        "total_units",
        "avg_price",
    ];
}

pub fn category_sales(store: &Store) -> Result<Vec<CategorySales>> {
    store.query(CATEGORY_SQL, |row| {
        let total_revenue: f64 = row.get(2)?;
        let total_units: i64 = row.get(3)?;
        Ok(CategorySales {
            category: row.get(0)?,
            subcategory: row.get(1)?,
            total_revenue,
            total_units,
            avg_price: ratio(total_revenue, total_units as f64),
        })
    })
}
