//! Join Engine: denormalizes the sales fact rows with every dimension.
//!
//! The date join is a left join and runs first, so sales whose order date is
//! missing from the calendar keep null date attributes. Every later join is an
//! inner join and drops sales whose product, customer or territory does not
//! resolve.

use crate::error::{PipelineError, Result};
use crate::prune::ColumnPruner;
use crate::schema::{columns, tables};
use crate::store::Store;
use polars::prelude::*;
use tracing::{debug, info};

/// The seven pruned tables the fact table is built from.
#[derive(Debug, Clone)]
pub struct SalesTables {
    pub sales: DataFrame,
    pub date: DataFrame,
    pub product: DataFrame,
    pub product_subcategory: DataFrame,
    pub product_category: DataFrame,
    pub customers: DataFrame,
    pub sales_territory: DataFrame,
}

impl SalesTables {
    /// Read every table back from the store and apply the drop lists.
    pub fn read(store: &Store, pruner: &ColumnPruner<'_>) -> Result<Self> {
        let load = |table: &str| -> Result<DataFrame> {
            let frame = store.read_table(table)?;
            pruner.prune(table, frame)
        };
        Ok(Self {
            sales: load(tables::SALES)?,
            date: load(tables::DATE)?,
            product: load(tables::PRODUCT)?,
            product_subcategory: load(tables::PRODUCT_SUBCATEGORY)?,
            product_category: load(tables::PRODUCT_CATEGORY)?,
            customers: load(tables::CUSTOMERS)?,
            sales_territory: load(tables::SALES_TERRITORY)?,
        })
    }

    fn dimension(&self, table: &str) -> Result<&DataFrame> {
        match table {
            tables::DATE => Ok(&self.date),
            tables::PRODUCT => Ok(&self.product),
            tables::PRODUCT_SUBCATEGORY => Ok(&self.product_subcategory),
            tables::PRODUCT_CATEGORY => Ok(&self.product_category),
            tables::CUSTOMERS => Ok(&self.customers),
            tables::SALES_TERRITORY => Ok(&self.sales_territory),
            other => Err(PipelineError::TableNotFound(other.to_string())),
        }
    }
}

struct JoinStep {
    table: &'static str,
    left_on: &'static str,
    right_on: &'static str,
    how: JoinType,
}

/// Join order matters: the left date join must precede the inner joins.
const JOIN_PLAN: [JoinStep; 6] = [
    JoinStep {
        table: tables::DATE,
        left_on: columns::ORDER_DATE_KEY,
        right_on: columns::DATE_KEY,
        how: JoinType::Left,
    },
    JoinStep {
        table: tables::PRODUCT,
        left_on: columns::PRODUCT_KEY,
        right_on: columns::PRODUCT_KEY,
        how: JoinType::Inner,
    },
    JoinStep {
        table: tables::PRODUCT_SUBCATEGORY,
        left_on: columns::PRODUCT_SUBCATEGORY_KEY,
        right_on: columns::PRODUCT_SUBCATEGORY_KEY,
        how: JoinType::Inner,
    },
    JoinStep {
        table: tables::PRODUCT_CATEGORY,
        left_on: columns::PRODUCT_CATEGORY_KEY,
        right_on: columns::PRODUCT_CATEGORY_KEY,
        how: JoinType::Inner,
    },
    JoinStep {
        table: tables::CUSTOMERS,
        left_on: columns::CUSTOMER_KEY,
        right_on: columns::CUSTOMER_KEY,
        how: JoinType::Inner,
    },
    JoinStep {
        table: tables::SALES_TERRITORY,
        left_on: columns::SALES_TERRITORY_KEY,
        right_on: columns::SALES_TERRITORY_KEY,
        how: JoinType::Inner,
    },
];

/// Dimension keys must be unique; duplicates would fan out sales rows.
/// Null keys never match a sale and are not counted.
fn ensure_unique_keys(table: &str, frame: &DataFrame, key: &str) -> Result<()> {
    let keys = frame.column(key)?.drop_nulls();
    let distinct = keys.n_unique()?;
    if distinct != keys.len() {
        return Err(PipelineError::JoinIntegrity {
            table: table.to_string(),
            key: key.to_string(),
            duplicates: keys.len() - distinct,
        });
    }
    Ok(())
}

/// Build FullSalesData from the pruned tables.
pub fn build_full_sales(tables: &SalesTables) -> Result<DataFrame> {
    for step in &JOIN_PLAN {
        ensure_unique_keys(step.table, tables.dimension(step.table)?, step.right_on)?;
    }

    let mut joined = tables.sales.clone().lazy();
    for step in &JOIN_PLAN {
        debug!("Joining {} on {} = {} ({:?})", step.table, step.left_on, step.right_on, step.how);
        // integral floats from spreadsheets must still match integer keys
        let right = tables
            .dimension(step.table)?
            .clone()
            .lazy()
            .with_column(col(step.right_on).cast(DataType::Int64));
        joined = joined
            .with_column(col(step.left_on).cast(DataType::Int64))
            .join(
                right,
                [col(step.left_on)],
                [col(step.right_on)],
                JoinArgs::new(step.how.clone()),
            );
    }

    let full = joined
        .with_column(col(columns::FULL_DATE).cast(DataType::Date))
        .collect()?;

    info!(
        "Built {}: {} of {} sales rows kept, {} columns",
        tables::FULL_SALES,
        full.height(),
        tables.sales.height(),
        full.width()
    );
    Ok(full)
}
