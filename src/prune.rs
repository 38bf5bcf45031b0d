//! Column Pruner: drops configured columns before a table takes part in joins.

use crate::config::PruneSpec;
use crate::error::{PipelineError, Result};
use polars::prelude::DataFrame;
use tracing::{debug, warn};

/// What to do when a drop-list column is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrunePolicy {
    /// Skip missing columns with a warning
    #[default]
    Tolerant,
    /// Fail with `ColumnNotFound`
    Strict,
}

impl PrunePolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            PrunePolicy::Strict
        } else {
            PrunePolicy::Tolerant
        }
    }
}

pub struct ColumnPruner<'a> {
    specs: &'a [PruneSpec],
    policy: PrunePolicy,
}

impl<'a> ColumnPruner<'a> {
    pub fn new(specs: &'a [PruneSpec], policy: PrunePolicy) -> Self {
        Self { specs, policy }
    }

    /// Returns `frame` without the columns configured for `table`.
    pub fn prune(&self, table: &str, frame: DataFrame) -> Result<DataFrame> {
        let Some(spec) = self.specs.iter().find(|s| s.table == table) else {
            return Ok(frame);
        };

        let mut pruned = frame;
        let mut dropped = 0;
        for column in &spec.columns {
            if pruned.get_column_index(column).is_none() {
                match self.policy {
                    PrunePolicy::Tolerant => {
                        warn!("{}: column {} already absent, skipping", table, column);
                        continue;
                    }
                    PrunePolicy::Strict => {
                        return Err(PipelineError::ColumnNotFound {
                            table: table.to_string(),
                            column: column.clone(),
                        });
                    }
                }
            }
            pruned = pruned.drop(column)?;
            dropped += 1;
        }

        debug!("{}: dropped {} of {} configured columns", table, dropped, spec.columns.len());
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn specs() -> Vec<PruneSpec> {
        vec![PruneSpec {
            table: "sales".to_string(),
            columns: vec!["CarrierTrackingNumber".to_string(), "CustomerPONumber".to_string()],
        }]
    }

    fn sales() -> DataFrame {
        df!(
            "SalesOrderNumber" => &["SO1", "SO2"],
            "CarrierTrackingNumber" => &["A-1", "A-2"],
            "SalesAmount" => &[10.0, 20.0]
        )
        .unwrap()
    }

    #[test]
    fn test_tolerant_skips_absent_columns() {
        let specs = specs();
        let pruner = ColumnPruner::new(&specs, PrunePolicy::Tolerant);
        let pruned = pruner.prune("sales", sales()).unwrap();
        assert_eq!(pruned.get_column_names(), vec!["SalesOrderNumber", "SalesAmount"]);
        assert_eq!(pruned.height(), 2);
    }

    #[test]
    fn test_strict_rejects_absent_columns() {
        let specs = specs();
        let pruner = ColumnPruner::new(&specs, PrunePolicy::Strict);
        let err = pruner.prune("sales", sales()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ColumnNotFound { ref column, .. } if column == "CustomerPONumber"
        ));
    }

    #[test]
    fn test_unconfigured_table_is_untouched() {
        let specs = specs();
        let pruner = ColumnPruner::new(&specs, PrunePolicy::Strict);
        let frame = sales();
        let pruned = pruner.prune("date", frame.clone()).unwrap();
        assert!(pruned.equals(&frame));
    }
}
