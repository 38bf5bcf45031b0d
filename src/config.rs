//! Pipeline configuration: source files, column drop lists and RFM segment rules.
//!
//! File paths, drop lists and segment codes all live here, so tests and
//! deployments can substitute their own values.

use crate::error::{PipelineError, Result};
use crate::schema::tables;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One spreadsheet (or CSV) extract and the store table it lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub table: String,
}

/// Columns dropped from a loaded table before it takes part in joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneSpec {
    pub table: String,
    pub columns: Vec<String>,
}

/// A segment label and the exact RFM codes that map to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentGroup {
    pub label: String,
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base directory for relative source paths
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSpec>,

    #[serde(default = "default_prune")]
    pub prune: Vec<PruneSpec>,

    /// Fail when a drop-list column is missing instead of skipping it
    #[serde(default)]
    pub strict_pruning: bool,

    /// Ordered segment groups, first match wins
    #[serde(default = "default_segments")]
    pub segments: Vec<SegmentGroup>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_path: default_store_path(),
            output_dir: default_output_dir(),
            sources: default_sources(),
            prune: default_prune(),
            strict_pruning: false,
            segments: default_segments(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(PipelineError::Config("No sources configured".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.table.as_str()) {
                return Err(PipelineError::Config(format!(
                    "Table {} is loaded by more than one source",
                    source.table
                )));
            }
        }
        // a table without a source would be joined from a previous run's copy
        if let Some(missing) = tables::JOINED
            .iter()
            .find(|table| !self.sources.iter().any(|s| s.table == **table))
        {
            return Err(PipelineError::Config(format!(
                "No source configured for table {}",
                missing
            )));
        }
        for group in &self.segments {
            if let Some(bad) = group.codes.iter().find(|c| !is_rfm_code(c)) {
                return Err(PipelineError::Config(format!(
                    "Segment {} has invalid code {:?}",
                    group.label, bad
                )));
            }
        }
        Ok(())
    }

    /// Source path resolved against `data_dir`.
    pub fn resolve_source(&self, source: &SourceSpec) -> PathBuf {
        if source.path.is_absolute() {
            source.path.clone()
        } else {
            self.data_dir.join(&source.path)
        }
    }

    pub fn get_prune(&self, table: &str) -> Option<&PruneSpec> {
        self.prune.iter().find(|p| p.table == table)
    }
}

fn is_rfm_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit())
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("sales_analysis.db")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_sources() -> Vec<SourceSpec> {
    [
        ("customers.xlsx", tables::CUSTOMERS),
        ("date.xlsx", tables::DATE),
        ("product.xlsx", tables::PRODUCT),
        ("productcategory.xlsx", tables::PRODUCT_CATEGORY),
        ("productsubcategory.xlsx", tables::PRODUCT_SUBCATEGORY),
        ("salesterritory.xlsx", tables::SALES_TERRITORY),
        ("sales_new.xlsx", tables::SALES),
    ]
    .into_iter()
    .map(|(path, table)| SourceSpec {
        path: PathBuf::from(path),
        table: table.to_string(),
    })
    .collect()
}

fn default_prune() -> Vec<PruneSpec> {
    let spec = |table: &str, columns: &[&str]| PruneSpec {
        table: table.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
    };
    vec![
        spec(tables::SALES, &["CarrierTrackingNumber", "CustomerPONumber"]),
        spec(
            tables::CUSTOMERS,
            &[
                "Title",
                "MiddleName",
                "Suffix",
                "EmailAddress",
                "SpanishEducation",
                "FrenchEducation",
                "SpanishOccupation",
                "FrenchOccupation",
                "AddressLine1",
                "AddressLine2",
                "Phone",
            ],
        ),
        spec(
            tables::PRODUCT,
            &[
                "WeightUnitMeasureCode",
                "SizeUnitMeasureCode",
                "SpanishProductName",
                "FrenchProductName",
                "Size",
                "SizeRange",
                "Weight",
                "Class",
                "Style",
                "FrenchDescription",
                "ChineseDescription",
                "ArabicDescription",
                "HebrewDescription",
                "ThaiDescription",
                "GermanDescription",
                "JapaneseDescription",
                "TurkishDescription",
            ],
        ),
    ]
}

fn default_segments() -> Vec<SegmentGroup> {
    let group = |label: &str, codes: &str| SegmentGroup {
        label: label.to_string(),
        codes: codes.split('|').map(str::to_string).collect(),
    };
    vec![
        group("Lost", "111|112|121|131|141|151|113|114"),
        group("At Risk", "134|142|143|144"),
        group(
            "Hibernating",
            "332|322|233|232|223|222|132|123|122|212|211|213|214|221|231|234|241|242|243|244",
        ),
        group(
            "Loyal",
            "311|411|331|421|341|321|412|342|422|432|332|312|313|314|334|343|423",
        ),
        group("Champions", "433|434|443|444|344|413|414|431|441|442"),
        group("Super Champions", "533|543|542|544|552|553|554"),
    ]
}
