//! Loads every configured extract into the store, replacing existing tables.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::ingestion::{delimited, spreadsheet};
use crate::store::Store;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Delimited,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Spreadsheet),
            "csv" => Some(SourceFormat::Delimited),
            _ => None,
        }
    }
}

/// Reads one extract into a frame, dispatching on the file extension.
pub fn read_source(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::source_read(path, "file not found"));
    }
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Spreadsheet) => spreadsheet::read_first_sheet(path),
        Some(SourceFormat::Delimited) => delimited::read_csv(path),
        None => Err(PipelineError::source_read(path, "unsupported file type")),
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

pub struct SourceLoader<'a> {
    config: &'a PipelineConfig,
}

impl<'a> SourceLoader<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Load all sources in configuration order. The first failure aborts the
    /// load, since the joins need every table.
    pub fn load_all(&self, store: &mut Store) -> Result<Vec<LoadedTable>> {
        let mut loaded = Vec::with_capacity(self.config.sources.len());
        for source in &self.config.sources {
            let path = self.config.resolve_source(source);
            info!("Loading {} into {}", path.display(), source.table);

            let frame = read_source(&path)?;
            let rows = store.replace_table(&source.table, &frame)?;
            info!("✅ {}: {} rows, {} columns", source.table, rows, frame.width());

            loaded.push(LoadedTable {
                table: source.table.clone(),
                path,
                rows,
                columns: frame.width(),
            });
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSpec;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("data/customers.XLSX")),
            Some(SourceFormat::Spreadsheet)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("sales.csv")),
            Some(SourceFormat::Delimited)
        );
        assert_eq!(SourceFormat::from_path(Path::new("sales.parquet")), None);
        assert_eq!(SourceFormat::from_path(Path::new("sales")), None);
    }

    #[test]
    fn test_load_replaces_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("territory.csv"),
            "SalesTerritoryKey,SalesTerritoryCountry,SalesTerritoryRegion\n1,France,France\n2,Germany,Germany\n",
        )
        .unwrap();

        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            sources: vec![SourceSpec {
                path: PathBuf::from("territory.csv"),
                table: "sales_territory".to_string(),
            }],
            ..PipelineConfig::default()
        };

        let mut store = Store::open_in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE sales_territory (stale TEXT); INSERT INTO sales_territory VALUES ('x');")
            .unwrap();

        let loaded = SourceLoader::new(&config).load_all(&mut store).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].rows, 2);
        assert_eq!(loaded[0].columns, 3);
        assert_eq!(store.row_count("sales_territory").unwrap(), 2);
        assert_eq!(store.read_table("sales_territory").unwrap().width(), 3);
    }

    #[test]
    fn test_missing_source_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "k\n1\n").unwrap();

        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            sources: vec![
                SourceSpec { path: PathBuf::from("a.csv"), table: "a".to_string() },
                SourceSpec { path: PathBuf::from("missing.xlsx"), table: "b".to_string() },
            ],
            ..PipelineConfig::default()
        };

        let mut store = Store::open_in_memory().unwrap();
        let err = SourceLoader::new(&config).load_all(&mut store).unwrap_err();
        assert!(matches!(err, PipelineError::SourceRead { .. }));
        assert!(!store.has_table("b").unwrap());
    }
}
