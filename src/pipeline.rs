//! End-to-end run: load, prune, join, materialize, report.
//!
//! Every stage before reporting is fatal on failure and the error names the
//! stage. Reports are isolated from one another.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, Stage};
use crate::ingestion::{LoadedTable, SourceLoader};
use crate::join::{build_full_sales, SalesTables};
use crate::prune::{ColumnPruner, PrunePolicy};
use crate::reports::{run_reports, ReportKind, ReportSummary};
use crate::schema::tables;
use crate::store::Store;
use tracing::{debug, info};

#[derive(Debug)]
pub struct LoadSummary {
    pub tables: Vec<LoadedTable>,
    pub full_sales_rows: usize,
}

#[derive(Debug)]
pub struct RunSummary {
    pub load: LoadSummary,
    pub reports: ReportSummary,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn open_store(&self) -> Result<Store> {
        Store::open(&self.config.store_path)
    }

    /// Load every source and rebuild `full_sales_data`.
    pub fn load(&self, store: &mut Store) -> Result<LoadSummary> {
        self.config.validate().map_err(|e| e.at_stage(Stage::Load))?;
        info!("🚀 Loading {} sources", self.config.sources.len());
        let loaded = SourceLoader::new(&self.config)
            .load_all(store)
            .map_err(|e| e.at_stage(Stage::Load))?;

        let pruner = ColumnPruner::new(
            &self.config.prune,
            PrunePolicy::from_strict(self.config.strict_pruning),
        );
        let sales_tables = SalesTables::read(store, &pruner).map_err(|e| match e {
            PipelineError::TableNotFound(_) => e.at_stage(Stage::Load),
            other => other.at_stage(Stage::Prune),
        })?;

        let full = build_full_sales(&sales_tables).map_err(|e| e.at_stage(Stage::Join))?;
        let rows = store
            .replace_table(tables::FULL_SALES, &full)
            .map_err(|e| e.at_stage(Stage::Materialize))?;
        info!("✅ Materialized {} with {} rows", tables::FULL_SALES, rows);
        debug!("Store tables: {}", store.table_names()?.join(", "));

        Ok(LoadSummary {
            tables: loaded,
            full_sales_rows: rows,
        })
    }

    /// Run reports against the fact table already in the store.
    pub fn reports(&self, store: &Store, kinds: &[ReportKind]) -> Result<ReportSummary> {
        if !store.has_table(tables::FULL_SALES)? {
            return Err(PipelineError::TableNotFound(tables::FULL_SALES.to_string()));
        }
        info!("📊 Generating {} reports into {}", kinds.len(), self.config.output_dir.display());
        Ok(run_reports(store, &self.config, kinds))
    }

    pub fn run(&self) -> Result<RunSummary> {
        let mut store = self.open_store()?;
        let load = self.load(&mut store)?;
        let reports = self.reports(&store, &ReportKind::ALL)?;
        Ok(RunSummary { load, reports })
    }
}
