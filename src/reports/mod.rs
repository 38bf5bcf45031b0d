//! Report Generators: aggregations over `full_sales_data`, exported as CSV.
//!
//! Reports only read the store, so each one runs on its own and a failure in
//! one does not stop the others.

pub mod category;
pub mod growth;
pub mod income;
pub mod monthly;
pub mod profitability;
pub mod rfm;
pub mod territory;
pub mod writer;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::store::Store;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use writer::write_report;

/// `numerator / denominator`, or `None` when the denominator is zero or the
/// result is not a finite number.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ReportKind {
    Monthly,
    Category,
    Territory,
    Rfm,
    Income,
    Profitability,
    Growth,
}

impl ReportKind {
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Monthly,
        ReportKind::Category,
        ReportKind::Territory,
        ReportKind::Rfm,
        ReportKind::Income,
        ReportKind::Profitability,
        ReportKind::Growth,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportKind::Monthly => "monthly_sales.csv",
            ReportKind::Category => "category_sales.csv",
            ReportKind::Territory => "sales_territory.csv",
            ReportKind::Rfm => "rfm.csv",
            ReportKind::Income => "customer_spend.csv",
            ReportKind::Profitability => "profits.csv",
            ReportKind::Growth => "sales_growth.csv",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::Monthly => "monthly sales",
            ReportKind::Category => "category performance",
            ReportKind::Territory => "territory sales",
            ReportKind::Rfm => "RFM segments",
            ReportKind::Income => "income spend",
            ReportKind::Profitability => "product profitability",
            ReportKind::Growth => "year-over-year growth",
        };
        f.write_str(name)
    }
}

/// Computes one report and writes it to `path`. Returns rows written.
pub fn generate(kind: ReportKind, store: &Store, config: &PipelineConfig, path: &Path) -> Result<usize> {
    match kind {
        ReportKind::Monthly => write_report(path, &monthly::monthly_sales(store)?),
        ReportKind::Category => write_report(path, &category::category_sales(store)?),
        ReportKind::Territory => write_report(path, &territory::territory_sales(store)?),
        ReportKind::Rfm => write_report(path, &rfm::rfm_segments(store, &config.segments)?),
        ReportKind::Income => write_report(path, &income::income_spend(store)?),
        ReportKind::Profitability => {
            write_report(path, &profitability::product_profitability(store)?)
        }
        ReportKind::Growth => write_report(path, &growth::quarterly_growth(store)?),
    }
}

#[derive(Debug)]
pub enum ReportStatus {
    Written { rows: usize },
    Failed(String),
}

#[derive(Debug)]
pub struct ReportOutcome {
    pub kind: ReportKind,
    pub path: PathBuf,
    pub status: ReportStatus,
}

#[derive(Debug, Default)]
pub struct ReportSummary {
    pub outcomes: Vec<ReportOutcome>,
}

impl ReportSummary {
    pub fn failures(&self) -> impl Iterator<Item = &ReportOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ReportStatus::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn get(&self, kind: ReportKind) -> Option<&ReportOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }
}

/// Runs the requested reports in order, recording each outcome.
pub fn run_reports(store: &Store, config: &PipelineConfig, kinds: &[ReportKind]) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for &kind in kinds {
        let path = config.output_dir.join(kind.file_name());
        let status = match generate(kind, store, config, &path) {
            Ok(rows) => {
                info!("✅ {}: {} rows -> {}", kind, rows, path.display());
                ReportStatus::Written { rows }
            }
            Err(e) => {
                error!("❌ {} failed: {}", kind, e);
                ReportStatus::Failed(e.to_string())
            }
        };
        summary.outcomes.push(ReportOutcome { kind, path, status });
    }
    summary
}
