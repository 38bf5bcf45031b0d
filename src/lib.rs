pub mod config;
pub mod error;
pub mod ingestion;
pub mod join;
pub mod pipeline;
pub mod prune;
pub mod reports;
pub mod schema;
pub mod store;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result, Stage};
pub use pipeline::{LoadSummary, Pipeline, RunSummary};
pub use reports::{ReportKind, ReportSummary};
pub use store::Store;
