use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stages that abort the run when they fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Prune,
    Join,
    Materialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Prune => "prune",
            Stage::Join => "join",
            Stage::Materialize => "materialize",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read source {path}: {reason}")]
    SourceRead { path: PathBuf, reason: String },

    #[error("Store rejected table {table}: {reason}")]
    SchemaLoad { table: String, reason: String },

    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },

    #[error("Duplicate keys in {table}.{key}: {duplicates} row(s) share a key")]
    JoinIntegrity {
        table: String,
        key: String,
        duplicates: usize,
    },

    #[error("Table not found in store: {0}")]
    TableNotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        source: Box<PipelineError>,
    },

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn source_read(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        PipelineError::SourceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema_load(table: impl Into<String>, reason: impl fmt::Display) -> Self {
        PipelineError::SchemaLoad {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    /// Tags an error with the stage it aborted.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            already @ PipelineError::StageFailed { .. } => already,
            other => PipelineError::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage that aborted the run, if the error carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
