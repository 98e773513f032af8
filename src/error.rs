//! Error types for tabcompare operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompareError>;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("No. of columns of compared datasets differs: left has {left}, right has {right}")]
    ColumnCountMismatch { left: usize, right: usize },

    #[error("Schema mismatch at position {position}: left column is '{left}', right column is '{right}'")]
    SchemaMismatch {
        position: usize,
        left: String,
        right: String,
    },

    #[error("Invalid tolerance mode '{mode}' for column '{column}', expected 'abs' or 'rel'")]
    InvalidToleranceMode { column: String, mode: String },

    #[error("Invalid tolerance {tolerance} for column '{column}', must be a non-negative number")]
    InvalidTolerance { column: String, tolerance: f64 },

    #[error("Invalid default tolerance pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Reference column '{column}' not found in dataset schema")]
    MissingKeyColumn { column: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Comparison '{job}' failed: {source}")]
    Job {
        job: String,
        #[source]
        source: Box<CompareError>,
    },
}

impl CompareError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn invalid_tolerance_mode(column: impl Into<String>, mode: impl Into<String>) -> Self {
        Self::InvalidToleranceMode {
            column: column.into(),
            mode: mode.into(),
        }
    }

    /// Wrap an error with the name of the comparison job it aborted
    pub fn job(job: impl Into<String>, source: CompareError) -> Self {
        Self::Job {
            job: job.into(),
            source: Box::new(source),
        }
    }
}
