use std::path::PathBuf;
use thiserror::Error;

/// The main error type for platelabel operations.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Corrupt record {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Failed to write {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse ledger {path}: {source}")]
    LedgerParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write ledger {path}: {source}")]
    LedgerWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid ledger {path}: {message}")]
    LedgerInvalid { path: PathBuf, message: String },

    #[error("No operator is logged in")]
    NoOperator,

    #[error("Invalid operator name: '{0}'")]
    InvalidOperator(String),

    #[error("Image index {index} is out of range (image set has {len} image(s))")]
    ImageIndexOutOfRange { index: usize, len: usize },

    #[error("Unknown action: '{0}' (expected submit, unsure, flag, back, show)")]
    UnknownAction(String),

    #[error("Failed to serialize report: {0}")]
    ReportJson(#[from] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl LabelError {
    /// Returns true for a missing record, as opposed to any other failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LabelError::NotFound { .. })
    }
}
