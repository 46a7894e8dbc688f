use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at byte offset {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    #[error("No record terminator found after byte offset {offset}; input is truncated")]
    PartitionAlignment { offset: u64 },

    #[error("Station {station} has no measurements")]
    EmptyAccumulator { station: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Processing cancelled after a worker failure")]
    Cancelled,
}

impl ProcessingError {
    pub fn file_access(path: &Path, source: std::io::Error) -> Self {
        ProcessingError::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        ProcessingError::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }
}
