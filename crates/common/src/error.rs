//! Error types for perftrack

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using perftrack Error
pub type Result<T> = std::result::Result<T, Error>;

/// perftrack error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid audit report: {0}")]
    InvalidReport(String),

    #[error("Threshold check failed: {0}")]
    ThresholdViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap an I/O failure on a persisted file.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the backing store.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }
}
