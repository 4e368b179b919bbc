use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for report construction and persistence.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while building, writing or reading benchmark reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The caller handed in something the aggregator cannot summarise.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The report could not be persisted.
    #[error("failed to write report to {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A report or sample-set file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReportError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ReportError::InvalidInput(msg.into())
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReportError::WriteFailure {
            path: path.into(),
            source,
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReportError::ReadFailure {
            path: path.into(),
            source,
        }
    }
}
