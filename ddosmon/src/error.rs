//! Error types for ddosmon
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for ddosmon
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem watch establishment or delivery errors
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Result file could not be parsed as a table
    #[error("Result file parse error: {0}")]
    Parse(#[from] csv::Error),

    /// Score column permanently absent from a complete header
    #[error("Column '{0}' not present in header")]
    ColumnMissing(String),

    /// Latest complete row's score field is not a number
    #[error("Unparsable score '{0}' in latest row")]
    InvalidScore(String),

    /// OS metrics provider gave no usable reading
    #[error("Metrics unavailable: {0}")]
    MetricsUnavailable(String),

    /// Requested network interface has no stats
    #[error("No stats for interface '{0}'")]
    InterfaceNotFound(String),
}

impl Error {
    /// Whether a later notification for the same file can repair this
    /// failure. A complete header that lacks the score column cannot be
    /// fixed by waiting; everything else ingestion-side can.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::ColumnMissing(_))
    }
}

/// Convenience Result type using ddosmon Error
pub type Result<T> = std::result::Result<T, Error>;
