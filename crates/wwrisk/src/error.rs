//! Error types for the risk engine.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for risk engine operations.
///
/// Malformed sample values never show up here: the scoring pipeline clamps
/// them instead. Only structural problems (missing data, bad caller input,
/// unreadable files) are reported.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The query window or jurisdiction matched zero raw records.
    #[error("No records found: {0}")]
    NoDataFound(String),

    /// A record source could not be reached or answered with an error.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Caller-supplied input could not be used (e.g. a non-numeric risk score).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A date string could not be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error saving or loading a persisted table.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl RiskError {
    /// Whether a fallback record source should be consulted after this error.
    pub fn is_recoverable_by_fallback(&self) -> bool {
        matches!(
            self,
            RiskError::DataUnavailable(_) | RiskError::Io { .. } | RiskError::NoDataFound(_)
        )
    }
}

/// Result type alias for risk engine operations.
pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_recoverable_errors() {
        let io = RiskError::Io {
            path: PathBuf::from("live.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(io.is_recoverable_by_fallback());
        assert!(RiskError::DataUnavailable("timeout".into()).is_recoverable_by_fallback());
        assert!(RiskError::NoDataFound("Ohio".into()).is_recoverable_by_fallback());

        assert!(!RiskError::InvalidInput("abc".into()).is_recoverable_by_fallback());
        assert!(!RiskError::InvalidDate("yesterday".into()).is_recoverable_by_fallback());
        assert!(!RiskError::Persistence("disk full".into()).is_recoverable_by_fallback());
    }
}
