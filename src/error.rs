//! Error types for fieldwatch.

use std::fmt;

use thiserror::Error;

/// Errors raised by the library.
///
/// Missing upstream data is never an error: absent series, units, thresholds
/// and unparseable times are defaulted where they occur.
#[derive(Debug, Error)]
pub enum Error {
    /// An identifier (sensor id, payload key, section name) was empty.
    #[error("Invalid {kind}: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// Requested export format is not one of csv, json or excel.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Timeframe string is not one of 24h, 7d or 30d.
    #[error("Unknown timeframe: {0}")]
    UnknownTimeframe(String),

    /// Lookback window is negative or reaches past the earliest date.
    #[error("Lookback of {0} days is out of range")]
    InvalidLookback(i64),

    /// Configured UTC offset is out of range.
    #[error("UTC offset out of range: {0} minutes")]
    InvalidOffset(i32),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub(crate) fn invalid_identifier(kind: &'static str, value: impl Into<String>) -> Self {
        Error::InvalidIdentifier {
            kind,
            value: value.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Step of an export at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Validating,
    Serializing,
    Writing,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportStage::Validating => "validating the request",
            ExportStage::Serializing => "serializing the table",
            ExportStage::Writing => "writing the artifact",
        })
    }
}

/// A failed export, carrying the stage and the underlying cause.
#[derive(Debug, Error)]
#[error("Export failed while {stage}: {source}")]
pub struct ExportError {
    pub stage: ExportStage,
    #[source]
    pub source: Error,
}

impl ExportError {
    pub fn new(stage: ExportStage, source: Error) -> Self {
        Self { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_identifier_message() {
        let err = Error::invalid_identifier("sensor id", "  ");
        assert_eq!(err.to_string(), "Invalid sensor id: \"  \"");
    }

    #[test]
    fn export_error_exposes_cause() {
        let err = ExportError::new(
            ExportStage::Validating,
            Error::UnsupportedFormat("pdf".into()),
        );
        assert_eq!(
            err.to_string(),
            "Export failed while validating the request: Unsupported export format: pdf"
        );
        let cause = err.source().map(|e| e.to_string());
        assert_eq!(cause.as_deref(), Some("Unsupported export format: pdf"));
    }
}
