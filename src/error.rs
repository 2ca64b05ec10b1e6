//! Error types for bout pattern analysis

use thiserror::Error;

/// Errors that can occur while segmenting rows and aggregating bout statistics
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid configuration for `{option}`: {reason}")]
    InvalidConfiguration { option: String, reason: String },

    #[error("Malformed row {row}: expected {expected}, found {actual} labels")]
    MalformedRow {
        /// 0-based index of the data row (header rows excluded)
        row: usize,
        expected: String,
        actual: usize,
    },

    #[error("Table error: {0}")]
    Table(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl PatternError {
    pub(crate) fn invalid_config(option: &str, reason: impl Into<String>) -> Self {
        PatternError::InvalidConfiguration {
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for PatternError {
    fn from(e: csv::Error) -> Self {
        PatternError::Table(e.to_string())
    }
}
