//! Unified error handling for the towerjump library.
//!
//! Row-level problems in carrier logs (bad timestamps, junk coordinates) are
//! not errors: ingestion drops or clears them and counts them in `LoadStats`.
//! This type covers the failures that stop a run outright.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Unified error type for towerjump operations.
#[derive(Debug, Error)]
pub enum TowerJumpError {
    /// Reading the input or writing the report failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader or writer failed outside of a single recoverable row
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization of a config or report failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input header lacks a column the analysis cannot run without
    #[error("Input is missing required column '{column}'")]
    MissingColumn { column: String },

    /// Configuration values are out of range
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A record arrived earlier than the interval it would extend
    #[error("Record at {record_time} arrived after {previous_time}; input must be sorted by UTC time")]
    OutOfOrder {
        record_time: DateTime<Utc>,
        previous_time: DateTime<Utc>,
    },
}

impl TowerJumpError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        TowerJumpError::Config {
            message: message.into(),
        }
    }
}

/// Result type alias for towerjump operations.
pub type Result<T> = std::result::Result<T, TowerJumpError>;
