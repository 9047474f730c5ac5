//! Error types for Precept Motion

use thiserror::Error;

/// Errors raised at the fallible edges around the motion core
/// (recordings, configuration, practice sessions).
///
/// The analysis core itself never fails: anomalies are absorbed and surface as
/// flags or zeroed metrics.
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse motion recording at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Motion event at index {0} has no timestamp")]
    MissingTimestamp(usize),

    #[error("Invalid practice state: expected {expected}, was {actual}")]
    InvalidPracticeState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("No motion events found in input")]
    NoEvents,
}
