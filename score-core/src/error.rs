//! Typed failures surfaced by every component of the pipeline.
//!
//! Propagation policy: feature extraction errors for a single network never
//! reach the caller of a multi-chain call directly — the aggregator folds
//! them into [`ScoreError::PartialResult`]. Scoring errors are always fatal
//! to the individual call. Proof-driver errors propagate unchanged.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("value {value} out of range, expected < {bound}")]
    OutOfRange { value: String, bound: String },

    #[error("external tool missing: {0}")]
    ExternalToolMissing(String),

    #[error("external tool failed (exit {exit_code:?}): {stderr}")]
    ExternalToolFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("external tool timed out after {0:?}")]
    ExternalToolTimeout(Duration),

    #[error("proof verification failed")]
    VerificationFailed,

    #[error("multi-chain extraction completed with {} network failure(s)", .failures.len())]
    PartialResult {
        failures: Vec<(String, Box<ScoreError>)>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
