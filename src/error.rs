//! Error types for Vitalgauge

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum EngineError {
    /// A reading carried a value the engine refuses to score (NaN or infinite).
    /// Malformed values are rejected at the boundary, never coerced to zero.
    #[error("Malformed reading {reading_id}: {reason}")]
    MalformedReading { reading_id: String, reason: String },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid analysis window: {0}")]
    InvalidWindow(String),

    #[error("Reading store error: {0}")]
    StoreError(String),
}
