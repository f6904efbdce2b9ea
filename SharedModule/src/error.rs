//! # Wire Errors
//!
//! Errors raised while building, validating or decoding protocol values.

use thiserror::Error;

/// Result type for wire-level operations
pub type WireResult<T> = Result<T, WireError>;

/// Failures of the shared codec
#[derive(Debug, Error)]
pub enum WireError {
    /// A value cannot be represented on the wire
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    /// A name (property, event type or method) is empty
    #[error("empty {0} name")]
    EmptyName(&'static str),

    /// A message violates the operation ordering rules
    #[error("operation order violated: {0}")]
    Ordering(String),

    /// JSON encoding or decoding failed
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
