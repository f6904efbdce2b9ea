//! # Synchronization Errors
//!
//! Protocol-usage errors fail fast at the call site; serialization and
//! ordering errors abort the current render cycle. Stale references are not
//! errors at all and never show up here.

use rwt_shared::{ObjectId, WireError};
use thiserror::Error;

/// Result type used throughout the server core
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote object was destroyed; its client mirror no longer exists
    #[error("remote object {0} is destroyed")]
    Destroyed(ObjectId),

    /// No remote object is registered under this id
    #[error("unknown remote object {0}")]
    UnknownObject(ObjectId),

    /// The call is not valid in the object's current state
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A value or name was rejected when it was handed in
    #[error("invalid argument for '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The inbound request counter does not match the session
    #[error("request counter mismatch: expected {expected}, got {actual}")]
    RequestCounter { expected: u64, actual: u64 },

    /// An operation handler rejected inbound data
    #[error("handler for {target} failed: {reason}")]
    Handler { target: ObjectId, reason: String },

    /// Encoding or ordering failure of the outbound message
    #[error("wire: {0}")]
    Wire(#[from] WireError),

    #[error("configuration: {0}")]
    Config(String),
}

impl SyncError {
    pub fn invalid_argument(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn handler(target: &ObjectId, reason: impl ToString) -> Self {
        Self::Handler {
            target: target.clone(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that indicate a defect in calling code
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::Destroyed(_)
                | Self::UnknownObject(_)
                | Self::IllegalState(_)
                | Self::InvalidArgument { .. }
                | Self::RequestCounter { .. }
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Wire(WireError::Json(err))
    }
}
