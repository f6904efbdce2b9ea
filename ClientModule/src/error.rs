//! # Client Errors
//!
//! Every error here means the server sent something the mirror cannot
//! apply, usually a broken ordering rule.

use rwt_shared::{ObjectId, WireError};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no adapter for type {0}")]
    UnknownType(String),

    #[error("parent {parent} of {target} does not exist")]
    UnknownParent { target: ObjectId, parent: ObjectId },

    /// An operation addressed an object the mirror does not hold
    #[error("unknown target {0}")]
    UnknownTarget(ObjectId),

    #[error("{0} is created twice")]
    DuplicateObject(ObjectId),

    #[error("{type_name} has no property '{name}'")]
    UnknownProperty { type_name: String, name: String },

    #[error("{type_name} does not support event '{event}'")]
    UnknownEvent { type_name: String, event: String },

    #[error("{type_name} has no method '{method}'")]
    UnknownMethod { type_name: String, method: String },

    #[error("wire: {0}")]
    Wire(#[from] WireError),
}
