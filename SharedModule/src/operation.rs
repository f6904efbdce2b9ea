//! # Protocol Operations
//!
//! The five outbound operation kinds. Each names its target object and is
//! encoded as a JSON object tagged by `"action"`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::object::ObjectId;
use crate::property::{Properties, PropertyValue};

/// Kind of an operation, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Set,
    Listen,
    Call,
    Destroy,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Set => "set",
            Self::Listen => "listen",
            Self::Call => "call",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound operation addressed to one remote object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Operation {
    /// Instantiate the client mirror of an object
    Create {
        target: ObjectId,
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<ObjectId>,
        #[serde(default)]
        properties: Properties,
    },

    /// Update properties of an existing mirror
    Set {
        target: ObjectId,
        properties: Properties,
    },

    /// Toggle client notification per event type (values are booleans)
    Listen {
        target: ObjectId,
        properties: Properties,
    },

    /// Invoke a method on the mirror
    Call {
        target: ObjectId,
        method: String,
        #[serde(default)]
        properties: Properties,
    },

    /// Remove the mirror
    Destroy { target: ObjectId },
}

impl Operation {
    pub fn target(&self) -> &ObjectId {
        match self {
            Self::Create { target, .. }
            | Self::Set { target, .. }
            | Self::Listen { target, .. }
            | Self::Call { target, .. }
            | Self::Destroy { target } => target,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Set { .. } => OperationKind::Set,
            Self::Listen { .. } => OperationKind::Listen,
            Self::Call { .. } => OperationKind::Call,
            Self::Destroy { .. } => OperationKind::Destroy,
        }
    }

    /// Payload map of the operation, if it carries one
    pub fn properties(&self) -> Option<&Properties> {
        match self {
            Self::Create { properties, .. }
            | Self::Set { properties, .. }
            | Self::Listen { properties, .. }
            | Self::Call { properties, .. } => Some(properties),
            Self::Destroy { .. } => None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties().and_then(|properties| properties.get(name))
    }
}
