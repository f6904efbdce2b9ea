//! # Mirrored Objects
//!
//! Client-side state of one remote object.

use std::collections::BTreeMap;

use rwt_shared::{ObjectId, Properties, PropertyValue};
use serde::Serialize;

/// A method invocation received from the server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedCall {
    pub method: String,
    pub properties: Properties,
}

/// Mirror of one server object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientObject {
    pub id: ObjectId,
    pub type_name: String,
    pub parent: Option<ObjectId>,
    /// Applied values, in the order the adapter first applied them
    pub properties: Properties,
    pub listening: BTreeMap<String, bool>,
    pub calls: Vec<RecordedCall>,
}

impl ClientObject {
    pub fn new(id: ObjectId, type_name: impl Into<String>, parent: Option<ObjectId>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            parent,
            properties: Properties::new(),
            listening: BTreeMap::new(),
            calls: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn is_listening(&self, event: &str) -> bool {
        self.listening.get(event).copied().unwrap_or(false)
    }
}
