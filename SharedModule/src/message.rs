//! # Protocol Messages
//!
//! One outbound [`Message`] is flushed per render cycle; one inbound
//! [`ClientMessage`] is read per request. Both carry a head with the request
//! counter the client echoes back.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{WireError, WireResult};
use crate::object::ObjectId;
use crate::operation::{Operation, OperationKind};
use crate::property::{Properties, PropertyValue};

/// Message header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHead {
    /// Sequence number of the exchange
    #[serde(default)]
    pub request_counter: u64,
}

/// Outbound message: ordered operations of one render cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub head: MessageHead,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Message {
    pub fn new(head: MessageHead, operations: Vec<Operation>) -> Self {
        Self { head, operations }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operation(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn to_json_string(&self) -> WireResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(text: &str) -> WireResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check the ordering rules every client relies on
    ///
    /// - a Create precedes every other operation addressed to its object
    /// - nothing follows a Destroy for the same object
    /// - a parent created in this message is created before its children
    pub fn verify_ordering(&self) -> WireResult<()> {
        let mut create_positions: HashMap<&ObjectId, usize> = HashMap::new();
        for (index, operation) in self.operations.iter().enumerate() {
            if let Operation::Create { target, .. } = operation {
                if create_positions.insert(target, index).is_some() {
                    return Err(WireError::Ordering(format!("{} is created twice", target)));
                }
            }
        }

        let mut seen: HashSet<&ObjectId> = HashSet::new();
        let mut destroyed: HashSet<&ObjectId> = HashSet::new();
        for (index, operation) in self.operations.iter().enumerate() {
            let target = operation.target();
            if destroyed.contains(target) {
                return Err(WireError::Ordering(format!(
                    "{} on {} follows its destroy",
                    operation.kind(),
                    target
                )));
            }
            match operation {
                Operation::Create { parent, .. } => {
                    if seen.contains(target) {
                        return Err(WireError::Ordering(format!(
                            "create of {} follows other operations on it",
                            target
                        )));
                    }
                    if let Some(parent) = parent {
                        if destroyed.contains(parent) {
                            return Err(WireError::Ordering(format!(
                                "{} is created under destroyed parent {}",
                                target, parent
                            )));
                        }
                        if matches!(create_positions.get(parent), Some(&at) if at > index) {
                            return Err(WireError::Ordering(format!(
                                "{} is created before its parent {}",
                                target, parent
                            )));
                        }
                    }
                }
                Operation::Destroy { .. } => {
                    destroyed.insert(target);
                }
                _ => {}
            }
            seen.insert(target);
        }
        Ok(())
    }

    /// All operations addressed to `target`, in order
    pub fn operations_for(&self, target: &ObjectId) -> Vec<&Operation> {
        self.operations
            .iter()
            .filter(|operation| operation.target() == target)
            .collect()
    }

    pub fn count_kind(&self, target: &ObjectId, kind: OperationKind) -> usize {
        self.operations
            .iter()
            .filter(|operation| operation.target() == target && operation.kind() == kind)
            .count()
    }

    pub fn find_create_operation(&self, target: &ObjectId) -> Option<&Operation> {
        self.find(target, OperationKind::Create, |_| true)
    }

    pub fn find_create_property(&self, target: &ObjectId, name: &str) -> Option<&PropertyValue> {
        self.find_create_operation(target)
            .and_then(|operation| operation.property(name))
    }

    /// The Set operation that carries `name`
    pub fn find_set_operation(&self, target: &ObjectId, name: &str) -> Option<&Operation> {
        self.find(target, OperationKind::Set, |operation| {
            operation.property(name).is_some()
        })
    }

    pub fn find_set_property(&self, target: &ObjectId, name: &str) -> Option<&PropertyValue> {
        self.find_set_operation(target, name)
            .and_then(|operation| operation.property(name))
    }

    pub fn find_listen_operation(&self, target: &ObjectId, event: &str) -> Option<&Operation> {
        self.find(target, OperationKind::Listen, |operation| {
            operation.property(event).is_some()
        })
    }

    pub fn find_listen_property(&self, target: &ObjectId, event: &str) -> Option<bool> {
        self.find_listen_operation(target, event)
            .and_then(|operation| operation.property(event))
            .and_then(PropertyValue::as_bool)
    }

    pub fn find_call_operations(&self, target: &ObjectId, method: &str) -> Vec<&Operation> {
        self.operations
            .iter()
            .filter(|operation| {
                matches!(operation, Operation::Call { target: t, method: m, .. } if t == target && m == method)
            })
            .collect()
    }

    fn find<F>(&self, target: &ObjectId, kind: OperationKind, filter: F) -> Option<&Operation>
    where
        F: Fn(&Operation) -> bool,
    {
        self.operations.iter().find(|operation| {
            operation.target() == target && operation.kind() == kind && filter(operation)
        })
    }
}

/// Inbound operation reported by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientOperation {
    /// Property values changed on the client
    Set {
        target: ObjectId,
        properties: Properties,
    },

    /// An event the server listens for occurred
    Notify {
        target: ObjectId,
        event: String,
        #[serde(default)]
        properties: Properties,
    },

    /// The client invokes a method on the server object
    Call {
        target: ObjectId,
        method: String,
        #[serde(default)]
        properties: Properties,
    },
}

impl ClientOperation {
    pub fn target(&self) -> &ObjectId {
        match self {
            Self::Set { target, .. } | Self::Notify { target, .. } | Self::Call { target, .. } => {
                target
            }
        }
    }
}

/// Inbound message: everything the client reports in one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub head: MessageHead,
    #[serde(default)]
    pub operations: Vec<ClientOperation>,
}

impl ClientMessage {
    pub fn new(request_counter: u64) -> Self {
        Self {
            head: MessageHead { request_counter },
            operations: Vec::new(),
        }
    }

    pub fn with_set(mut self, target: impl Into<ObjectId>, properties: Properties) -> Self {
        self.operations.push(ClientOperation::Set {
            target: target.into(),
            properties,
        });
        self
    }

    pub fn with_notify(
        mut self,
        target: impl Into<ObjectId>,
        event: impl Into<String>,
        properties: Properties,
    ) -> Self {
        self.operations.push(ClientOperation::Notify {
            target: target.into(),
            event: event.into(),
            properties,
        });
        self
    }

    pub fn with_call(
        mut self,
        target: impl Into<ObjectId>,
        method: impl Into<String>,
        properties: Properties,
    ) -> Self {
        self.operations.push(ClientOperation::Call {
            target: target.into(),
            method: method.into(),
            properties,
        });
        self
    }

    pub fn from_json_str(text: &str) -> WireResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_string(&self) -> WireResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(target: &str, parent: Option<&str>) -> Operation {
        Operation::Create {
            target: target.into(),
            type_name: "t".into(),
            parent: parent.map(ObjectId::from),
            properties: Properties::new(),
        }
    }

    fn set(target: &str) -> Operation {
        Operation::Set {
            target: target.into(),
            properties: Properties::new().with("x", 1),
        }
    }

    #[test]
    fn test_accepts_well_ordered_message() {
        let message = Message::new(
            MessageHead::default(),
            vec![
                create("w1", None),
                create("w2", Some("w1")),
                set("w2"),
                Operation::Destroy { target: "w3".into() },
            ],
        );
        assert!(message.verify_ordering().is_ok());
    }

    #[test]
    fn test_rejects_child_before_parent() {
        let message = Message::new(
            MessageHead::default(),
            vec![create("w2", Some("w1")), create("w1", None)],
        );
        assert!(matches!(message.verify_ordering(), Err(WireError::Ordering(_))));
    }

    #[test]
    fn test_rejects_operation_after_destroy() {
        let message = Message::new(
            MessageHead::default(),
            vec![Operation::Destroy { target: "w1".into() }, set("w1")],
        );
        assert!(message.verify_ordering().is_err());
    }

    #[test]
    fn test_rejects_set_before_create() {
        let message = Message::new(MessageHead::default(), vec![set("w1"), create("w1", None)]);
        assert!(message.verify_ordering().is_err());
    }

    #[test]
    fn test_client_message_decoding() {
        let text = r#"{
            "head": {"requestCounter": 4},
            "operations": [
                {"action": "set", "target": "w5", "properties": {"selection": true}},
                {"action": "notify", "target": "w5", "event": "Selection"}
            ]
        }"#;
        let message = ClientMessage::from_json_str(text).unwrap();
        assert_eq!(message.head.request_counter, 4);
        assert_eq!(message.operations.len(), 2);
        match &message.operations[1] {
            ClientOperation::Notify { event, properties, .. } => {
                assert_eq!(event, "Selection");
                assert!(properties.is_empty());
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }
}
