//! # Client Mirror
//!
//! Applies outbound server messages to a set of mirrored objects and
//! collects what the user did in between into the next inbound message.

use std::collections::HashMap;

use log::{debug, trace, warn};
use rwt_shared::{ClientMessage, ClientOperation, Message, ObjectId, Operation, Properties, PropertyValue};

use crate::adapter::{AdapterRegistry, TypeAdapter};
use crate::error::{ClientError, ClientResult};
use crate::object::{ClientObject, RecordedCall};

pub struct ClientMirror {
    adapters: AdapterRegistry,
    objects: HashMap<ObjectId, ClientObject>,
    request_counter: u64,
    pending: Vec<ClientOperation>,
}

impl Default for ClientMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMirror {
    /// Mirror that knows the shipped widget types
    pub fn new() -> Self {
        Self::with_adapters(AdapterRegistry::with_defaults())
    }

    pub fn with_adapters(adapters: AdapterRegistry) -> Self {
        Self {
            adapters,
            objects: HashMap::new(),
            request_counter: 0,
            pending: Vec::new(),
        }
    }

    pub fn adapters_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.adapters
    }

    /// Counter the next outbound request carries
    pub fn request_counter(&self) -> u64 {
        self.request_counter
    }

    pub fn object(&self, id: &ObjectId) -> Option<&ClientObject> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn property(&self, id: &ObjectId, name: &str) -> Option<&PropertyValue> {
        self.objects.get(id).and_then(|object| object.property(name))
    }

    pub fn is_listening(&self, id: &ObjectId, event: &str) -> bool {
        self.objects
            .get(id)
            .map_or(false, |object| object.is_listening(event))
    }

    pub fn calls(&self, id: &ObjectId) -> &[RecordedCall] {
        self.objects
            .get(id)
            .map(|object| object.calls.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of the direct children of `id`
    pub fn children(&self, id: &ObjectId) -> Vec<ObjectId> {
        self.objects
            .values()
            .filter(|object| object.parent.as_ref() == Some(id))
            .map(|object| object.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Apply every operation of a server message in order
    ///
    /// A message applies as a whole: if any operation fails the mirror is
    /// left exactly as it was before the call.
    pub fn apply(&mut self, message: &Message) -> ClientResult<()> {
        let objects = self.objects.clone();
        let pending = self.pending.clone();
        let applied = message
            .operations
            .iter()
            .try_for_each(|operation| self.apply_operation(operation));
        if let Err(err) = applied {
            warn!("Rejected message for request {}: {}", message.head.request_counter, err);
            self.objects = objects;
            self.pending = pending;
            return Err(err);
        }
        self.request_counter = message.head.request_counter;
        debug!(
            "Applied {} operations, next request {}",
            message.len(),
            self.request_counter
        );
        Ok(())
    }

    /// Decode and apply a JSON message
    pub fn apply_json(&mut self, text: &str) -> ClientResult<()> {
        let message = Message::from_json_str(text)?;
        self.apply(&message)
    }

    fn apply_operation(&mut self, operation: &Operation) -> ClientResult<()> {
        trace!("Applying {} to {}", operation.kind(), operation.target());
        match operation {
            Operation::Create {
                target,
                type_name,
                parent,
                properties,
            } => {
                if self.objects.contains_key(target) {
                    return Err(ClientError::DuplicateObject(target.clone()));
                }
                let adapter = self
                    .adapters
                    .get(type_name)
                    .ok_or_else(|| ClientError::UnknownType(type_name.clone()))?;
                if let Some(parent) = parent {
                    if !self.objects.contains_key(parent) {
                        return Err(ClientError::UnknownParent {
                            target: target.clone(),
                            parent: parent.clone(),
                        });
                    }
                }
                let mut object = ClientObject::new(target.clone(), type_name.clone(), parent.clone());
                apply_properties(adapter, &mut object, properties)?;
                self.objects.insert(target.clone(), object);
            }
            Operation::Set { target, properties } => {
                let (adapter, object) = self.resolve(target)?;
                apply_properties(adapter, object, properties)?;
            }
            Operation::Listen { target, properties } => {
                let (adapter, object) = self.resolve(target)?;
                for (event, value) in properties.iter() {
                    if !adapter.supports_event(event) {
                        return Err(ClientError::UnknownEvent {
                            type_name: object.type_name.clone(),
                            event: event.to_string(),
                        });
                    }
                    object
                        .listening
                        .insert(event.to_string(), value.as_bool().unwrap_or(false));
                }
            }
            Operation::Call {
                target,
                method,
                properties,
            } => {
                let (adapter, object) = self.resolve(target)?;
                if !adapter.has_method(method) {
                    return Err(ClientError::UnknownMethod {
                        type_name: object.type_name.clone(),
                        method: method.clone(),
                    });
                }
                object.calls.push(RecordedCall {
                    method: method.clone(),
                    properties: properties.clone(),
                });
            }
            Operation::Destroy { target } => {
                if !self.objects.contains_key(target) {
                    return Err(ClientError::UnknownTarget(target.clone()));
                }
                let removed = self.remove_subtree(target);
                self.pending.retain(|pending| !removed.contains(pending.target()));
            }
        }
        Ok(())
    }

    fn resolve(&mut self, target: &ObjectId) -> ClientResult<(&TypeAdapter, &mut ClientObject)> {
        let object = self
            .objects
            .get_mut(target)
            .ok_or_else(|| ClientError::UnknownTarget(target.clone()))?;
        let adapter = self
            .adapters
            .get(&object.type_name)
            .ok_or_else(|| ClientError::UnknownType(object.type_name.clone()))?;
        Ok((adapter, object))
    }

    fn remove_subtree(&mut self, root: &ObjectId) -> Vec<ObjectId> {
        let mut removed = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(id) = stack.pop() {
            stack.extend(self.children(&id));
            self.objects.remove(&id);
            removed.push(id);
        }
        removed
    }

    /// Change a property as the user would, reporting it with the next request
    pub fn user_set(
        &mut self,
        target: &ObjectId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> ClientResult<()> {
        let value = value.into();
        let (adapter, object) = self.resolve(target)?;
        if !adapter.has_property(name) {
            return Err(ClientError::UnknownProperty {
                type_name: object.type_name.clone(),
                name: name.to_string(),
            });
        }
        object.properties.insert(name, value.clone());

        let existing = self.pending.iter_mut().find_map(|pending| match pending {
            ClientOperation::Set { target: pending_target, properties } if *pending_target == *target => {
                Some(properties)
            }
            _ => None,
        });
        match existing {
            Some(properties) => {
                properties.insert(name, value);
            }
            None => self.pending.push(ClientOperation::Set {
                target: target.clone(),
                properties: Properties::new().with(name, value),
            }),
        }
        Ok(())
    }

    /// Report an event if the server listens for it
    ///
    /// Returns whether a notification was queued.
    pub fn fire(&mut self, target: &ObjectId, event: &str, properties: Properties) -> ClientResult<bool> {
        let (adapter, object) = self.resolve(target)?;
        if !adapter.supports_event(event) {
            return Err(ClientError::UnknownEvent {
                type_name: object.type_name.clone(),
                event: event.to_string(),
            });
        }
        if !object.is_listening(event) {
            trace!("{} not reported for {}", event, target);
            return Ok(false);
        }
        self.pending.push(ClientOperation::Notify {
            target: target.clone(),
            event: event.to_string(),
            properties,
        });
        Ok(true)
    }

    /// Invoke a method on the server object
    pub fn call_server(&mut self, target: &ObjectId, method: &str, properties: Properties) -> ClientResult<()> {
        if !self.objects.contains_key(target) {
            return Err(ClientError::UnknownTarget(target.clone()));
        }
        self.pending.push(ClientOperation::Call {
            target: target.clone(),
            method: method.to_string(),
            properties,
        });
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Next inbound message, echoing the last received counter
    pub fn take_message(&mut self) -> ClientMessage {
        ClientMessage {
            head: rwt_shared::MessageHead {
                request_counter: self.request_counter,
            },
            operations: std::mem::take(&mut self.pending),
        }
    }

    /// JSON snapshot of every mirrored object, sorted by id
    pub fn snapshot_json(&self) -> ClientResult<String> {
        let mut objects: Vec<&ClientObject> = self.objects.values().collect();
        objects.sort_by(|a, b| a.id.cmp(&b.id));
        serde_json::to_string(&objects).map_err(|err| ClientError::Wire(err.into()))
    }
}

/// Apply `properties` in the adapter's order
fn apply_properties(adapter: &TypeAdapter, object: &mut ClientObject, properties: &Properties) -> ClientResult<()> {
    let mut ranked = Vec::with_capacity(properties.len());
    for (name, value) in properties.iter() {
        let rank = adapter
            .property_rank(name)
            .ok_or_else(|| ClientError::UnknownProperty {
                type_name: object.type_name.clone(),
                name: name.to_string(),
            })?;
        ranked.push((rank, name, value));
    }
    ranked.sort_by_key(|(rank, _, _)| *rank);
    for (_, name, value) in ranked {
        object.properties.insert(name, value.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rwt_shared::MessageHead;

    fn message(counter: u64, operations: Vec<Operation>) -> Message {
        Message::new(MessageHead { request_counter: counter }, operations)
    }

    fn create(target: &str, type_name: &str, parent: Option<&str>, properties: Properties) -> Operation {
        Operation::Create {
            target: target.into(),
            type_name: type_name.into(),
            parent: parent.map(ObjectId::from),
            properties,
        }
    }

    fn menu_tree() -> ClientMirror {
        let mut mirror = ClientMirror::new();
        mirror
            .apply(&message(
                1,
                vec![
                    create("w1", "rwt.widgets.Shell", None, Properties::new()),
                    create("w2", "rwt.widgets.Menu", Some("w1"), Properties::new()),
                    create(
                        "w3",
                        "rwt.widgets.MenuItem",
                        Some("w2"),
                        Properties::new().with("text", "Open").with("index", 0),
                    ),
                ],
            ))
            .unwrap();
        mirror
    }

    #[test]
    fn test_properties_applied_in_adapter_order() {
        let mirror = menu_tree();
        let item = mirror.object(&"w3".into()).unwrap();
        assert_eq!(item.properties.names(), ["index", "text"]);
        assert_eq!(mirror.request_counter(), 1);
        assert_eq!(mirror.children(&"w1".into()), vec![ObjectId::from("w2")]);
    }

    #[test]
    fn test_ordering_violations_are_errors() {
        let mut mirror = ClientMirror::new();
        let orphan = message(1, vec![create("w2", "rwt.widgets.Menu", Some("w1"), Properties::new())]);
        assert!(matches!(mirror.apply(&orphan), Err(ClientError::UnknownParent { .. })));

        let set_first = message(
            1,
            vec![Operation::Set {
                target: "w1".into(),
                properties: Properties::new().with("text", "x"),
            }],
        );
        assert!(matches!(mirror.apply(&set_first), Err(ClientError::UnknownTarget(_))));

        let unknown = message(1, vec![create("w1", "rwt.widgets.Tree", None, Properties::new())]);
        assert!(matches!(mirror.apply(&unknown), Err(ClientError::UnknownType(_))));
    }

    #[test]
    fn test_failed_message_leaves_mirror_unchanged() {
        let mut mirror = menu_tree();
        mirror.user_set(&"w3".into(), "selection", true).unwrap();
        let broken = message(
            2,
            vec![
                Operation::Destroy { target: "w2".into() },
                Operation::Set {
                    target: "w9".into(),
                    properties: Properties::new().with("text", "x"),
                },
            ],
        );
        assert!(matches!(mirror.apply(&broken), Err(ClientError::UnknownTarget(_))));
        assert_eq!(mirror.len(), 3);
        assert!(mirror.contains(&"w3".into()));
        assert_eq!(mirror.request_counter(), 1);
        assert!(mirror.has_pending());
    }

    #[test]
    fn test_destroy_removes_descendants() {
        let mut mirror = menu_tree();
        mirror
            .apply(&message(2, vec![Operation::Destroy { target: "w2".into() }]))
            .unwrap();
        assert_eq!(mirror.len(), 1);
        assert!(!mirror.contains(&"w3".into()));
    }

    #[test]
    fn test_fire_requires_listener() {
        let mut mirror = menu_tree();
        let item: ObjectId = "w3".into();
        assert!(!mirror.fire(&item, "Selection", Properties::new()).unwrap());
        mirror
            .apply(&message(
                2,
                vec![Operation::Listen {
                    target: item.clone(),
                    properties: Properties::new().with("Selection", true),
                }],
            ))
            .unwrap();
        assert!(mirror.fire(&item, "Selection", Properties::new()).unwrap());
        assert!(mirror.fire(&item, "Close", Properties::new()).is_err());

        let outbound = mirror.take_message();
        assert_eq!(outbound.head.request_counter, 2);
        assert_eq!(outbound.operations.len(), 1);
        assert!(!mirror.has_pending());
    }

    #[test]
    fn test_user_sets_coalesce_per_target() {
        let mut mirror = menu_tree();
        let item: ObjectId = "w3".into();
        mirror.user_set(&item, "selection", true).unwrap();
        mirror.user_set(&item, "selection", false).unwrap();
        assert!(mirror.user_set(&item, "bogus", 1).is_err());

        let outbound = mirror.take_message();
        assert_eq!(outbound.operations.len(), 1);
        match &outbound.operations[0] {
            ClientOperation::Set { properties, .. } => {
                assert_eq!(properties.get("selection"), Some(&PropertyValue::Bool(false)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_calls_are_recorded_for_known_methods() {
        let mut mirror = ClientMirror::new();
        mirror.adapters_mut().add(TypeAdapter {
            type_name: "rwt.Clipboard",
            properties: &["text"],
            listeners: &[],
            methods: &["copy"],
        });
        let call = |method: &str| Operation::Call {
            target: "r1".into(),
            method: method.into(),
            properties: Properties::new().with("text", "abc"),
        };
        mirror
            .apply(&message(
                1,
                vec![create("r1", "rwt.Clipboard", None, Properties::new()), call("copy"), call("copy")],
            ))
            .unwrap();
        let id: ObjectId = "r1".into();
        assert_eq!(mirror.calls(&id).len(), 2);
        assert_eq!(mirror.calls(&id)[0].method, "copy");
        assert!(matches!(
            mirror.apply(&message(2, vec![call("paste")])),
            Err(ClientError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_snapshot_lists_objects_by_id() {
        let mirror = menu_tree();
        let snapshot: serde_json::Value = serde_json::from_str(&mirror.snapshot_json().unwrap()).unwrap();
        assert_eq!(snapshot[0]["id"], "w1");
        assert_eq!(snapshot[2]["typeName"], "rwt.widgets.MenuItem");
    }
}
