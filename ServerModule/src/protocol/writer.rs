//! # Operation Buffer
//!
//! Ordered, append-only buffer of outbound operations. Sets and listens
//! coalesce per object until the buffer is taken; calls never coalesce.

use std::collections::HashMap;

use log::trace;
use rwt_shared::{Message, MessageHead, ObjectId, Operation, OperationKind, Properties, PropertyValue};

/// Buffer of the current render cycle
///
/// Removed operations leave an empty slot behind so that indices held in the
/// coalescing index stay valid until the buffer is taken.
#[derive(Debug, Default)]
pub struct ProtocolWriter {
    slots: Vec<Option<Operation>>,
    index: HashMap<(ObjectId, OperationKind), usize>,
}

impl ProtocolWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_create(
        &mut self,
        target: &ObjectId,
        type_name: &str,
        parent: Option<&ObjectId>,
        properties: Properties,
    ) {
        trace!("create {} ({})", target, type_name);
        self.push(Operation::Create {
            target: target.clone(),
            type_name: type_name.to_string(),
            parent: parent.cloned(),
            properties,
        });
    }

    /// Append one property value for `target`
    ///
    /// Folds into a pending Create of the same object, otherwise into the
    /// object's Set of this cycle. A repeated name keeps its position and
    /// takes the latest value.
    pub fn append_set(&mut self, target: &ObjectId, name: &str, value: PropertyValue) {
        trace!("set {}.{} = {:?}", target, name, value);
        if let Some(properties) = self.pending_properties(target, OperationKind::Create) {
            properties.insert(name, value);
            return;
        }
        if let Some(properties) = self.pending_properties(target, OperationKind::Set) {
            properties.insert(name, value);
            return;
        }
        self.push(Operation::Set {
            target: target.clone(),
            properties: Properties::new().with(name, value),
        });
    }

    pub fn append_listen(&mut self, target: &ObjectId, event_type: &str, listen: bool) {
        trace!("listen {}.{} = {}", target, event_type, listen);
        if let Some(properties) = self.pending_properties(target, OperationKind::Listen) {
            properties.insert(event_type, listen);
            return;
        }
        self.push(Operation::Listen {
            target: target.clone(),
            properties: Properties::new().with(event_type, listen),
        });
    }

    pub fn append_call(&mut self, target: &ObjectId, method: &str, properties: Properties) {
        trace!("call {}.{}", target, method);
        self.slots.push(Some(Operation::Call {
            target: target.clone(),
            method: method.to_string(),
            properties,
        }));
    }

    /// Append a Destroy, dropping the object's pending Set and Listen
    ///
    /// If its Create is still buffered the client never learns about the object, so
    /// everything buffered for it goes and no Destroy is appended.
    pub fn append_destroy(&mut self, target: &ObjectId) {
        let unsent = self.has_pending_create(target);
        for kind in [OperationKind::Create, OperationKind::Set, OperationKind::Listen] {
            if let Some(position) = self.index.remove(&(target.clone(), kind)) {
                self.slots[position] = None;
            }
        }
        if unsent {
            for slot in &mut self.slots {
                if slot.as_ref().map_or(false, |operation| operation.target() == target) {
                    *slot = None;
                }
            }
            trace!("{} destroyed before its create was sent", target);
            return;
        }
        trace!("destroy {}", target);
        self.push(Operation::Destroy {
            target: target.clone(),
        });
    }

    pub fn has_pending_create(&self, target: &ObjectId) -> bool {
        self.index
            .contains_key(&(target.clone(), OperationKind::Create))
    }

    /// Number of buffered operations
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffered operations in order, without taking them
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.slots.iter().flatten()
    }

    /// Move every buffered operation into a message and reset the buffer
    pub fn take_message(&mut self, head: MessageHead) -> Message {
        self.index.clear();
        let operations = std::mem::take(&mut self.slots)
            .into_iter()
            .flatten()
            .collect();
        Message::new(head, operations)
    }

    /// Drop everything appended in this cycle
    pub fn discard(&mut self) {
        if !self.slots.is_empty() {
            trace!("discarding {} buffered operations", self.len());
        }
        self.slots.clear();
        self.index.clear();
    }

    fn push(&mut self, operation: Operation) {
        let key = (operation.target().clone(), operation.kind());
        self.index.insert(key, self.slots.len());
        self.slots.push(Some(operation));
    }

    fn pending_properties(
        &mut self,
        target: &ObjectId,
        kind: OperationKind,
    ) -> Option<&mut Properties> {
        let position = *self.index.get(&(target.clone(), kind))?;
        match self.slots.get_mut(position)? {
            Some(Operation::Create { properties, .. })
            | Some(Operation::Set { properties, .. })
            | Some(Operation::Listen { properties, .. }) => Some(properties),
            _ => None,
        }
    }
}
