//! # Remote Objects
//!
//! Server-side handles of client mirrors. The registry tracks every object of
//! a session together with its mirror state and operation handler; a
//! [`RemoteObject`] view pushes operations for one object into the current
//! buffer.
//!
//! Mirror state is kept twice: the state as of the last flushed message
//! (`committed`) and the state including the current cycle (`current`). An
//! aborted cycle rolls `current` back.

pub mod handler;

use std::collections::HashMap;

use log::{debug, trace};
use rwt_shared::{ObjectId, Properties, PropertyValue, WireError};
use serde::Serialize;

use crate::error::{SyncError, SyncResult};
use crate::protocol::ProtocolWriter;

pub use handler::OperationHandler;

/// Where the client mirror of an object stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Id assigned, Create not sent yet
    #[default]
    Registered,
    /// Create sent (or buffered)
    Created,
    /// Inert; no further operations accepted
    Destroyed,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct MirrorState {
    phase: Phase,
    listening: HashMap<String, bool>,
}

struct RemoteEntry<T: ?Sized> {
    type_name: String,
    parent: Option<ObjectId>,
    committed: MirrorState,
    current: MirrorState,
    handler: Option<Box<dyn OperationHandler<T>>>,
}

/// Registry of the remote objects of one session
pub struct RemoteObjects<T: ?Sized> {
    entries: HashMap<ObjectId, RemoteEntry<T>>,
}

impl<T: ?Sized> Default for RemoteObjects<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: ?Sized> RemoteObjects<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an id that has not been seen before
    pub fn register(
        &mut self,
        id: &ObjectId,
        type_name: &str,
        parent: Option<&ObjectId>,
    ) -> SyncResult<()> {
        if !id.is_valid() {
            return Err(SyncError::invalid_argument("id", "object id must not be empty"));
        }
        if type_name.is_empty() {
            return Err(SyncError::Wire(WireError::EmptyName("type")));
        }
        if self.entries.contains_key(id) {
            return Err(SyncError::IllegalState(format!("{} is already registered", id)));
        }
        trace!("Registered remote object {} ({})", id, type_name);
        self.entries.insert(
            id.clone(),
            RemoteEntry {
                type_name: type_name.to_string(),
                parent: parent.cloned(),
                committed: MirrorState::default(),
                current: MirrorState::default(),
                handler: None,
            },
        );
        Ok(())
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn phase(&self, id: &ObjectId) -> Option<Phase> {
        self.entries.get(id).map(|entry| entry.current.phase)
    }

    /// Registered and not destroyed
    pub fn is_live(&self, id: &ObjectId) -> bool {
        matches!(self.phase(id), Some(Phase::Registered) | Some(Phase::Created))
    }

    pub fn type_name(&self, id: &ObjectId) -> Option<&str> {
        self.entries.get(id).map(|entry| entry.type_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Detach the handler of `id` while it runs against the world
    pub fn take_handler(&mut self, id: &ObjectId) -> Option<Box<dyn OperationHandler<T>>> {
        self.entries.get_mut(id).and_then(|entry| entry.handler.take())
    }

    /// Reattach a handler taken with [`take_handler`](Self::take_handler)
    ///
    /// A handler installed in the meantime wins.
    pub fn restore_handler(&mut self, id: &ObjectId, handler: Box<dyn OperationHandler<T>>) {
        if let Some(entry) = self.entries.get_mut(id) {
            if entry.handler.is_none() {
                entry.handler = Some(handler);
            }
        }
    }

    /// View of one object, bound to the buffer of the current cycle
    pub fn object<'a>(
        &'a mut self,
        id: &ObjectId,
        writer: &'a mut ProtocolWriter,
    ) -> SyncResult<RemoteObject<'a, T>> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| SyncError::UnknownObject(id.clone()))?;
        Ok(RemoteObject {
            id: id.clone(),
            entry,
            writer,
        })
    }

    /// Make the current cycle's state the committed one
    ///
    /// Destroyed objects are dropped; their ids stay retired in the generator.
    pub fn commit(&mut self) -> Vec<ObjectId> {
        let mut dropped = Vec::new();
        self.entries.retain(|id, entry| {
            if entry.current.phase == Phase::Destroyed {
                dropped.push(id.clone());
                return false;
            }
            entry.committed = entry.current.clone();
            true
        });
        if !dropped.is_empty() {
            debug!("Dropped {} destroyed remote objects", dropped.len());
        }
        dropped
    }

    /// Forget every state change of the current cycle
    pub fn abort(&mut self) {
        for entry in self.entries.values_mut() {
            entry.current = entry.committed.clone();
        }
    }
}

/// Handle of one remote object for the current cycle
pub struct RemoteObject<'a, T: ?Sized> {
    id: ObjectId,
    entry: &'a mut RemoteEntry<T>,
    writer: &'a mut ProtocolWriter,
}

impl<'a, T: ?Sized> RemoteObject<'a, T> {
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.entry.type_name
    }

    pub fn phase(&self) -> Phase {
        self.entry.current.phase
    }

    /// True once the client holds the mirror
    ///
    /// An object whose Create is still buffered counts as not initialized,
    /// which makes renderers diff it against its defaults.
    pub fn is_initialized(&self) -> bool {
        self.entry.current.phase == Phase::Created && !self.writer.has_pending_create(&self.id)
    }

    pub fn is_destroyed(&self) -> bool {
        self.entry.current.phase == Phase::Destroyed
    }

    /// Listen state as sent to the client in this or an earlier cycle
    pub fn is_listening(&self, event_type: &str) -> bool {
        self.entry
            .current
            .listening
            .get(event_type)
            .copied()
            .unwrap_or(false)
    }

    /// Append the Create of this object
    pub fn create(&mut self, properties: Properties) -> SyncResult<()> {
        match self.entry.current.phase {
            Phase::Registered => {}
            Phase::Created => {
                return Err(SyncError::IllegalState(format!("{} is already created", self.id)))
            }
            Phase::Destroyed => return Err(SyncError::Destroyed(self.id.clone())),
        }
        properties.validate()?;
        self.writer.append_create(
            &self.id,
            &self.entry.type_name,
            self.entry.parent.as_ref(),
            properties,
        );
        self.entry.current.phase = Phase::Created;
        Ok(())
    }

    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> SyncResult<()> {
        self.ensure_created()?;
        if name.is_empty() {
            return Err(SyncError::Wire(WireError::EmptyName("property")));
        }
        let value = value.into();
        value
            .validate()
            .map_err(|e| SyncError::invalid_argument(name, e))?;
        self.writer.append_set(&self.id, name, value);
        Ok(())
    }

    /// Set a value of any serializable type
    pub fn set_serialized<S: Serialize + ?Sized>(&mut self, name: &str, value: &S) -> SyncResult<()> {
        let value =
            PropertyValue::from_serializable(value).map_err(|e| SyncError::invalid_argument(name, e))?;
        self.set(name, value)
    }

    pub fn listen(&mut self, event_type: &str, listen: bool) -> SyncResult<()> {
        self.ensure_created()?;
        if event_type.is_empty() {
            return Err(SyncError::Wire(WireError::EmptyName("event type")));
        }
        self.entry
            .current
            .listening
            .insert(event_type.to_string(), listen);
        self.writer.append_listen(&self.id, event_type, listen);
        Ok(())
    }

    pub fn call(&mut self, method: &str, properties: Properties) -> SyncResult<()> {
        self.ensure_created()?;
        if method.is_empty() {
            return Err(SyncError::Wire(WireError::EmptyName("method")));
        }
        properties
            .validate()
            .map_err(|e| SyncError::invalid_argument(method, e))?;
        self.writer.append_call(&self.id, method, properties);
        Ok(())
    }

    /// Destroy the client mirror and make this handle inert
    ///
    /// An object the client never saw is retired without a Destroy.
    pub fn destroy(&mut self) -> SyncResult<()> {
        match self.entry.current.phase {
            Phase::Destroyed => return Err(SyncError::Destroyed(self.id.clone())),
            Phase::Created => self.writer.append_destroy(&self.id),
            Phase::Registered => trace!("{} retired before it was created", self.id),
        }
        self.entry.current.phase = Phase::Destroyed;
        Ok(())
    }

    /// Install the handler for inbound operations, replacing any previous one
    pub fn set_handler(&mut self, handler: Box<dyn OperationHandler<T>>) -> SyncResult<()> {
        if self.is_destroyed() {
            return Err(SyncError::Destroyed(self.id.clone()));
        }
        self.entry.handler = Some(handler);
        Ok(())
    }

    pub fn has_handler(&self) -> bool {
        self.entry.handler.is_some()
    }

    fn ensure_created(&self) -> SyncResult<()> {
        match self.entry.current.phase {
            Phase::Created => Ok(()),
            Phase::Destroyed => Err(SyncError::Destroyed(self.id.clone())),
            Phase::Registered => Err(SyncError::IllegalState(format!(
                "{} has not been created on the client",
                self.id
            ))),
        }
    }
}
