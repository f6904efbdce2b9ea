//! # Preserved-State Store
//!
//! Baseline values captured at the start of a render cycle. Renderers diff
//! the live state of an object against these values to decide what to send.
//!
//! The first value preserved for a property within a cycle wins, so internal
//! mutations later in the same cycle still diff against the pre-cycle state.

use std::collections::HashMap;

use log::trace;
use rwt_shared::{ObjectId, PropertyValue};

/// Key prefix for preserved listener state
const LISTENER_KEY_PREFIX: &str = "listener:";

/// Store key of the preserved listen state for `event_type`
pub fn listener_key(event_type: &str) -> String {
    format!("{}{}", LISTENER_KEY_PREFIX, event_type)
}

/// Per-object snapshot of the current cycle
#[derive(Debug, Default)]
pub struct PreservedValues {
    values: HashMap<ObjectId, HashMap<String, PropertyValue>>,
}

impl PreservedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` as the baseline unless one already exists this cycle
    ///
    /// Returns true if the value was recorded.
    pub fn preserve(
        &mut self,
        id: &ObjectId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> bool {
        let properties = self.values.entry(id.clone()).or_default();
        if properties.contains_key(name) {
            return false;
        }
        let value = value.into();
        trace!("Preserved {}.{} = {:?}", id, name, value);
        properties.insert(name.to_string(), value);
        true
    }

    pub fn get_preserved(&self, id: &ObjectId, name: &str) -> Option<&PropertyValue> {
        self.values.get(id).and_then(|properties| properties.get(name))
    }

    pub fn has_preserved(&self, id: &ObjectId, name: &str) -> bool {
        self.get_preserved(id, name).is_some()
    }

    /// Preserve whether at least one local listener exists for `event_type`
    pub fn preserve_listener(&mut self, id: &ObjectId, event_type: &str, listening: bool) -> bool {
        self.preserve(id, &listener_key(event_type), listening)
    }

    pub fn get_preserved_listener(&self, id: &ObjectId, event_type: &str) -> Option<bool> {
        self.get_preserved(id, &listener_key(event_type))
            .and_then(PropertyValue::as_bool)
    }

    /// Drop every baseline of one object
    pub fn clear(&mut self, id: &ObjectId) {
        self.values.remove(id);
    }

    /// Drop every baseline of every object
    pub fn clear_all(&mut self) {
        self.values.clear();
    }

    /// Number of objects with at least one baseline
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
