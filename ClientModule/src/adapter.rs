//! # Type Adapters
//!
//! Per wire type: which properties the client understands and in which order
//! it applies them, which events it can report and which methods it accepts.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rwt_shared::constants::{events, props, types};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAdapter {
    pub type_name: &'static str,
    /// Properties in application order
    pub properties: &'static [&'static str],
    pub listeners: &'static [&'static str],
    pub methods: &'static [&'static str],
}

impl TypeAdapter {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(&name)
    }

    pub fn supports_event(&self, event: &str) -> bool {
        self.listeners.contains(&event)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }

    /// Position of `name` in the application order
    pub fn property_rank(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|property| *property == name)
    }
}

static DEFAULT_ADAPTERS: Lazy<Vec<TypeAdapter>> = Lazy::new(|| {
    vec![
        TypeAdapter {
            type_name: types::SHELL,
            properties: &[
                props::STYLE,
                props::TEXT,
                props::ENABLED,
                props::VISIBILITY,
                props::ACTIVE,
                props::CUSTOM_VARIANT,
            ],
            listeners: &[events::CLOSE],
            methods: &[],
        },
        TypeAdapter {
            type_name: types::MENU,
            properties: &[props::STYLE, props::ENABLED, props::CUSTOM_VARIANT],
            listeners: &[events::SHOW, events::HIDE],
            methods: &[],
        },
        TypeAdapter {
            type_name: types::MENU_ITEM,
            // index first so the item lands in its slot before anything else
            properties: &[
                props::STYLE,
                props::INDEX,
                props::MENU,
                props::ENABLED,
                props::SELECTION,
                props::CUSTOM_VARIANT,
                props::TEXT,
                props::IMAGE,
            ],
            listeners: &[events::SELECTION, events::HELP],
            methods: &[],
        },
    ]
});

/// Adapters known to one mirror
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, TypeAdapter>,
}

impl AdapterRegistry {
    /// Registry without any adapter
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the adapters of the shipped widget types
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for adapter in DEFAULT_ADAPTERS.iter() {
            registry.add(adapter.clone());
        }
        registry
    }

    /// Add or replace the adapter of a type
    pub fn add(&mut self, adapter: TypeAdapter) {
        self.adapters.insert(adapter.type_name, adapter);
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeAdapter> {
        self.adapters.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_adapters() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(registry.len(), 3);
        let item = registry.get(types::MENU_ITEM).unwrap();
        assert!(item.supports_event("Selection"));
        assert!(!item.supports_event("Close"));
        assert!(item.property_rank("index") < item.property_rank("text"));
        assert!(registry.get("rwt.widgets.Button").is_none());
    }
}
