//! # Widget Tree
//!
//! A minimal server-side widget model that drives the synchronization core:
//! shells, menus and menu items held in a session-owned arena. Keys are
//! never reused, so a key held by a handler or listener can go stale but
//! never points at a different widget.
//!
//! Disposing a widget disposes its subtree. Disposed widgets stay in the
//! arena, queued for rendering their Destroy, until the cycle that rendered
//! them is committed.

pub mod event;
pub mod menu;
pub mod menu_item;
pub mod shell;

use std::collections::HashMap;

use log::{debug, trace};
use once_cell::unsync::OnceCell;
use rwt_shared::constants::CUSTOM_VARIANT_PREFIX;
use rwt_shared::ObjectId;

use crate::error::{SyncError, SyncResult};
use crate::lifecycle::WidgetLifeCycleAdapter;

pub use event::{Event, EventClock, EventType, Listener, ListenerId};
pub use menu::{MenuData, MenuLifeCycleAdapter, MenuStyle};
pub use menu_item::{Image, MenuItemData, MenuItemLifeCycleAdapter, MenuItemStyle};
pub use shell::{ShellData, ShellLifeCycleAdapter, ShellStyle};

/// Stable key of a widget in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetKey(usize);

/// Kind-specific widget state
#[derive(Debug, Clone)]
pub enum WidgetKind {
    Shell(ShellData),
    Menu(MenuData),
    MenuItem(MenuItemData),
}

impl WidgetKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shell(_) => "Shell",
            Self::Menu(_) => "Menu",
            Self::MenuItem(_) => "MenuItem",
        }
    }

    /// Renderer responsible for widgets of this kind
    pub fn life_cycle_adapter(&self) -> &'static dyn WidgetLifeCycleAdapter {
        match self {
            Self::Shell(_) => &ShellLifeCycleAdapter,
            Self::Menu(_) => &MenuLifeCycleAdapter,
            Self::MenuItem(_) => &MenuItemLifeCycleAdapter,
        }
    }

    fn accessibility(&self) -> &dyn Accessible {
        match self {
            Self::Shell(data) => data,
            Self::Menu(data) => data,
            Self::MenuItem(data) => data,
        }
    }
}

/// Whether a widget may receive user events right now
///
/// Disposal is checked by the tree before this is consulted.
pub trait Accessible {
    fn is_accessible(&self, tree: &WidgetTree, key: WidgetKey) -> bool;
}

/// Protocol-facing bookkeeping of one widget
#[derive(Debug, Default)]
pub struct WidgetAdapter {
    id: Option<ObjectId>,
    rendered_variant: OnceCell<Option<String>>,
}

impl WidgetAdapter {
    /// Id of the client mirror, once assigned
    pub fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn rendered_variant(&self, variant: Option<&str>) -> Option<&str> {
        self.rendered_variant
            .get_or_init(|| variant.map(|name| format!("{}{}", CUSTOM_VARIANT_PREFIX, name)))
            .as_deref()
    }

    fn invalidate(&mut self) {
        self.rendered_variant.take();
    }
}

struct ListenerEntry {
    id: ListenerId,
    event_type: EventType,
    callback: Listener,
}

pub struct WidgetNode {
    parent: Option<WidgetKey>,
    children: Vec<WidgetKey>,
    kind: WidgetKind,
    enabled: bool,
    custom_variant: Option<String>,
    disposed: bool,
    adapter: WidgetAdapter,
    listeners: Vec<ListenerEntry>,
}

impl WidgetNode {
    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<WidgetKey> {
        self.parent
    }

    /// Live children in creation order
    pub fn children(&self) -> &[WidgetKey] {
        &self.children
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn custom_variant(&self) -> Option<&str> {
        self.custom_variant.as_deref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn adapter(&self) -> &WidgetAdapter {
        &self.adapter
    }
}

/// Session-owned arena of widgets
#[derive(Default)]
pub struct WidgetTree {
    nodes: Vec<Option<WidgetNode>>,
    roots: Vec<WidgetKey>,
    disposed: Vec<WidgetKey>,
    ids: HashMap<ObjectId, WidgetKey>,
    active_shell: Option<WidgetKey>,
    clock: EventClock,
    next_listener: u64,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_root(&mut self, kind: WidgetKind) -> WidgetKey {
        let key = self.push_node(None, kind);
        self.roots.push(key);
        key
    }

    pub(crate) fn insert_child(&mut self, parent: WidgetKey, kind: WidgetKind) -> SyncResult<WidgetKey> {
        self.live_mut(parent)?;
        let key = self.push_node(Some(parent), kind);
        self.live_mut(parent)?.children.push(key);
        Ok(key)
    }

    fn push_node(&mut self, parent: Option<WidgetKey>, kind: WidgetKind) -> WidgetKey {
        let key = WidgetKey(self.nodes.len());
        trace!("Inserted {} {:?} under {:?}", kind.name(), key, parent);
        self.nodes.push(Some(WidgetNode {
            parent,
            children: Vec::new(),
            kind,
            enabled: true,
            custom_variant: None,
            disposed: false,
            adapter: WidgetAdapter::default(),
            listeners: Vec::new(),
        }));
        key
    }

    pub fn get(&self, key: WidgetKey) -> Option<&WidgetNode> {
        self.nodes.get(key.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, key: WidgetKey) -> Option<&mut WidgetNode> {
        self.nodes.get_mut(key.0).and_then(Option::as_mut)
    }

    /// Node that has not been disposed
    pub(crate) fn live_mut(&mut self, key: WidgetKey) -> SyncResult<&mut WidgetNode> {
        match self.get_mut(key) {
            Some(node) if !node.disposed => Ok(node),
            _ => Err(SyncError::IllegalState(format!("widget {:?} is disposed", key))),
        }
    }

    pub fn kind(&self, key: WidgetKey) -> Option<&WidgetKind> {
        self.get(key).map(WidgetNode::kind)
    }

    /// True for disposed keys and keys no longer in the arena
    pub fn is_disposed(&self, key: WidgetKey) -> bool {
        self.get(key).map_or(true, |node| node.disposed)
    }

    pub fn id(&self, key: WidgetKey) -> Option<&ObjectId> {
        self.get(key).and_then(|node| node.adapter.id())
    }

    pub(crate) fn set_id(&mut self, key: WidgetKey, id: ObjectId) {
        if let Some(node) = self.nodes.get_mut(key.0).and_then(Option::as_mut) {
            node.adapter.id = Some(id.clone());
            self.ids.insert(id, key);
        }
    }

    /// Widget holding `id`, until the cycle that rendered its Destroy commits
    pub fn find_by_id(&self, id: &ObjectId) -> Option<WidgetKey> {
        self.ids.get(id).copied()
    }

    /// Top-level widgets (shells)
    pub fn roots(&self) -> &[WidgetKey] {
        &self.roots
    }

    pub fn children(&self, key: WidgetKey) -> &[WidgetKey] {
        self.get(key).map(WidgetNode::children).unwrap_or(&[])
    }

    /// Every live widget, parents before children
    pub fn live_keys(&self) -> Vec<WidgetKey> {
        let mut keys = Vec::new();
        let mut stack: Vec<WidgetKey> = self.roots.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            if self.is_disposed(key) {
                continue;
            }
            keys.push(key);
            stack.extend(self.children(key).iter().rev().copied());
        }
        keys
    }

    /// Disposed widgets awaiting their Destroy, children before parents
    pub fn disposed_keys(&self) -> &[WidgetKey] {
        &self.disposed
    }

    pub fn is_enabled(&self, key: WidgetKey) -> bool {
        self.get(key).map_or(false, WidgetNode::is_enabled)
    }

    pub fn set_enabled(&mut self, key: WidgetKey, enabled: bool) -> SyncResult<()> {
        self.live_mut(key)?.enabled = enabled;
        Ok(())
    }

    pub fn set_custom_variant(&mut self, key: WidgetKey, variant: Option<&str>) -> SyncResult<()> {
        let node = self.live_mut(key)?;
        node.custom_variant = variant.map(str::to_string);
        node.adapter.invalidate();
        Ok(())
    }

    /// Custom variant in its rendered form (`variant_<name>`), cached
    pub fn rendered_variant(&self, key: WidgetKey) -> Option<&str> {
        let node = self.get(key)?;
        node.adapter.rendered_variant(node.custom_variant.as_deref())
    }

    pub fn text(&self, key: WidgetKey) -> Option<&str> {
        match self.kind(key)? {
            WidgetKind::Shell(shell) => Some(shell.text()),
            WidgetKind::MenuItem(item) => Some(item.text()),
            WidgetKind::Menu(_) => None,
        }
    }

    pub fn set_text(&mut self, key: WidgetKey, text: &str) -> SyncResult<()> {
        match &mut self.live_mut(key)?.kind {
            WidgetKind::Shell(shell) => shell.text = text.to_string(),
            WidgetKind::MenuItem(item) => item.text = text.to_string(),
            WidgetKind::Menu(_) => {
                return Err(SyncError::invalid_argument("text", "menus have no text"))
            }
        }
        Ok(())
    }

    pub fn add_listener<F>(&mut self, key: WidgetKey, event_type: EventType, callback: F) -> SyncResult<ListenerId>
    where
        F: FnMut(&mut WidgetTree, &mut Event) + Send + 'static,
    {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.live_mut(key)?.listeners.push(ListenerEntry {
            id,
            event_type,
            callback: Box::new(callback),
        });
        Ok(id)
    }

    pub fn remove_listener(&mut self, key: WidgetKey, id: ListenerId) -> bool {
        match self.get_mut(key) {
            Some(node) => {
                let before = node.listeners.len();
                node.listeners.retain(|entry| entry.id != id);
                node.listeners.len() != before
            }
            None => false,
        }
    }

    pub fn has_listener(&self, key: WidgetKey, event_type: EventType) -> bool {
        self.get(key).map_or(false, |node| {
            node.listeners
                .iter()
                .any(|entry| entry.event_type == event_type)
        })
    }

    /// Run the listeners registered for the event's type
    ///
    /// Listeners are detached while they run, so they may freely mutate the
    /// tree, including disposing the widget itself.
    pub fn notify_listeners(&mut self, key: WidgetKey, event: &mut Event) {
        let mut listeners = match self.get_mut(key) {
            Some(node) => std::mem::take(&mut node.listeners),
            None => return,
        };
        let event_type = event.event_type;
        for entry in listeners
            .iter_mut()
            .filter(|entry| entry.event_type == event_type)
        {
            (entry.callback)(self, event);
        }
        if let Some(node) = self.get_mut(key) {
            if !node.disposed {
                listeners.append(&mut node.listeners);
                node.listeners = listeners;
            }
        }
    }

    /// Deliver a new event of `event_type` if the widget is accessible
    ///
    /// Returns the event after all listeners ran, or `None` if the widget
    /// could not receive it.
    pub fn fire(&mut self, key: WidgetKey, event_type: EventType) -> Option<Event> {
        if !self.is_accessible(key) {
            debug!("Dropping {} event for inaccessible widget {:?}", event_type, key);
            return None;
        }
        let mut event = Event {
            event_type,
            widget: key,
            time: self.clock.next_time(),
            doit: true,
        };
        self.notify_listeners(key, &mut event);
        Some(event)
    }

    pub fn clock(&self) -> &EventClock {
        &self.clock
    }

    pub fn is_accessible(&self, key: WidgetKey) -> bool {
        match self.get(key) {
            Some(node) if !node.disposed => node.kind.accessibility().is_accessible(self, key),
            _ => false,
        }
    }

    /// The shell a widget belongs to
    pub fn shell_of(&self, key: WidgetKey) -> Option<WidgetKey> {
        let mut current = Some(key);
        while let Some(key) = current {
            let node = self.get(key)?;
            if let WidgetKind::Shell(_) = node.kind {
                return Some(key);
            }
            current = node.parent;
        }
        None
    }

    /// Dispose a widget and its subtree
    ///
    /// Disposing an already disposed widget does nothing.
    pub fn dispose(&mut self, key: WidgetKey) -> SyncResult<()> {
        if self.is_disposed(key) {
            return Ok(());
        }
        let first = self.disposed.len();
        self.dispose_subtree(key);
        let parent = self.get(key).and_then(WidgetNode::parent);
        match parent {
            Some(parent) => {
                if let Some(node) = self.get_mut(parent) {
                    node.children.retain(|child| *child != key);
                }
            }
            None => self.roots.retain(|root| *root != key),
        }

        let removed: Vec<WidgetKey> = self.disposed[first..].to_vec();
        if self.active_shell.map_or(false, |shell| removed.contains(&shell)) {
            self.active_shell = None;
        }
        let menus: Vec<WidgetKey> = removed
            .iter()
            .copied()
            .filter(|key| matches!(self.kind(*key), Some(WidgetKind::Menu(_))))
            .collect();
        for menu in menus {
            self.detach_menu(menu);
        }
        debug!("Disposed {} widgets under {:?}", removed.len(), key);
        Ok(())
    }

    fn dispose_subtree(&mut self, key: WidgetKey) {
        let children = self.children(key).to_vec();
        for child in children {
            self.dispose_subtree(child);
        }
        if let Some(node) = self.get_mut(key) {
            node.disposed = true;
            node.children.clear();
            node.listeners.clear();
            node.adapter.invalidate();
        } else {
            return;
        }
        self.disposed.push(key);
    }

    /// Drop disposed widgets whose Destroy has been delivered
    pub fn purge_disposed(&mut self) {
        for key in std::mem::take(&mut self.disposed) {
            if let Some(slot) = self.nodes.get_mut(key.0) {
                if let Some(id) = slot.take().and_then(|node| node.adapter.id) {
                    self.ids.remove(&id);
                }
            }
        }
    }
}
