//! # Widget Life Cycle
//!
//! Per-kind renderers and the driver that walks the widget tree. A cycle
//! preserves every live widget, then (after inbound data was applied)
//! renders disposed widgets children-first and live widgets parents-first.
//!
//! Widget ids are assigned lazily: the first preserve or render pass that
//! meets a widget without an id registers it, together with the operation
//! handler of its kind.

pub mod util;

use log::trace;
use rwt_shared::{ObjectId, Properties};

use crate::context::ProtocolContext;
use crate::error::{SyncError, SyncResult};
use crate::remote::{OperationHandler, Phase};
use crate::widgets::{WidgetKey, WidgetTree};

/// Protocol context of a widget session
pub type WidgetContext = ProtocolContext<WidgetTree>;

/// Renderer contract of one widget kind
pub trait WidgetLifeCycleAdapter: Sync {
    /// Wire type of the client mirror
    fn type_name(&self) -> &'static str;

    /// Default value of every rendered property, in canonical order
    fn defaults(&self) -> &'static Properties;

    /// Capture the baseline of this cycle
    fn preserve_values(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()>;

    /// Append the Create of a widget the client has not seen
    fn render_initialization(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()>;

    /// Append Set and Listen operations for everything that changed
    fn render_changes(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()>;

    fn render_dispose(&self, _tree: &WidgetTree, _key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        ctx.remote_object(id)?.destroy()
    }

    /// Handler for inbound operations addressed to the widget
    fn operation_handler(&self, key: WidgetKey) -> Box<dyn OperationHandler<WidgetTree>>;
}

/// Id of a live widget, registering it (and its ancestors) on first use
pub fn ensure_id(tree: &mut WidgetTree, key: WidgetKey, ctx: &mut WidgetContext) -> SyncResult<ObjectId> {
    if let Some(id) = tree.id(key) {
        return Ok(id.clone());
    }
    if tree.is_disposed(key) {
        return Err(SyncError::IllegalState(format!("widget {:?} is disposed", key)));
    }
    let (adapter, parent) = match tree.get(key) {
        Some(node) => (node.kind().life_cycle_adapter(), node.parent()),
        None => return Err(SyncError::IllegalState(format!("unknown widget {:?}", key))),
    };
    let parent_id = match parent {
        Some(parent) => Some(ensure_id(tree, parent, ctx)?),
        None => None,
    };
    let prefix = ctx.config().widget_id_prefix.clone();
    let id = ctx.register(&prefix, adapter.type_name(), parent_id.as_ref())?;
    ctx.set_handler(&id, adapter.operation_handler(key))?;
    trace!("Assigned {} to widget {:?}", id, key);
    tree.set_id(key, id.clone());
    Ok(id)
}

fn adapter_and_id(tree: &WidgetTree, key: WidgetKey) -> Option<(&'static dyn WidgetLifeCycleAdapter, ObjectId)> {
    let node = tree.get(key)?;
    Some((node.kind().life_cycle_adapter(), node.adapter().id()?.clone()))
}

/// Assign ids to every live widget that has none yet
pub fn assign_ids(tree: &mut WidgetTree, ctx: &mut WidgetContext) -> SyncResult<()> {
    for key in tree.live_keys() {
        ensure_id(tree, key, ctx)?;
    }
    Ok(())
}

/// Preserve the baseline of every live widget
pub fn preserve_widgets(tree: &mut WidgetTree, ctx: &mut WidgetContext) -> SyncResult<()> {
    assign_ids(tree, ctx)?;
    let tree = &*tree;
    for key in tree.live_keys() {
        if let Some((adapter, id)) = adapter_and_id(tree, key) {
            adapter.preserve_values(tree, key, &id, ctx)?;
        }
    }
    Ok(())
}

/// Render disposals, creations and changes into the current buffer
pub fn render_widgets(tree: &mut WidgetTree, ctx: &mut WidgetContext) -> SyncResult<()> {
    assign_ids(tree, ctx)?;
    let tree = &*tree;
    for &key in tree.disposed_keys() {
        let Some((adapter, id)) = adapter_and_id(tree, key) else {
            continue;
        };
        if ctx.objects().is_live(&id) {
            adapter.render_dispose(tree, key, &id, ctx)?;
        }
    }
    for key in tree.live_keys() {
        let Some((adapter, id)) = adapter_and_id(tree, key) else {
            continue;
        };
        if ctx.objects().phase(&id) == Some(Phase::Registered) {
            adapter.render_initialization(tree, key, &id, ctx)?;
        }
        adapter.render_changes(tree, key, &id, ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::widgets::{MenuItemStyle, MenuStyle, ShellStyle};
    use rwt_shared::{Operation, OperationKind, PropertyValue};

    fn context() -> WidgetContext {
        ProtocolContext::new(SyncConfig::default()).unwrap()
    }

    fn cycle(tree: &mut WidgetTree, ctx: &mut WidgetContext) -> rwt_shared::Message {
        render_widgets(tree, ctx).unwrap();
        let message = ctx.flush().unwrap();
        ctx.commit();
        tree.purge_disposed();
        ctx.begin_cycle();
        preserve_widgets(tree, ctx).unwrap();
        message
    }

    #[test]
    fn test_ids_are_assigned_parents_first() {
        let mut tree = WidgetTree::new();
        let mut ctx = context();
        let shell = tree.create_shell(&[]);
        let menu = tree.create_menu(shell, MenuStyle::Bar).unwrap();
        let item = tree.create_menu_item(menu, MenuItemStyle::Push).unwrap();
        assert_eq!(ensure_id(&mut tree, item, &mut ctx).unwrap().as_str(), "w3");
        assert_eq!(tree.id(shell).map(ObjectId::as_str), Some("w1"));
        assert_eq!(tree.id(menu).map(ObjectId::as_str), Some("w2"));
        assert_eq!(ensure_id(&mut tree, item, &mut ctx).unwrap().as_str(), "w3");
        assert_eq!(ctx.objects().len(), 3);
    }

    #[test]
    fn test_create_carries_only_non_default_values() {
        let mut tree = WidgetTree::new();
        let mut ctx = context();
        let shell = tree.create_shell(&[]);
        let menu = tree.create_menu(shell, MenuStyle::Bar).unwrap();
        let item = tree.create_menu_item(menu, MenuItemStyle::Push).unwrap();
        tree.set_text(item, "Open").unwrap();
        let message = cycle(&mut tree, &mut ctx);

        for key in [shell, menu, item] {
            let adapter = tree.kind(key).unwrap().life_cycle_adapter();
            let id = tree.id(key).unwrap();
            for (name, default) in adapter.defaults().iter() {
                assert_ne!(message.find_create_property(id, name), Some(default), "{} of {}", name, id);
            }
        }
        let item_id = tree.id(item).unwrap();
        assert_eq!(
            message.find_create_property(item_id, "text"),
            Some(&PropertyValue::from("Open"))
        );
    }

    #[test]
    fn test_initial_render_creates_parents_first() {
        let mut tree = WidgetTree::new();
        let mut ctx = context();
        let shell = tree.create_shell(&[ShellStyle::Border]);
        let menu = tree.create_menu(shell, MenuStyle::Bar).unwrap();
        let item = tree.create_menu_item(menu, MenuItemStyle::Check).unwrap();
        tree.set_text(item, "Bold").unwrap();

        let message = cycle(&mut tree, &mut ctx);
        let creates: Vec<_> = message
            .operations
            .iter()
            .filter(|operation| operation.kind() == OperationKind::Create)
            .map(|operation| operation.target().as_str())
            .collect();
        assert_eq!(creates, ["w1", "w2", "w3"]);
        assert_eq!(message.len(), 3);
        let item_id = ObjectId::new("w3");
        assert_eq!(
            message.find_create_property(&item_id, "text"),
            Some(&PropertyValue::from("Bold"))
        );
        assert_eq!(
            message.find_create_property(&item_id, "index"),
            Some(&PropertyValue::Int(0))
        );
        assert!(message.find_create_property(&item_id, "selection").is_none());
        match message.find_create_operation(&item_id) {
            Some(Operation::Create { parent, .. }) => assert_eq!(parent.as_ref().map(ObjectId::as_str), Some("w2")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_disposed_children_destroyed_before_parents() {
        let mut tree = WidgetTree::new();
        let mut ctx = context();
        let shell = tree.create_shell(&[]);
        let menu = tree.create_menu(shell, MenuStyle::Bar).unwrap();
        tree.create_menu_item(menu, MenuItemStyle::Push).unwrap();
        cycle(&mut tree, &mut ctx);

        tree.dispose(menu).unwrap();
        let message = cycle(&mut tree, &mut ctx);
        let destroyed: Vec<_> = message
            .operations
            .iter()
            .map(|operation| (operation.kind(), operation.target().as_str()))
            .collect();
        assert_eq!(
            destroyed,
            [(OperationKind::Destroy, "w3"), (OperationKind::Destroy, "w2")]
        );
        assert!(!ctx.objects().contains(&ObjectId::new("w2")));
    }

    #[test]
    fn test_widget_disposed_before_first_render_emits_nothing() {
        let mut tree = WidgetTree::new();
        let mut ctx = context();
        let shell = tree.create_shell(&[]);
        cycle(&mut tree, &mut ctx);
        let menu = tree.create_menu(shell, MenuStyle::PopUp).unwrap();
        ensure_id(&mut tree, menu, &mut ctx).unwrap();
        tree.dispose(menu).unwrap();
        let message = cycle(&mut tree, &mut ctx);
        assert!(message.is_empty());
    }
}
