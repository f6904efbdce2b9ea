//! # Menu
//!
//! Menu bars, pop-up menus and drop-down menus. A menu belongs to a shell and
//! owns its items.

use log::debug;
use once_cell::sync::Lazy;
use rwt_shared::constants::{events, props, types};
use rwt_shared::{ObjectId, Properties, PropertyValue};

use crate::error::{SyncError, SyncResult};
use crate::lifecycle::util::{preserve_listener, preserve_property, render_listener, render_property};
use crate::lifecycle::{WidgetContext, WidgetLifeCycleAdapter};
use crate::remote::OperationHandler;

use super::{Accessible, EventType, WidgetKey, WidgetKind, WidgetTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuStyle {
    Bar,
    PopUp,
    DropDown,
}

impl MenuStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "BAR",
            Self::PopUp => "POP_UP",
            Self::DropDown => "DROP_DOWN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuData {
    pub(crate) style: MenuStyle,
}

impl MenuData {
    pub fn style(&self) -> MenuStyle {
        self.style
    }
}

impl Accessible for MenuData {
    fn is_accessible(&self, tree: &WidgetTree, key: WidgetKey) -> bool {
        tree.is_enabled(key)
            && tree
                .shell_of(key)
                .map_or(false, |shell| tree.is_shell_accessible(shell))
    }
}

impl WidgetTree {
    pub fn create_menu(&mut self, shell: WidgetKey, style: MenuStyle) -> SyncResult<WidgetKey> {
        if self.shell(shell).is_none() {
            return Err(SyncError::invalid_argument(
                "parent",
                format!("{:?} is not a shell", shell),
            ));
        }
        self.insert_child(shell, WidgetKind::Menu(MenuData { style }))
    }

    pub fn menu(&self, key: WidgetKey) -> Option<&MenuData> {
        match self.kind(key)? {
            WidgetKind::Menu(menu) => Some(menu),
            _ => None,
        }
    }

    /// Live items of a menu, in order
    pub fn items(&self, menu: WidgetKey) -> &[WidgetKey] {
        self.children(menu)
    }

    /// Clear every cascade reference to a disposed menu
    pub(crate) fn detach_menu(&mut self, menu: WidgetKey) {
        for node in self.nodes.iter_mut().flatten() {
            if let WidgetKind::MenuItem(item) = &mut node.kind {
                if item.menu == Some(menu) {
                    item.menu = None;
                }
            }
        }
    }
}

static DEFAULTS: Lazy<Properties> = Lazy::new(|| {
    Properties::new()
        .with(props::ENABLED, true)
        .with(props::CUSTOM_VARIANT, PropertyValue::Null)
});

/// Renders menus
pub struct MenuLifeCycleAdapter;

impl MenuLifeCycleAdapter {
    /// Show is also needed to deliver Arm events to the items
    fn listens_for_show(tree: &WidgetTree, key: WidgetKey) -> bool {
        tree.has_listener(key, EventType::Show)
            || tree
                .items(key)
                .iter()
                .any(|item| tree.has_listener(*item, EventType::Arm))
    }
}

impl WidgetLifeCycleAdapter for MenuLifeCycleAdapter {
    fn type_name(&self) -> &'static str {
        types::MENU
    }

    fn defaults(&self) -> &'static Properties {
        &DEFAULTS
    }

    fn preserve_values(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        preserve_property(ctx, id, props::ENABLED, tree.is_enabled(key));
        preserve_property(ctx, id, props::CUSTOM_VARIANT, tree.rendered_variant(key));
        preserve_listener(ctx, id, events::SHOW, Self::listens_for_show(tree, key));
        preserve_listener(ctx, id, events::HIDE, tree.has_listener(key, EventType::Hide));
        Ok(())
    }

    fn render_initialization(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        let style = tree
            .menu(key)
            .map(|menu| vec![menu.style().as_str()])
            .unwrap_or_default();
        ctx.remote_object(id)?
            .create(Properties::new().with(props::STYLE, style))
    }

    fn render_changes(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        render_property(ctx, id, self.defaults(), props::ENABLED, tree.is_enabled(key))?;
        render_property(ctx, id, self.defaults(), props::CUSTOM_VARIANT, tree.rendered_variant(key))?;
        render_listener(ctx, id, events::SHOW, Self::listens_for_show(tree, key))?;
        render_listener(ctx, id, events::HIDE, tree.has_listener(key, EventType::Hide))
    }

    fn operation_handler(&self, key: WidgetKey) -> Box<dyn OperationHandler<WidgetTree>> {
        Box::new(MenuOperationHandler { key })
    }
}

/// Turns client show/hide notifications into menu events
struct MenuOperationHandler {
    key: WidgetKey,
}

impl OperationHandler<WidgetTree> for MenuOperationHandler {
    fn handle_notify(
        &mut self,
        tree: &mut WidgetTree,
        target: &ObjectId,
        event: &str,
        _properties: &Properties,
    ) -> SyncResult<()> {
        match EventType::from_name(event) {
            Some(EventType::Show) => {
                if tree.fire(self.key, EventType::Show).is_some() {
                    for item in tree.items(self.key).to_vec() {
                        tree.fire(item, EventType::Arm);
                    }
                }
            }
            Some(EventType::Hide) => {
                tree.fire(self.key, EventType::Hide);
            }
            _ => debug!("Menu {} ignores {} notification", target, event),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{MenuItemStyle, ShellStyle};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_show_arms_every_item() {
        let mut tree = WidgetTree::new();
        let shell = tree.create_shell(&[ShellStyle::Border]);
        tree.open_shell(shell).unwrap();
        let menu = tree.create_menu(shell, MenuStyle::PopUp).unwrap();
        let first = tree.create_menu_item(menu, MenuItemStyle::Push).unwrap();
        let second = tree.create_menu_item(menu, MenuItemStyle::Check).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        for key in [menu, first, second] {
            for event_type in [EventType::Show, EventType::Arm] {
                let log = Arc::clone(&log);
                tree.add_listener(key, event_type, move |_, event| {
                    log.lock().unwrap().push((event.widget, event.event_type));
                })
                .unwrap();
            }
        }

        let mut handler = MenuOperationHandler { key: menu };
        handler
            .handle_notify(&mut tree, &ObjectId::new("w2"), events::SHOW, &Properties::new())
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (menu, EventType::Show),
                (first, EventType::Arm),
                (second, EventType::Arm)
            ]
        );
    }

    #[test]
    fn test_menu_parent_must_be_shell() {
        let mut tree = WidgetTree::new();
        let shell = tree.create_shell(&[]);
        let menu = tree.create_menu(shell, MenuStyle::Bar).unwrap();
        assert!(tree.create_menu(menu, MenuStyle::DropDown).is_err());
    }

    #[test]
    fn test_disposed_menu_is_detached_from_cascade_item() {
        let mut tree = WidgetTree::new();
        let shell = tree.create_shell(&[]);
        let bar = tree.create_menu(shell, MenuStyle::Bar).unwrap();
        let drop_down = tree.create_menu(shell, MenuStyle::DropDown).unwrap();
        let cascade = tree.create_menu_item(bar, MenuItemStyle::Cascade).unwrap();
        tree.set_item_menu(cascade, Some(drop_down)).unwrap();
        tree.dispose(drop_down).unwrap();
        assert_eq!(tree.menu_item(cascade).and_then(|item| item.menu()), None);
    }
}
