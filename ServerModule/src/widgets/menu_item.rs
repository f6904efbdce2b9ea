//! # Menu Item
//!
//! Entries of a menu. Check and radio items carry a selection the client can
//! change; cascade items open a drop-down menu.

use log::debug;
use once_cell::sync::Lazy;
use rwt_shared::constants::{events, props, types};
use rwt_shared::{ObjectId, Properties, PropertyValue};

use crate::error::{SyncError, SyncResult};
use crate::lifecycle::util::{preserve_listener, preserve_property, render_listener, render_property};
use crate::lifecycle::{WidgetContext, WidgetLifeCycleAdapter};
use crate::remote::OperationHandler;

use super::{Accessible, EventType, MenuStyle, WidgetKey, WidgetKind, WidgetTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemStyle {
    Push,
    Check,
    Radio,
    Cascade,
    Separator,
}

impl MenuItemStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::Check => "CHECK",
            Self::Radio => "RADIO",
            Self::Cascade => "CASCADE",
            Self::Separator => "SEPARATOR",
        }
    }

    /// Styles that carry a selection state
    pub fn is_selectable(&self) -> bool {
        matches!(self, Self::Check | Self::Radio)
    }
}

/// Image reference, rendered as `[path, width, height]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(path: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }
}

impl From<&Image> for PropertyValue {
    fn from(image: &Image) -> Self {
        PropertyValue::List(vec![
            PropertyValue::from(image.path.as_str()),
            PropertyValue::from(image.width),
            PropertyValue::from(image.height),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct MenuItemData {
    pub(crate) style: MenuItemStyle,
    pub(crate) text: String,
    pub(crate) image: Option<Image>,
    pub(crate) selection: bool,
    pub(crate) menu: Option<WidgetKey>,
}

impl MenuItemData {
    pub fn style(&self) -> MenuItemStyle {
        self.style
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn selection(&self) -> bool {
        self.selection
    }

    /// Drop-down menu opened by a cascade item
    pub fn menu(&self) -> Option<WidgetKey> {
        self.menu
    }
}

impl Accessible for MenuItemData {
    fn is_accessible(&self, tree: &WidgetTree, key: WidgetKey) -> bool {
        tree.is_enabled(key)
            && tree
                .shell_of(key)
                .map_or(false, |shell| tree.is_shell_accessible(shell))
    }
}

impl WidgetTree {
    pub fn create_menu_item(&mut self, menu: WidgetKey, style: MenuItemStyle) -> SyncResult<WidgetKey> {
        if self.menu(menu).is_none() {
            return Err(SyncError::invalid_argument(
                "parent",
                format!("{:?} is not a menu", menu),
            ));
        }
        self.insert_child(
            menu,
            WidgetKind::MenuItem(MenuItemData {
                style,
                text: String::new(),
                image: None,
                selection: false,
                menu: None,
            }),
        )
    }

    pub fn menu_item(&self, key: WidgetKey) -> Option<&MenuItemData> {
        match self.kind(key)? {
            WidgetKind::MenuItem(item) => Some(item),
            _ => None,
        }
    }

    fn menu_item_mut(&mut self, key: WidgetKey) -> SyncResult<&mut MenuItemData> {
        match &mut self.live_mut(key)?.kind {
            WidgetKind::MenuItem(item) => Ok(item),
            other => Err(SyncError::invalid_argument(
                "item",
                format!("{:?} is a {}", key, other.name()),
            )),
        }
    }

    pub fn set_image(&mut self, key: WidgetKey, image: Option<Image>) -> SyncResult<()> {
        self.menu_item_mut(key)?.image = image;
        Ok(())
    }

    /// Select or deselect a check or radio item; other styles ignore it
    pub fn set_selection(&mut self, key: WidgetKey, selection: bool) -> SyncResult<()> {
        let item = self.menu_item_mut(key)?;
        if item.style.is_selectable() {
            item.selection = selection;
        }
        Ok(())
    }

    /// Attach the drop-down menu of a cascade item
    pub fn set_item_menu(&mut self, key: WidgetKey, menu: Option<WidgetKey>) -> SyncResult<()> {
        if let Some(menu) = menu {
            let is_drop_down = !self.is_disposed(menu)
                && self
                    .menu(menu)
                    .map_or(false, |data| data.style == MenuStyle::DropDown);
            if !is_drop_down {
                return Err(SyncError::invalid_argument(
                    "menu",
                    format!("{:?} is not a live drop-down menu", menu),
                ));
            }
        }
        let item = self.menu_item_mut(key)?;
        if item.style != MenuItemStyle::Cascade {
            return Err(SyncError::invalid_argument(
                "menu",
                "only cascade items open a menu",
            ));
        }
        item.menu = menu;
        Ok(())
    }

    /// Position of an item among the live items of its menu
    pub fn item_index(&self, key: WidgetKey) -> Option<usize> {
        let parent = self.get(key)?.parent()?;
        self.items(parent).iter().position(|item| *item == key)
    }
}

static DEFAULTS: Lazy<Properties> = Lazy::new(|| {
    Properties::new()
        .with(props::MENU, PropertyValue::Null)
        .with(props::ENABLED, true)
        .with(props::SELECTION, false)
        .with(props::CUSTOM_VARIANT, PropertyValue::Null)
        .with(props::TEXT, "")
        .with(props::IMAGE, PropertyValue::Null)
});

/// Renders menu items
pub struct MenuItemLifeCycleAdapter;

struct ItemState<'a> {
    data: &'a MenuItemData,
    menu: PropertyValue,
    image: PropertyValue,
    enabled: bool,
    variant: Option<&'a str>,
}

impl MenuItemLifeCycleAdapter {
    fn state<'a>(tree: &'a WidgetTree, key: WidgetKey) -> Option<ItemState<'a>> {
        let data = tree.menu_item(key)?;
        Some(ItemState {
            data,
            menu: data
                .menu
                .and_then(|menu| tree.id(menu).cloned())
                .map_or(PropertyValue::Null, PropertyValue::Reference),
            image: data.image().map_or(PropertyValue::Null, PropertyValue::from),
            enabled: tree.is_enabled(key),
            variant: tree.rendered_variant(key),
        })
    }
}

impl WidgetLifeCycleAdapter for MenuItemLifeCycleAdapter {
    fn type_name(&self) -> &'static str {
        types::MENU_ITEM
    }

    fn defaults(&self) -> &'static Properties {
        &DEFAULTS
    }

    fn preserve_values(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        let Some(item) = Self::state(tree, key) else {
            return Ok(());
        };
        preserve_property(ctx, id, props::MENU, item.menu);
        preserve_property(ctx, id, props::ENABLED, item.enabled);
        preserve_property(ctx, id, props::SELECTION, item.data.selection());
        preserve_property(ctx, id, props::CUSTOM_VARIANT, item.variant);
        preserve_property(ctx, id, props::TEXT, item.data.text());
        preserve_property(ctx, id, props::IMAGE, item.image);
        preserve_listener(ctx, id, events::SELECTION, tree.has_listener(key, EventType::Selection));
        preserve_listener(ctx, id, events::HELP, tree.has_listener(key, EventType::Help));
        Ok(())
    }

    fn render_initialization(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        let Some(item) = tree.menu_item(key) else {
            return Ok(());
        };
        let index = tree.item_index(key).unwrap_or(0) as i64;
        ctx.remote_object(id)?.create(
            Properties::new()
                .with(props::STYLE, vec![item.style().as_str()])
                .with(props::INDEX, index),
        )
    }

    fn render_changes(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        let Some(item) = Self::state(tree, key) else {
            return Ok(());
        };
        render_property(ctx, id, self.defaults(), props::MENU, item.menu)?;
        render_property(ctx, id, self.defaults(), props::ENABLED, item.enabled)?;
        render_property(ctx, id, self.defaults(), props::SELECTION, item.data.selection())?;
        render_property(ctx, id, self.defaults(), props::CUSTOM_VARIANT, item.variant)?;
        render_property(ctx, id, self.defaults(), props::TEXT, item.data.text())?;
        render_property(ctx, id, self.defaults(), props::IMAGE, item.image)?;
        render_listener(ctx, id, events::SELECTION, tree.has_listener(key, EventType::Selection))?;
        render_listener(ctx, id, events::HELP, tree.has_listener(key, EventType::Help))
    }

    fn operation_handler(&self, key: WidgetKey) -> Box<dyn OperationHandler<WidgetTree>> {
        Box::new(MenuItemOperationHandler { key })
    }
}

/// Applies client selection changes and fires selection and help events
struct MenuItemOperationHandler {
    key: WidgetKey,
}

impl OperationHandler<WidgetTree> for MenuItemOperationHandler {
    fn handle_set(&mut self, tree: &mut WidgetTree, target: &ObjectId, properties: &Properties) -> SyncResult<()> {
        if tree.is_disposed(self.key) {
            return Ok(());
        }
        if let Some(value) = properties.get(props::SELECTION) {
            let selection = value
                .as_bool()
                .ok_or_else(|| SyncError::handler(target, "selection must be a boolean"))?;
            tree.set_selection(self.key, selection)?;
        }
        Ok(())
    }

    fn handle_notify(
        &mut self,
        tree: &mut WidgetTree,
        target: &ObjectId,
        event: &str,
        _properties: &Properties,
    ) -> SyncResult<()> {
        match EventType::from_name(event) {
            Some(event_type @ (EventType::Selection | EventType::Help)) => {
                tree.fire(self.key, event_type);
            }
            _ => debug!("MenuItem {} ignores {} notification", target, event),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::ShellStyle;
    use std::sync::{Arc, Mutex};

    fn item(style: MenuItemStyle) -> (WidgetTree, WidgetKey, WidgetKey) {
        let mut tree = WidgetTree::new();
        let shell = tree.create_shell(&[ShellStyle::Title]);
        tree.open_shell(shell).unwrap();
        let menu = tree.create_menu(shell, MenuStyle::Bar).unwrap();
        let item = tree.create_menu_item(menu, style).unwrap();
        (tree, menu, item)
    }

    #[test]
    fn test_selection_event_sees_client_selection() {
        let (mut tree, _menu, item) = item(MenuItemStyle::Check);
        let seen = Arc::new(Mutex::new(None));
        let observed = Arc::clone(&seen);
        tree.add_listener(item, EventType::Selection, move |tree, event| {
            let selection = tree.menu_item(event.widget).map(MenuItemData::selection);
            *observed.lock().unwrap() = selection;
        })
        .unwrap();

        let id = ObjectId::new("w3");
        let mut handler = MenuItemOperationHandler { key: item };
        handler
            .handle_set(&mut tree, &id, &Properties::new().with(props::SELECTION, true))
            .unwrap();
        handler
            .handle_notify(&mut tree, &id, events::SELECTION, &Properties::new())
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_push_item_ignores_selection() {
        let (mut tree, _menu, item) = item(MenuItemStyle::Push);
        tree.set_selection(item, true).unwrap();
        assert_eq!(tree.menu_item(item).map(MenuItemData::selection), Some(false));
    }

    #[test]
    fn test_only_cascade_items_take_a_drop_down() {
        let (mut tree, menu, push) = item(MenuItemStyle::Push);
        let shell = tree.shell_of(menu).unwrap();
        let drop_down = tree.create_menu(shell, MenuStyle::DropDown).unwrap();
        let cascade = tree.create_menu_item(menu, MenuItemStyle::Cascade).unwrap();
        assert!(tree.set_item_menu(push, Some(drop_down)).is_err());
        assert!(tree.set_item_menu(cascade, Some(menu)).is_err());
        tree.set_item_menu(cascade, Some(drop_down)).unwrap();
        assert_eq!(tree.item_index(cascade), Some(1));
    }

    #[test]
    fn test_image_value() {
        let image = Image::new("icons/open.png", 16, 16);
        assert_eq!(
            serde_json::to_value(PropertyValue::from(&image)).unwrap(),
            serde_json::json!(["icons/open.png", 16, 16])
        );
    }
}
