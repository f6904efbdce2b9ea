//! # Shell
//!
//! Top-level window. Renders as `rwt.widgets.Shell`; the client reports
//! activation and close requests back.

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
pub enum ShellStyle {
    Border,
    Title,
    /// Blocks every other shell while visible and active
    ApplicationModal,
}

impl ShellStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Border => "BORDER",
            Self::Title => "TITLE",
            Self::ApplicationModal => "APPLICATION_MODAL",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShellData {
    pub(crate) styles: Vec<ShellStyle>,
    pub(crate) text: String,
    pub(crate) visible: bool,
}

impl ShellData {
    pub fn styles(&self) -> &[ShellStyle] {
        &self.styles
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_modal(&self) -> bool {
        self.styles.contains(&ShellStyle::ApplicationModal)
    }
}

impl Accessible for ShellData {
    fn is_accessible(&self, tree: &WidgetTree, key: WidgetKey) -> bool {
        tree.is_enabled(key) && self.visible && tree.is_shell_accessible(key)
    }
}

impl WidgetTree {
    pub fn create_shell(&mut self, styles: &[ShellStyle]) -> WidgetKey {
        self.insert_root(WidgetKind::Shell(ShellData {
            styles: styles.to_vec(),
            ..ShellData::default()
        }))
    }

    pub fn shell(&self, key: WidgetKey) -> Option<&ShellData> {
        match self.kind(key)? {
            WidgetKind::Shell(shell) => Some(shell),
            _ => None,
        }
    }

    fn shell_mut(&mut self, key: WidgetKey) -> SyncResult<&mut ShellData> {
        match &mut self.live_mut(key)?.kind {
            WidgetKind::Shell(shell) => Ok(shell),
            other => Err(SyncError::invalid_argument(
                "shell",
                format!("{:?} is a {}", key, other.name()),
            )),
        }
    }

    pub fn set_visible(&mut self, key: WidgetKey, visible: bool) -> SyncResult<()> {
        self.shell_mut(key)?.visible = visible;
        if !visible && self.active_shell == Some(key) {
            self.active_shell = None;
        }
        Ok(())
    }

    /// Make a shell visible and active
    pub fn open_shell(&mut self, key: WidgetKey) -> SyncResult<()> {
        self.set_visible(key, true)?;
        self.set_active_shell(Some(key))
    }

    pub fn active_shell(&self) -> Option<WidgetKey> {
        self.active_shell
    }

    pub fn set_active_shell(&mut self, key: Option<WidgetKey>) -> SyncResult<()> {
        if let Some(key) = key {
            self.shell_mut(key)?;
        }
        self.active_shell = key;
        Ok(())
    }

    /// False if another visible modal shell is active
    pub fn is_shell_accessible(&self, shell: WidgetKey) -> bool {
        let modal = self.active_shell.filter(|active| {
            !self.is_disposed(*active)
                && self
                    .shell(*active)
                    .map_or(false, |data| data.visible && data.is_modal())
        });
        modal.map_or(true, |modal| modal == shell)
    }
}

static DEFAULTS: Lazy<Properties> = Lazy::new(|| {
    Properties::new()
        .with(props::TEXT, "")
        .with(props::ENABLED, true)
        .with(props::VISIBILITY, false)
        .with(props::ACTIVE, false)
        .with(props::CUSTOM_VARIANT, PropertyValue::Null)
});

/// Renders shells
pub struct ShellLifeCycleAdapter;

struct ShellState<'a> {
    data: &'a ShellData,
    enabled: bool,
    active: bool,
    variant: Option<&'a str>,
}

impl ShellLifeCycleAdapter {
    fn state<'a>(tree: &'a WidgetTree, key: WidgetKey) -> Option<ShellState<'a>> {
        Some(ShellState {
            data: tree.shell(key)?,
            enabled: tree.is_enabled(key),
            active: tree.active_shell() == Some(key),
            variant: tree.rendered_variant(key),
        })
    }
}

impl WidgetLifeCycleAdapter for ShellLifeCycleAdapter {
    fn type_name(&self) -> &'static str {
        types::SHELL
    }

    fn defaults(&self) -> &'static Properties {
        &DEFAULTS
    }

    fn preserve_values(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        let Some(shell) = Self::state(tree, key) else {
            return Ok(());
        };
        preserve_property(ctx, id, props::TEXT, shell.data.text());
        preserve_property(ctx, id, props::ENABLED, shell.enabled);
        preserve_property(ctx, id, props::VISIBILITY, shell.data.is_visible());
        preserve_property(ctx, id, props::ACTIVE, shell.active);
        preserve_property(ctx, id, props::CUSTOM_VARIANT, shell.variant);
        preserve_listener(ctx, id, events::CLOSE, tree.has_listener(key, EventType::Close));
        Ok(())
    }

    fn render_initialization(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        let styles: Vec<&str> = tree
            .shell(key)
            .map(|shell| shell.styles().iter().map(ShellStyle::as_str).collect())
            .unwrap_or_default();
        ctx.remote_object(id)?
            .create(Properties::new().with(props::STYLE, styles))
    }

    fn render_changes(&self, tree: &WidgetTree, key: WidgetKey, id: &ObjectId, ctx: &mut WidgetContext) -> SyncResult<()> {
        let Some(shell) = Self::state(tree, key) else {
            return Ok(());
        };
        render_property(ctx, id, self.defaults(), props::TEXT, shell.data.text())?;
        render_property(ctx, id, self.defaults(), props::ENABLED, shell.enabled)?;
        render_property(ctx, id, self.defaults(), props::VISIBILITY, shell.data.is_visible())?;
        render_property(ctx, id, self.defaults(), props::ACTIVE, shell.active)?;
        render_property(ctx, id, self.defaults(), props::CUSTOM_VARIANT, shell.variant)?;
        render_listener(ctx, id, events::CLOSE, tree.has_listener(key, EventType::Close))
    }

    fn operation_handler(&self, key: WidgetKey) -> Box<dyn OperationHandler<WidgetTree>> {
        Box::new(ShellOperationHandler { key })
    }
}

/// Applies client activation and close requests
struct ShellOperationHandler {
    key: WidgetKey,
}

impl OperationHandler<WidgetTree> for ShellOperationHandler {
    fn handle_set(&mut self, tree: &mut WidgetTree, target: &ObjectId, properties: &Properties) -> SyncResult<()> {
        if tree.is_disposed(self.key) {
            return Ok(());
        }
        if let Some(value) = properties.get(props::ACTIVE) {
            let active = value
                .as_bool()
                .ok_or_else(|| SyncError::handler(target, "active must be a boolean"))?;
            if active {
                tree.set_active_shell(Some(self.key))?;
            } else if tree.active_shell() == Some(self.key) {
                tree.set_active_shell(None)?;
            }
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
        if event != events::CLOSE {
            debug!("Shell {} ignores {} notification", target, event);
            return Ok(());
        }
        match tree.fire(self.key, EventType::Close) {
            Some(close) if close.doit => tree.dispose(self.key),
            Some(_) => {
                debug!("Close of {} vetoed", target);
                Ok(())
            }
            None => Ok(()),
        }
    }
}
