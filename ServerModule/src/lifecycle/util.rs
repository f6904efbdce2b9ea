//! # Rendering Helpers
//!
//! Diffing primitives shared by every life-cycle adapter. They work on any
//! protocol context, so objects that are not widgets can use them as well.

use rwt_shared::{ObjectId, Properties, PropertyValue};

use crate::context::ProtocolContext;
use crate::error::SyncResult;

static NULL: PropertyValue = PropertyValue::Null;

/// Default of `name` in a defaults table; unknown names default to null
pub fn default_value<'a>(defaults: &'a Properties, name: &str) -> &'a PropertyValue {
    defaults.get(name).unwrap_or(&NULL)
}

pub fn preserve_property<T: ?Sized>(
    ctx: &mut ProtocolContext<T>,
    id: &ObjectId,
    name: &str,
    value: impl Into<PropertyValue>,
) {
    ctx.preserved_mut().preserve(id, name, value);
}

/// Whether `current` has to be sent
///
/// Objects the client has not seen yet compare against their default;
/// initialized objects compare against the baseline of this cycle, and a
/// missing baseline counts as a change.
pub fn has_changed<T: ?Sized>(
    ctx: &ProtocolContext<T>,
    id: &ObjectId,
    name: &str,
    current: &PropertyValue,
    default: &PropertyValue,
) -> bool {
    if !ctx.is_initialized(id) {
        return current != default;
    }
    ctx.preserved()
        .get_preserved(id, name)
        .map_or(true, |preserved| preserved != current)
}

/// Emit a Set for `name` if its value changed
pub fn render_property<T: ?Sized>(
    ctx: &mut ProtocolContext<T>,
    id: &ObjectId,
    defaults: &Properties,
    name: &str,
    current: impl Into<PropertyValue>,
) -> SyncResult<()> {
    let current = current.into();
    if has_changed(ctx, id, name, &current, default_value(defaults, name)) {
        ctx.remote_object(id)?.set(name, current)?;
    }
    Ok(())
}

pub fn preserve_listener<T: ?Sized>(ctx: &mut ProtocolContext<T>, id: &ObjectId, event_type: &str, listening: bool) {
    ctx.preserved_mut().preserve_listener(id, event_type, listening);
}

/// Emit a Listen for `event_type` on a real transition
///
/// Listening is off by default, so a new object only announces the events it
/// listens for.
pub fn render_listener<T: ?Sized>(
    ctx: &mut ProtocolContext<T>,
    id: &ObjectId,
    event_type: &str,
    listening: bool,
) -> SyncResult<()> {
    let changed = if ctx.is_initialized(id) {
        ctx.preserved()
            .get_preserved_listener(id, event_type)
            .map_or(true, |preserved| preserved != listening)
    } else {
        listening
    };
    if changed {
        ctx.remote_object(id)?.listen(event_type, listening)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use rwt_shared::OperationKind;

    fn initialized() -> (ProtocolContext<()>, ObjectId) {
        let mut ctx = ProtocolContext::new(SyncConfig::default()).unwrap();
        ctx.begin_cycle();
        let id = ctx.create_remote_object("rwt.Test", None).unwrap();
        ctx.flush().unwrap();
        ctx.commit();
        ctx.begin_cycle();
        (ctx, id)
    }

    #[test]
    fn test_unchanged_value_is_not_rendered() {
        let (mut ctx, id) = initialized();
        let defaults = Properties::new().with("text", "");
        preserve_property(&mut ctx, &id, "text", "abc");
        render_property(&mut ctx, &id, &defaults, "text", "abc").unwrap();
        assert!(ctx.writer().is_empty());
        render_property(&mut ctx, &id, &defaults, "text", "xyz").unwrap();
        let message = ctx.flush().unwrap();
        assert_eq!(message.find_set_property(&id, "text"), Some(&PropertyValue::from("xyz")));
    }

    #[test]
    fn test_missing_baseline_counts_as_change() {
        let (mut ctx, id) = initialized();
        render_property(&mut ctx, &id, &Properties::new(), "text", "").unwrap();
        assert_eq!(ctx.flush().unwrap().count_kind(&id, OperationKind::Set), 1);
    }

    #[test]
    fn test_new_object_compares_against_default() {
        let mut ctx: ProtocolContext<()> = ProtocolContext::new(SyncConfig::default()).unwrap();
        ctx.begin_cycle();
        let id = ctx.create_remote_object("rwt.Test", None).unwrap();
        let defaults = Properties::new().with("enabled", true);
        render_property(&mut ctx, &id, &defaults, "enabled", true).unwrap();
        render_property(&mut ctx, &id, &defaults, "image", PropertyValue::Null).unwrap();
        render_listener(&mut ctx, &id, "Selection", false).unwrap();
        render_listener(&mut ctx, &id, "Help", true).unwrap();
        let message = ctx.flush().unwrap();
        assert_eq!(message.len(), 2);
        assert!(message.find_create_property(&id, "enabled").is_none());
        assert_eq!(message.find_listen_property(&id, "Help"), Some(true));
        assert_eq!(message.find_listen_property(&id, "Selection"), None);
    }

    #[test]
    fn test_listener_renders_only_transitions() {
        let (mut ctx, id) = initialized();
        preserve_listener(&mut ctx, &id, "Selection", true);
        render_listener(&mut ctx, &id, "Selection", true).unwrap();
        assert!(ctx.writer().is_empty());
        render_listener(&mut ctx, &id, "Selection", false).unwrap();
        assert_eq!(ctx.flush().unwrap().find_listen_property(&id, "Selection"), Some(false));
    }
}
