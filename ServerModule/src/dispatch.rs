//! # Inbound Dispatch
//!
//! Routes the operations of a [`ClientMessage`] to the handlers of their
//! target objects. All `set` entries run first, in message order; `notify`
//! and `call` entries follow, again in message order. A listener therefore
//! always sees the property values the client sent with its event.

use log::{debug, trace};
use rwt_shared::{ClientMessage, ClientOperation, ObjectId};

use crate::error::SyncResult;
use crate::remote::{OperationHandler, RemoteObjects};

/// Dispatch `message` against `world`
///
/// Operations for unknown or destroyed objects are dropped. Objects without a
/// handler are skipped. The first handler error stops dispatch and is
/// returned, leaving the cycle to be aborted by the caller.
pub fn dispatch_message<T: ?Sized>(
    objects: &mut RemoteObjects<T>,
    world: &mut T,
    message: &ClientMessage,
) -> SyncResult<()> {
    let (sets, events): (Vec<&ClientOperation>, Vec<&ClientOperation>) = message
        .operations
        .iter()
        .partition(|operation| matches!(operation, ClientOperation::Set { .. }));

    for operation in sets.into_iter().chain(events) {
        dispatch_operation(objects, world, operation)?;
    }
    Ok(())
}

fn dispatch_operation<T: ?Sized>(
    objects: &mut RemoteObjects<T>,
    world: &mut T,
    operation: &ClientOperation,
) -> SyncResult<()> {
    let target = operation.target();
    if !objects.is_live(target) {
        debug!("Ignoring inbound operation for stale object {}", target);
        return Ok(());
    }
    let Some(mut handler) = objects.take_handler(target) else {
        trace!("{} has no operation handler", target);
        return Ok(());
    };
    let result = invoke(handler.as_mut(), world, operation);
    objects.restore_handler(target, handler);
    result
}

fn invoke<T: ?Sized>(
    handler: &mut dyn OperationHandler<T>,
    world: &mut T,
    operation: &ClientOperation,
) -> SyncResult<()> {
    match operation {
        ClientOperation::Set { target, properties } => {
            trace!("set {} {:?}", target, properties.names());
            handler.handle_set(world, target, properties)
        }
        ClientOperation::Notify {
            target,
            event,
            properties,
        } => {
            trace!("notify {} {}", target, event);
            handler.handle_notify(world, target, event, properties)
        }
        ClientOperation::Call {
            target,
            method,
            properties,
        } => {
            trace!("call {} {}", target, method);
            handler.handle_call(world, target, method, properties)
        }
    }
}

/// Ids addressed by `message` that the registry does not know as live
pub fn stale_targets<T: ?Sized>(objects: &RemoteObjects<T>, message: &ClientMessage) -> Vec<ObjectId> {
    message
        .operations
        .iter()
        .map(ClientOperation::target)
        .filter(|target| !objects.is_live(target))
        .cloned()
        .collect()
}
