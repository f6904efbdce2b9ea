//! # Operation Handlers
//!
//! Per-object callbacks for inbound operations. A handler receives the
//! session's world (`T`) mutably, so it can apply client data to the server
//! object it stands for.

use rwt_shared::{ObjectId, Properties};

use crate::error::SyncResult;

/// Receives inbound operations addressed to one remote object
///
/// Every method defaults to a no-op so implementors only override what their
/// object understands.
pub trait OperationHandler<T: ?Sized>: Send {
    /// Property values changed on the client
    fn handle_set(&mut self, _world: &mut T, _target: &ObjectId, _properties: &Properties) -> SyncResult<()> {
        Ok(())
    }

    /// An event the server listens for occurred on the client
    fn handle_notify(
        &mut self,
        _world: &mut T,
        _target: &ObjectId,
        _event: &str,
        _properties: &Properties,
    ) -> SyncResult<()> {
        Ok(())
    }

    /// The client invokes a method on the server object
    fn handle_call(
        &mut self,
        _world: &mut T,
        _target: &ObjectId,
        _method: &str,
        _properties: &Properties,
    ) -> SyncResult<()> {
        Ok(())
    }
}
