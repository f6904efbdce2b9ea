//! # Remote Widget Synchronization Server
//!
//! Keeps a server-side widget tree and its client mirror in step. Every
//! request runs one render cycle: inbound client data is applied through
//! operation handlers, then each widget's renderer compares its current
//! state against the values preserved at the start of the cycle and appends
//! the minimal set of operations to one outbound message.
//!
//! The crate is organized into several sub-modules:
//! - `identity`: session-unique object ids
//! - `preserve`: the per-cycle baseline store
//! - `protocol`: the coalescing operation buffer
//! - `remote`: remote object handles and operation handlers
//! - `context`: per-session protocol state and cycle boundaries
//! - `dispatch`: routing of inbound operations
//! - `lifecycle`: the renderer contract and the tree walk
//! - `widgets`: the shipped shell, menu and menu item widgets
//! - `session`: sessions and the session store

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod preserve;
pub mod protocol;
pub mod remote;
pub mod session;
pub mod widgets;

// Re-export commonly used items
pub use config::{IdScheme, SyncConfig};
pub use context::ProtocolContext;
pub use error::{SyncError, SyncResult};
pub use lifecycle::{WidgetContext, WidgetLifeCycleAdapter};
pub use remote::{OperationHandler, Phase, RemoteObject, RemoteObjects};
pub use session::{SessionStore, UiSession};
pub use widgets::{
    Event, EventType, Image, MenuItemStyle, MenuStyle, ShellStyle, WidgetKey, WidgetTree,
};

pub use rwt_shared::{ClientMessage, Message, ObjectId, Operation, Properties, PropertyValue};
