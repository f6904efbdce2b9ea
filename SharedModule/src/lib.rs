//! # SharedModule
//!
//! Wire vocabulary shared by the server synchronization core and the client
//! mirror: object identifiers, property values, operations and the messages
//! that carry them across the request/response boundary.

// Export module structure
pub mod constants;
pub mod error;
pub mod message;
pub mod object;
pub mod operation;
pub mod property;

// Re-export commonly used items for convenience
pub use error::{WireError, WireResult};
pub use message::{ClientMessage, ClientOperation, Message, MessageHead};
pub use object::ObjectId;
pub use operation::{Operation, OperationKind};
pub use property::{Properties, PropertyValue};
