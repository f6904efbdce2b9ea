//! # Remote Widget Client Mirror
//!
//! A headless client for the synchronization protocol. It applies server
//! messages to mirrored objects (one adapter per wire type decides which
//! properties, events and methods a type understands) and reports user
//! input back with the echoed request counter.
//!
//! - `adapter`: per-type property order, listeners and methods
//! - `object`: state of one mirrored object
//! - `mirror`: message application and the outbound queue

pub mod adapter;
pub mod error;
pub mod mirror;
pub mod object;

pub use adapter::{AdapterRegistry, TypeAdapter};
pub use error::{ClientError, ClientResult};
pub use mirror::ClientMirror;
pub use object::{ClientObject, RecordedCall};
