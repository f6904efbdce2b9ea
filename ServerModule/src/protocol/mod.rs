//! # Protocol Output
//!
//! Accumulates the operations of one render cycle and turns them into the
//! outbound [`Message`](rwt_shared::Message).

pub mod writer;

pub use writer::ProtocolWriter;
