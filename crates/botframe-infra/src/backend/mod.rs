//! Chat backend implementations.

pub mod null;

pub use null::{NullBackend, NullTransport};
