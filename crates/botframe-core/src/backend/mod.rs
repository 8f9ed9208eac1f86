//! Chat backend contract and the connection lifecycle that drives it.

pub mod chat;
pub mod lifecycle;

pub use chat::{ChatBackend, Transport, send_split};
pub use lifecycle::ConnectionLifecycle;
