//! Lifecycle notifications for the owning framework.
//!
//! Provides an `EventBus` that distributes `LifecycleEvent` messages to all
//! subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::EventBus;
