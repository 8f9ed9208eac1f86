//! Storage abstractions for botframe.
//!
//! Defines the storage plugin contract and the `PersistentMapping` facade that
//! plugin code uses to persist state. Implementations live in botframe-infra.

pub mod capability;
pub mod mapping;

pub use capability::{StorageHandle, StoragePlugin, validate_namespace};
pub use mapping::PersistentMapping;
