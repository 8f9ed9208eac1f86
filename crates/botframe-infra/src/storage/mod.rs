//! Storage plugin implementations.
//!
//! Both backends keep one shared entry table per namespace, so every handle
//! opened on the same namespace of the same plugin instance observes the
//! same data.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Contents of one namespace, ordered by key.
pub(crate) type Entries = BTreeMap<String, Value>;

pub(crate) fn read(entries: &RwLock<Entries>) -> RwLockReadGuard<'_, Entries> {
    entries.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(entries: &RwLock<Entries>) -> RwLockWriteGuard<'_, Entries> {
    entries.write().unwrap_or_else(PoisonError::into_inner)
}
