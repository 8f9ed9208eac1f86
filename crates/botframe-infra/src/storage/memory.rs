//! In-process storage plugin.
//!
//! Namespaces live in a `DashMap` owned by the plugin instance. The registry
//! hands out a single instance per process, so every caller resolving
//! `memory` shares the same namespaces. Nothing survives the process.

use std::sync::{Arc, RwLock};

use botframe_core::storage::{StorageHandle, StoragePlugin, validate_namespace};
use botframe_types::error::StorageError;
use dashmap::DashMap;
use serde_json::Value;

use super::{Entries, read, write};

/// Registry name of the in-process storage plugin.
pub const NAME: &str = "memory";

#[derive(Debug, Default)]
pub struct MemoryStorage {
    namespaces: DashMap<String, Arc<RwLock<Entries>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePlugin for MemoryStorage {
    fn name(&self) -> &str {
        NAME
    }

    fn open(&self, namespace: &str) -> Result<Box<dyn StorageHandle>, StorageError> {
        validate_namespace(namespace)?;

        let entries = Arc::clone(self.namespaces.entry(namespace.to_string()).or_default().value());
        tracing::debug!(namespace, "opened memory namespace");

        Ok(Box::new(MemoryHandle {
            namespace: namespace.to_string(),
            entries: Some(entries),
        }))
    }
}

struct MemoryHandle {
    namespace: String,
    /// `None` once closed.
    entries: Option<Arc<RwLock<Entries>>>,
}

impl MemoryHandle {
    fn entries(&self) -> Result<&RwLock<Entries>, StorageError> {
        self.entries.as_deref().ok_or(StorageError::Closed)
    }
}

impl StorageHandle for MemoryHandle {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Result<Value, StorageError> {
        read(self.entries()?)
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        write(self.entries()?).insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        write(self.entries()?)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
    }

    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(read(self.entries()?).contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(read(self.entries()?).keys().cloned().collect())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(read(self.entries()?).len())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if self.entries.take().is_some() {
            tracing::debug!(namespace = %self.namespace, "closed memory namespace");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botframe_core::storage::PersistentMapping;
    use serde_json::json;

    #[test]
    fn test_storage_contract() {
        super::super::contract::exercise(&MemoryStorage::new());
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let storage = MemoryStorage::new();
        let mut mapping = PersistentMapping::new();
        mapping.open_storage(&storage, "test").unwrap();

        mapping.set("x", "à value").unwrap();
        assert_eq!(mapping.get("x").unwrap(), json!("à value"));
        assert!(mapping.contains("x").unwrap());
        assert_eq!(mapping.len().unwrap(), 1);

        mapping.delete("x").unwrap();
        assert!(!mapping.contains("x").unwrap());
        assert_eq!(mapping.len().unwrap(), 0);
    }

    #[test]
    fn test_data_outlives_handles() {
        let storage = MemoryStorage::new();

        let mut first = storage.open("core").unwrap();
        first.set("started", json!(1)).unwrap();
        first.close().unwrap();

        let second = storage.open("core").unwrap();
        assert_eq!(second.get("started").unwrap(), json!(1));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let storage = MemoryStorage::new();

        let mut a = storage.open("a").unwrap();
        a.set("k", json!("in a")).unwrap();

        let b = storage.open("b").unwrap();
        assert!(!b.contains("k").unwrap());
        assert!(b.is_empty().unwrap());
    }

    #[test]
    fn test_separate_instances_do_not_share() {
        let mut handle = MemoryStorage::new().open("core").unwrap();
        handle.set("k", json!(true)).unwrap();

        let fresh = MemoryStorage::new().open("core").unwrap();
        assert!(fresh.is_empty().unwrap());
    }
}
