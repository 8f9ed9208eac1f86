//! Dict-like facade over one storage namespace.
//!
//! `PersistentMapping` is what plugin code holds to persist its state. It is
//! created unbound, bound exactly once with [`PersistentMapping::open_storage`],
//! and then passes every operation straight through to the backend handle.
//! There is no cache: reads always reflect what the backend holds.

use botframe_types::error::{MappingError, StorageError};
use serde_json::Value;

use super::capability::{StorageHandle, StoragePlugin};
use crate::structure::Shape;

/// Persistent key-value mapping bound to a single storage namespace.
#[derive(Default)]
pub struct PersistentMapping {
    handle: Option<Box<dyn StorageHandle>>,
}

impl PersistentMapping {
    /// Create an unbound mapping. Every operation fails with `NotBound` until
    /// [`open_storage`](Self::open_storage) succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind this mapping to `namespace` on `plugin`.
    ///
    /// Rebinding is not supported: a second call fails with `AlreadyBound`
    /// and leaves the existing binding untouched.
    pub fn open_storage(&mut self, plugin: &dyn StoragePlugin, namespace: &str) -> Result<(), StorageError> {
        if let Some(handle) = &self.handle {
            return Err(StorageError::AlreadyBound {
                namespace: handle.namespace().to_string(),
            });
        }

        tracing::debug!(storage = plugin.name(), namespace, "opening storage");
        self.handle = Some(plugin.open(namespace)?);
        Ok(())
    }

    /// Close the bound handle. The mapping is unbound afterwards.
    pub fn close_storage(&mut self) -> Result<(), StorageError> {
        let mut handle = self.handle.take().ok_or(StorageError::NotBound)?;
        tracing::debug!(namespace = handle.namespace(), "closing storage");
        handle.close()
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Namespace of the bound handle, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.handle.as_deref().map(|handle| handle.namespace())
    }

    pub fn get(&self, key: &str) -> Result<Value, StorageError> {
        self.bound()?.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), StorageError> {
        self.bound_mut()?.set(key, value.into())
    }

    pub fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.bound_mut()?.delete(key)
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        self.bound()?.contains(key)
    }

    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.bound()?.keys()
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        self.bound()?.len()
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.bound()?.is_empty()
    }

    /// Read-modify-write `key`: the closure mutates the stored value, which is
    /// then written back.
    pub fn update<F>(&mut self, key: &str, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Value),
    {
        let handle = self.bound_mut()?;
        let mut value = handle.get(key)?;
        f(&mut value);
        handle.set(key, value)
    }

    /// Read `key` and check it against `shape` before handing it out.
    pub fn get_checked(&self, key: &str, shape: &Shape) -> Result<Value, MappingError> {
        let value = self.get(key)?;
        shape.validate(&value)?;
        Ok(value)
    }

    fn bound(&self) -> Result<&dyn StorageHandle, StorageError> {
        self.handle.as_deref().ok_or(StorageError::NotBound)
    }

    fn bound_mut(&mut self) -> Result<&mut (dyn StorageHandle + 'static), StorageError> {
        self.handle.as_deref_mut().ok_or(StorageError::NotBound)
    }
}

impl Drop for PersistentMapping {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(err) = handle.close() {
                tracing::warn!(namespace = handle.namespace(), error = %err, "failed to close storage");
            }
        }
    }
}

impl std::fmt::Debug for PersistentMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentMapping")
            .field("namespace", &self.namespace())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Minimal backend sharing one map per plugin and counting closes.
    #[derive(Default)]
    struct TestStorage {
        entries: Arc<Mutex<BTreeMap<String, Value>>>,
        closes: Arc<AtomicUsize>,
    }

    struct TestHandle {
        namespace: String,
        entries: Arc<Mutex<BTreeMap<String, Value>>>,
        closes: Arc<AtomicUsize>,
        closed: bool,
    }

    impl StoragePlugin for TestStorage {
        fn name(&self) -> &str {
            "test"
        }

        fn open(&self, namespace: &str) -> Result<Box<dyn StorageHandle>, StorageError> {
            crate::storage::validate_namespace(namespace)?;
            Ok(Box::new(TestHandle {
                namespace: namespace.to_string(),
                entries: Arc::clone(&self.entries),
                closes: Arc::clone(&self.closes),
                closed: false,
            }))
        }
    }

    impl StorageHandle for TestHandle {
        fn namespace(&self) -> &str {
            &self.namespace
        }

        fn get(&self, key: &str) -> Result<Value, StorageError> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
        }

        fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        fn delete(&mut self, key: &str) -> Result<(), StorageError> {
            self.entries
                .lock()
                .unwrap()
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
        }

        fn contains(&self, key: &str) -> Result<bool, StorageError> {
            Ok(self.entries.lock().unwrap().contains_key(key))
        }

        fn keys(&self) -> Result<Vec<String>, StorageError> {
            Ok(self.entries.lock().unwrap().keys().cloned().collect())
        }

        fn len(&self) -> Result<usize, StorageError> {
            Ok(self.entries.lock().unwrap().len())
        }

        fn close(&mut self) -> Result<(), StorageError> {
            if !self.closed {
                self.closed = true;
                self.closes.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn bound(storage: &TestStorage) -> PersistentMapping {
        let mut mapping = PersistentMapping::new();
        mapping.open_storage(storage, "test").unwrap();
        mapping
    }

    #[test]
    fn test_roundtrip_non_ascii() {
        let storage = TestStorage::default();
        let mut mapping = bound(&storage);

        mapping.set("test", "à value").unwrap();
        assert_eq!(mapping.get("test").unwrap(), json!("à value"));
        assert!(mapping.contains("test").unwrap());
        assert_eq!(mapping.len().unwrap(), 1);

        mapping.delete("test").unwrap();
        assert!(!mapping.contains("test").unwrap());
        assert_eq!(mapping.len().unwrap(), 0);
        assert!(mapping.is_empty().unwrap());
    }

    #[test]
    fn test_operations_before_binding_fail() {
        let mut mapping = PersistentMapping::new();
        assert!(!mapping.is_bound());
        assert!(matches!(mapping.get("k"), Err(StorageError::NotBound)));
        assert!(matches!(mapping.set("k", 1), Err(StorageError::NotBound)));
        assert!(matches!(mapping.contains("k"), Err(StorageError::NotBound)));
        assert!(matches!(mapping.delete("k"), Err(StorageError::NotBound)));
        assert!(matches!(mapping.len(), Err(StorageError::NotBound)));
        assert!(matches!(mapping.keys(), Err(StorageError::NotBound)));
        assert!(matches!(mapping.close_storage(), Err(StorageError::NotBound)));
    }

    #[test]
    fn test_rebinding_fails_and_keeps_binding() {
        let storage = TestStorage::default();
        let mut mapping = bound(&storage);

        let err = mapping.open_storage(&storage, "other").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyBound { ref namespace } if namespace == "test"));
        assert_eq!(mapping.namespace(), Some("test"));
    }

    #[test]
    fn test_invalid_namespace_leaves_mapping_unbound() {
        let storage = TestStorage::default();
        let mut mapping = PersistentMapping::new();
        let err = mapping.open_storage(&storage, "../etc").unwrap_err();
        assert!(matches!(err, StorageError::InvalidNamespace(_)));
        assert!(!mapping.is_bound());
    }

    #[test]
    fn test_missing_key_errors() {
        let storage = TestStorage::default();
        let mut mapping = bound(&storage);
        assert!(matches!(mapping.get("nope"), Err(StorageError::KeyNotFound(ref k)) if k == "nope"));
        assert!(matches!(mapping.delete("nope"), Err(StorageError::KeyNotFound(_))));
    }

    #[test]
    fn test_no_caching_between_mappings() {
        let storage = TestStorage::default();
        let mut writer = bound(&storage);
        let reader = bound(&storage);

        writer.set("shared", json!({"n": 1})).unwrap();
        assert_eq!(reader.get("shared").unwrap(), json!({"n": 1}));

        writer.delete("shared").unwrap();
        assert!(!reader.contains("shared").unwrap());
    }

    #[test]
    fn test_update_writes_back() {
        let storage = TestStorage::default();
        let mut mapping = bound(&storage);
        mapping.set("rooms", json!(["#ops"])).unwrap();

        mapping
            .update("rooms", |rooms| {
                rooms.as_array_mut().unwrap().push(json!("#dev"));
            })
            .unwrap();

        assert_eq!(mapping.get("rooms").unwrap(), json!(["#ops", "#dev"]));
        assert!(matches!(mapping.update("missing", |_| {}), Err(StorageError::KeyNotFound(_))));
    }

    #[test]
    fn test_get_checked() {
        let storage = TestStorage::default();
        let mut mapping = bound(&storage);
        let shape = Shape::from_reference(&json!({"channel": "#general", "retries": 3}));

        mapping.set("good", json!({"channel": "#ops", "retries": 5})).unwrap();
        mapping.set("bad", json!({"channel": "#ops"})).unwrap();

        assert!(mapping.get_checked("good", &shape).is_ok());
        assert!(matches!(mapping.get_checked("bad", &shape), Err(MappingError::Invalid(_))));
        assert!(matches!(
            mapping.get_checked("absent", &shape),
            Err(MappingError::Storage(StorageError::KeyNotFound(_)))
        ));
    }

    #[test]
    fn test_keys_sorted() {
        let storage = TestStorage::default();
        let mut mapping = bound(&storage);
        mapping.set("beta", "b").unwrap();
        mapping.set("alpha", "a").unwrap();
        assert_eq!(mapping.keys().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_close_storage_unbinds() {
        let storage = TestStorage::default();
        let mut mapping = bound(&storage);

        mapping.close_storage().unwrap();
        assert!(!mapping.is_bound());
        assert_eq!(storage.closes.load(Ordering::SeqCst), 1);
        assert!(matches!(mapping.get("k"), Err(StorageError::NotBound)));

        // A closed mapping can be bound again.
        mapping.open_storage(&storage, "test").unwrap();
        assert!(mapping.is_bound());
    }

    #[test]
    fn test_drop_closes_handle() {
        let storage = TestStorage::default();
        {
            let _mapping = bound(&storage);
        }
        assert_eq!(storage.closes.load(Ordering::SeqCst), 1);
    }
}
