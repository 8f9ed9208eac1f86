//! Storage plugin contract.
//!
//! A storage plugin opens namespaces; each open namespace is a
//! [`StorageHandle`] owned by exactly one caller until it is closed.
//! Values are JSON and must round-trip exactly, including non-ASCII text.

use botframe_types::error::StorageError;
use serde_json::Value;

/// A storage backend selectable by name from the plugin registry.
pub trait StoragePlugin: Send + Sync {
    /// Registry name of this backend (`memory`, `file`, ...).
    fn name(&self) -> &str;

    /// Open `namespace`, creating it if needed.
    ///
    /// Opening the same namespace twice within one process observes the same
    /// data. Fails with `InvalidNamespace` for names rejected by
    /// [`validate_namespace`].
    fn open(&self, namespace: &str) -> Result<Box<dyn StorageHandle>, StorageError>;
}

/// An open namespace.
///
/// All operations fail with `StorageError::Closed` after [`close`](Self::close).
pub trait StorageHandle: Send {
    /// The namespace this handle was opened on.
    fn namespace(&self) -> &str;

    /// Fails with `KeyNotFound` if `key` is absent.
    fn get(&self, key: &str) -> Result<Value, StorageError>;

    /// Insert or overwrite `key`.
    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Fails with `KeyNotFound` if `key` is absent.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;

    fn contains(&self, key: &str) -> Result<bool, StorageError>;

    /// All keys, ascending.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    fn len(&self) -> Result<usize, StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Release backend resources. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), StorageError>;
}

/// Check that `namespace` is usable as a storage namespace.
///
/// Accepted: non-empty ASCII alphanumerics plus `-`, `_` and `.`, not starting
/// with `.`. Backends may map namespaces onto file names, so anything that
/// could escape a directory is rejected.
pub fn validate_namespace(namespace: &str) -> Result<(), StorageError> {
    let valid_chars = namespace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if namespace.is_empty() || !valid_chars || namespace.starts_with('.') {
        return Err(StorageError::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}
