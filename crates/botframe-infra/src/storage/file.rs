//! JSON-file storage plugin.
//!
//! Each namespace is one JSON object at `{root}/{namespace}.json`. The file is
//! read the first time the namespace is opened in this process; afterwards all
//! handles share the loaded table. Every `set`/`delete` rewrites the whole
//! document through a temp file in the same directory followed by a rename,
//! so a crash never leaves a half-written file behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use botframe_core::storage::{StorageHandle, StoragePlugin, validate_namespace};
use botframe_types::error::StorageError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tempfile::NamedTempFile;

use super::{Entries, read, write};

/// Registry name of the JSON-file storage plugin.
pub const NAME: &str = "file";

#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    namespaces: DashMap<String, Arc<RwLock<Entries>>>,
}

impl FileStorage {
    /// Storage rooted at `root`. The directory is created on first open.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            namespaces: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the document backing `namespace`.
    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }
}

impl StoragePlugin for FileStorage {
    fn name(&self) -> &str {
        NAME
    }

    fn open(&self, namespace: &str) -> Result<Box<dyn StorageHandle>, StorageError> {
        validate_namespace(namespace)?;
        let path = self.path_for(namespace);

        let entries = match self.namespaces.entry(namespace.to_string()) {
            Entry::Occupied(slot) => Arc::clone(slot.get()),
            Entry::Vacant(slot) => {
                std::fs::create_dir_all(&self.root).map_err(|e| io_error(&self.root, e))?;
                let loaded = load(&path)?;
                tracing::debug!(namespace, path = %path.display(), keys = loaded.len(), "loaded file namespace");
                Arc::clone(slot.insert(Arc::new(RwLock::new(loaded))).value())
            }
        };

        Ok(Box::new(FileHandle {
            namespace: namespace.to_string(),
            path,
            entries: Some(entries),
        }))
    }
}

struct FileHandle {
    namespace: String,
    path: PathBuf,
    /// `None` once closed.
    entries: Option<Arc<RwLock<Entries>>>,
}

impl FileHandle {
    fn entries(&self) -> Result<&RwLock<Entries>, StorageError> {
        self.entries.as_deref().ok_or(StorageError::Closed)
    }
}

impl StorageHandle for FileHandle {
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
        let mut entries = write(self.entries()?);
        let previous = entries.insert(key.to_string(), value);

        if let Err(err) = persist(&self.path, &entries) {
            // Keep memory and disk in agreement.
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let mut entries = write(self.entries()?);
        let removed = entries
            .remove(key)
            .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))?;

        if let Err(err) = persist(&self.path, &entries) {
            entries.insert(key.to_string(), removed);
            return Err(err);
        }
        Ok(())
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
            tracing::debug!(namespace = %self.namespace, "closed file namespace");
        }
        Ok(())
    }
}

/// Read a namespace document. A missing file is an empty namespace.
fn load(path: &Path) -> Result<Entries, StorageError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(err) => return Err(io_error(path, err)),
    };

    serde_json::from_str(&content)
        .map_err(|e| StorageError::Serialization(format!("{}: {e}", path.display())))
}

/// Atomically replace the document at `path` with `entries`.
fn persist(path: &Path, entries: &Entries) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_vec_pretty(entries)
        .map_err(|e| StorageError::Serialization(format!("{}: {e}", path.display())))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
    tmp.write_all(&json).map_err(|e| io_error(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;

    tracing::trace!(path = %path.display(), keys = entries.len(), "namespace written");
    Ok(())
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use botframe_core::storage::PersistentMapping;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_storage_contract() {
        let tmp = TempDir::new().unwrap();
        super::super::contract::exercise(&FileStorage::new(tmp.path()));
    }

    #[test]
    fn test_values_survive_a_new_instance() {
        let tmp = TempDir::new().unwrap();

        {
            let storage = FileStorage::new(tmp.path());
            let mut mapping = PersistentMapping::new();
            mapping.open_storage(&storage, "test").unwrap();
            mapping.set("x", "à value").unwrap();
            mapping.set("count", 3).unwrap();
        }

        let storage = FileStorage::new(tmp.path());
        let handle = storage.open("test").unwrap();
        assert_eq!(handle.get("x").unwrap(), json!("à value"));
        assert_eq!(handle.get("count").unwrap(), json!(3));
        assert_eq!(handle.len().unwrap(), 2);
    }

    #[test]
    fn test_document_is_a_json_object() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());

        let mut handle = storage.open("plugin.web").unwrap();
        handle.set("port", json!(3142)).unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("plugin.web.json")).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc, json!({"port": 3142}));
    }

    #[test]
    fn test_delete_is_written_through() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());

        let mut handle = storage.open("core").unwrap();
        handle.set("a", json!(1)).unwrap();
        handle.set("b", json!(2)).unwrap();
        handle.delete("a").unwrap();

        let reopened = FileStorage::new(tmp.path()).open("core").unwrap();
        assert_eq!(reopened.keys().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_missing_root_is_created() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("nested").join("storage");
        let storage = FileStorage::new(&root);

        let mut handle = storage.open("core").unwrap();
        handle.set("k", json!(null)).unwrap();

        assert!(root.join("core.json").exists());
    }

    #[test]
    fn test_corrupt_document_fails_open() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();

        let err = FileStorage::new(tmp.path()).open("broken").err().unwrap();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_non_object_document_fails_open() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("list.json"), "[1, 2, 3]").unwrap();

        let err = FileStorage::new(tmp.path()).open("list").err().unwrap();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_path_for() {
        let storage = FileStorage::new("/var/lib/botframe/storage");
        assert_eq!(
            storage.path_for("core"),
            PathBuf::from("/var/lib/botframe/storage/core.json")
        );
        assert_eq!(storage.root(), Path::new("/var/lib/botframe/storage"));
    }
}
