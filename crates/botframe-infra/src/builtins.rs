//! Registration of the plugins shipped with botframe.

use std::path::Path;
use std::sync::Arc;

use botframe_core::backend::ChatBackend;
use botframe_core::plugin::{Plugins, PluginsBuilder};
use botframe_core::storage::StoragePlugin;
use botframe_types::error::RegistryError;

use crate::backend::{NullBackend, null};
use crate::storage::{FileStorage, MemoryStorage, file, memory};

/// Directory under the data dir holding the `file` backend's documents.
pub const FILE_STORAGE_DIR: &str = "storage";

/// Register storage `memory`, storage `file` and backend `null`.
///
/// The `file` backend keeps its documents in `{data_dir}/storage/`.
pub fn register_builtins(builder: &mut PluginsBuilder, data_dir: &Path) -> Result<(), RegistryError> {
    let file_root = data_dir.join(FILE_STORAGE_DIR);

    builder
        .storage
        .register(memory::NAME, || Arc::new(MemoryStorage::new()) as Arc<dyn StoragePlugin>)?
        .register(file::NAME, move || {
            Arc::new(FileStorage::new(file_root.clone())) as Arc<dyn StoragePlugin>
        })?;

    builder
        .backends
        .register(null::MODE, || Arc::new(NullBackend) as Arc<dyn ChatBackend>)?;

    Ok(())
}

/// Registry holding only the builtin plugins.
pub fn builtin_plugins(data_dir: &Path) -> Result<Plugins, RegistryError> {
    let mut builder = Plugins::builder();
    register_builtins(&mut builder, data_dir)?;
    Ok(builder.build())
}
