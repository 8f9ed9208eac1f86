//! Application state shared by the CLI commands.
//!
//! AppState resolves the data directory, loads `config.toml` and builds the
//! plugin registry with every builtin plugin registered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use botframe_core::plugin::Plugins;
use botframe_core::storage::PersistentMapping;
use botframe_infra::builtins::builtin_plugins;
use botframe_infra::config::{load_global_config, resolve_data_dir};
use botframe_types::config::GlobalConfig;

#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: GlobalConfig,
    pub plugins: Arc<Plugins>,
}

impl AppState {
    /// Resolve the data directory, load config and register builtin plugins.
    pub async fn init(data_dir: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir(data_dir);

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;
        let plugins = builtin_plugins(&data_dir)?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            storage = %config.storage,
            backend = %config.backend,
            "application state ready"
        );

        Ok(Self {
            data_dir,
            config,
            plugins: Arc::new(plugins),
        })
    }

    /// Storage plugin name to use: `requested`, else the configured one.
    pub fn storage_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(self.config.storage.as_str())
    }

    /// Open `namespace` on the storage plugin called `storage`.
    pub fn open_mapping(&self, storage: &str, namespace: &str) -> anyhow::Result<PersistentMapping> {
        let plugin = self
            .plugins
            .storage(storage)
            .with_context(|| format!("Storage plugin '{storage}' is not available"))?;

        let mut mapping = PersistentMapping::new();
        mapping
            .open_storage(plugin.as_ref(), namespace)
            .with_context(|| format!("Failed to open namespace '{namespace}' on '{storage}'"))?;
        Ok(mapping)
    }
}
