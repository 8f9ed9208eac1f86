//! Plugin registries for storage plugins and chat backends.
//!
//! `Plugins` bundles one typed registry per category. It is populated once at
//! process start and passed around by reference (or `Arc`) afterwards.

pub mod registry;

use std::sync::Arc;

use botframe_types::error::RegistryError;
use botframe_types::plugin::PluginCategory;

pub use registry::{PluginRegistry, PluginRegistryBuilder};

use crate::backend::ChatBackend;
use crate::storage::StoragePlugin;

/// Every registry the framework selects implementations from.
#[derive(Debug)]
pub struct Plugins {
    pub storage: PluginRegistry<dyn StoragePlugin>,
    pub backends: PluginRegistry<dyn ChatBackend>,
}

impl Plugins {
    pub fn builder() -> PluginsBuilder {
        PluginsBuilder {
            storage: PluginRegistry::builder(PluginCategory::Storage),
            backends: PluginRegistry::builder(PluginCategory::Backend),
        }
    }

    /// Storage plugin registered as `name`.
    pub fn storage(&self, name: &str) -> Result<Arc<dyn StoragePlugin>, RegistryError> {
        self.storage.get(name)
    }

    /// Chat backend registered as `name`.
    pub fn backend(&self, name: &str) -> Result<Arc<dyn ChatBackend>, RegistryError> {
        self.backends.get(name)
    }
}

/// Registration phase of [`Plugins`].
pub struct PluginsBuilder {
    pub storage: PluginRegistryBuilder<dyn StoragePlugin>,
    pub backends: PluginRegistryBuilder<dyn ChatBackend>,
}

impl PluginsBuilder {
    pub fn build(self) -> Plugins {
        Plugins {
            storage: self.storage.build(),
            backends: self.backends.build(),
        }
    }
}
