//! Name-indexed plugin registry with lazily-built singletons.
//!
//! Factories are registered once at startup through a
//! [`PluginRegistryBuilder`]; the built registry is immutable. The first
//! `get` for a name runs its factory, every later `get` returns the same
//! `Arc`. Concurrent first lookups are serialized per entry by a `OnceLock`,
//! so a factory runs at most once.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use botframe_types::error::RegistryError;
use botframe_types::plugin::PluginCategory;

struct PluginSlot<T: ?Sized> {
    /// Called at most once, by the first lookup.
    factory: Box<dyn Fn() -> Arc<T> + Send + Sync>,
    instance: OnceLock<Arc<T>>,
}

/// Registry of the plugins in one category, indexed by name.
pub struct PluginRegistry<T: ?Sized> {
    category: PluginCategory,
    slots: BTreeMap<String, PluginSlot<T>>,
}

impl<T: ?Sized> PluginRegistry<T> {
    /// Start registering plugins for `category`.
    pub fn builder(category: PluginCategory) -> PluginRegistryBuilder<T> {
        PluginRegistryBuilder {
            category,
            slots: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> PluginCategory {
        self.category
    }

    /// Look up `name`, building its instance on first use.
    pub fn get(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        let slot = self.slots.get(name).ok_or_else(|| RegistryError::NotFound {
            category: self.category,
            name: name.to_string(),
        })?;

        let instance = slot.instance.get_or_init(|| {
            tracing::info!(category = %self.category, plugin = name, "instantiating plugin");
            (slot.factory)()
        });
        tracing::debug!(category = %self.category, plugin = name, "plugin lookup");
        Ok(Arc::clone(instance))
    }

    /// Whether a factory is registered under `name`. Does not instantiate.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.slots.keys().map(|s| s.as_str()).collect()
    }
}

impl<T: ?Sized> std::fmt::Debug for PluginRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("category", &self.category)
            .field("names", &self.names())
            .finish()
    }
}

/// Collects factories for one category before the registry is frozen.
pub struct PluginRegistryBuilder<T: ?Sized> {
    category: PluginCategory,
    slots: BTreeMap<String, PluginSlot<T>>,
}

impl<T: ?Sized> PluginRegistryBuilder<T> {
    /// Register `factory` under `name`.
    ///
    /// Names are unique within a category; registering a name twice fails
    /// with `RegistryError::Duplicate`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.slots.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                category: self.category,
                name,
            });
        }

        tracing::debug!(category = %self.category, plugin = %name, "registering plugin");
        self.slots.insert(
            name,
            PluginSlot {
                factory: Box::new(factory),
                instance: OnceLock::new(),
            },
        );
        Ok(self)
    }

    /// Freeze the table.
    pub fn build(self) -> PluginRegistry<T> {
        PluginRegistry {
            category: self.category,
            slots: self.slots,
        }
    }
}
