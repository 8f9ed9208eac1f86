//! Global configuration types for botframe.
//!
//! `GlobalConfig` represents the top-level `config.toml` that selects the
//! storage plugin and chat backend and tunes the connection lifecycle.

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Top-level configuration for a botframe process.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Name of the storage plugin to persist state with.
    #[serde(default = "default_storage")]
    pub storage: String,

    /// Name of the chat backend to serve.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// How often the serve loop checks its running flag, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Storage namespace used by the framework itself.
    #[serde(default = "default_core_namespace")]
    pub core_namespace: String,
}

fn default_storage() -> String {
    "memory".to_string()
}

fn default_backend() -> String {
    "null".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_core_namespace() -> String {
    "core".to_string()
}

impl GlobalConfig {
    /// Poll cadence of the serve loop.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            backend: default_backend(),
            poll_interval_ms: default_poll_interval_ms(),
            core_namespace: default_core_namespace(),
        }
    }
}
