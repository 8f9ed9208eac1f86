//! Global configuration loader for botframe.
//!
//! Reads `config.toml` from the data directory (`~/.botframe/` by default)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use botframe_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BOTFRAME_DATA_DIR";

/// Resolve the data directory.
///
/// Priority: `explicit` (the `--data-dir` flag), then `BOTFRAME_DATA_DIR`,
/// then `~/.botframe`, then `./.botframe` when no home directory is known.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".botframe");
    }

    PathBuf::from(".botframe")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`GlobalConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - Otherwise the parsed config; absent fields take their defaults.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config, GlobalConfig::default());
        assert_eq!(config.storage, "memory");
        assert_eq!(config.backend, "null");
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
storage = "file"
backend = "null"
poll_interval_ms = 250
core_namespace = "framework"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.storage, "file");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.core_namespace, "framework");
    }

    #[tokio::test]
    async fn load_global_config_partial_toml_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "storage = \"file\"\n")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.storage, "file");
        assert_eq!(config.backend, "null");
        assert_eq!(config.poll_interval_ms, 1_000);
        assert_eq!(config.core_namespace, "core");
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config, GlobalConfig::default());
    }

    #[tokio::test]
    async fn load_global_config_wrong_type_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "poll_interval_ms = \"fast\"\n")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.poll_interval_ms, 1_000);
    }

    #[test]
    fn resolve_data_dir_prefers_explicit() {
        let dir = resolve_data_dir(Some(Path::new("/srv/bot")));
        assert_eq!(dir, PathBuf::from("/srv/bot"));
    }
}
