use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// The kind of implementation a plugin name resolves to.
///
/// Plugin names are unique within a category, so `("storage", "memory")` and
/// `("backend", "memory")` could coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginCategory {
    /// Key-value storage backends.
    Storage,
    /// Chat service backends driven by a connection lifecycle.
    Backend,
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginCategory::Storage => write!(f, "storage"),
            PluginCategory::Backend => write!(f, "backend"),
        }
    }
}

impl FromStr for PluginCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "storage" => Ok(PluginCategory::Storage),
            "backend" => Ok(PluginCategory::Backend),
            other => Err(format!("invalid plugin category: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_roundtrip() {
        for category in [PluginCategory::Storage, PluginCategory::Backend] {
            let parsed: PluginCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_from_str_case_insensitive() {
        assert_eq!(
            "Storage".parse::<PluginCategory>().unwrap(),
            PluginCategory::Storage
        );
        assert!("database".parse::<PluginCategory>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&PluginCategory::Backend).unwrap();
        assert_eq!(json, "\"backend\"");
    }
}
