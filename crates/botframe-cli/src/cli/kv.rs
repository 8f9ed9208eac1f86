//! Key-value CLI subcommands over a persistent mapping.
//!
//! Provides set, get, delete, list and check operations on one storage
//! namespace. Values support arbitrary JSON (objects, arrays, strings,
//! numbers, etc.).

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::Value;

use botframe_core::storage::PersistentMapping;
use botframe_core::structure::Shape;
use botframe_types::error::{MappingError, StorageError};

use crate::state::AppState;

/// Widest value rendered in `kv list`.
const PREVIEW_WIDTH: usize = 60;

/// Which namespace a subcommand operates on.
#[derive(Args, Debug, Clone, Default)]
pub struct KvTarget {
    /// Storage namespace (defaults to the framework's core namespace).
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Storage plugin (defaults to `storage` in config.toml).
    #[arg(long)]
    pub storage: Option<String>,
}

/// Key-value subcommands.
#[derive(Subcommand)]
pub enum KvCommand {
    /// Set a key-value pair (value is JSON).
    Set {
        /// Key name.
        key: String,

        /// JSON value (string, number, object, array, boolean, null).
        value: String,

        #[command(flatten)]
        target: KvTarget,
    },

    /// Get a value by key.
    Get {
        /// Key name.
        key: String,

        #[command(flatten)]
        target: KvTarget,
    },

    /// Delete a key-value pair.
    Delete {
        /// Key name.
        key: String,

        #[command(flatten)]
        target: KvTarget,
    },

    /// List all keys in a namespace.
    List {
        #[command(flatten)]
        target: KvTarget,
    },

    /// Check that a stored value has the same structure as a JSON reference.
    Check {
        /// Key name.
        key: String,

        /// Reference JSON document the stored value must match.
        reference: String,

        #[command(flatten)]
        target: KvTarget,
    },
}

/// Handle a KV subcommand.
pub fn handle_kv_command(cmd: KvCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        KvCommand::Set { key, value, target } => {
            let (mut mapping, ns) = open(state, &target)?;
            kv_set(&mut mapping, &ns, &key, &value, json)
        }
        KvCommand::Get { key, target } => {
            let (mapping, ns) = open(state, &target)?;
            kv_get(&mapping, &ns, &key, json)
        }
        KvCommand::Delete { key, target } => {
            let (mut mapping, ns) = open(state, &target)?;
            kv_delete(&mut mapping, &ns, &key, json)
        }
        KvCommand::List { target } => {
            let (mapping, ns) = open(state, &target)?;
            kv_list(&mapping, &ns, json)
        }
        KvCommand::Check {
            key,
            reference,
            target,
        } => {
            let (mapping, ns) = open(state, &target)?;
            kv_check(&mapping, &ns, &key, &reference, json)
        }
    }
}

fn open(state: &AppState, target: &KvTarget) -> Result<(PersistentMapping, String)> {
    let namespace = target
        .namespace
        .clone()
        .unwrap_or_else(|| state.config.core_namespace.clone());
    let storage = state.storage_name(target.storage.as_deref());

    let mapping = state.open_mapping(storage, &namespace)?;
    Ok((mapping, namespace))
}

/// Parse as JSON, falling back to a JSON string.
///
/// `botframe kv set name Alice` stores the string `"Alice"`, while
/// `botframe kv set config '{"theme":"dark"}'` stores the parsed object.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Single-line rendering of `value`, truncated on a character boundary.
fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > PREVIEW_WIDTH {
        let head: String = text.chars().take(PREVIEW_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        text
    }
}

fn kv_set(mapping: &mut PersistentMapping, ns: &str, key: &str, raw: &str, json: bool) -> Result<()> {
    let value = parse_value(raw);
    mapping
        .set(key, value.clone())
        .with_context(|| format!("Failed to set '{key}' in '{ns}'"))?;

    if json {
        let result = serde_json::json!({
            "key": key,
            "value": value,
            "namespace": ns,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Set '{}' in '{}'",
            style("ok").green(),
            style(key).cyan(),
            style(ns).cyan(),
        );
        println!();
    }

    Ok(())
}

fn kv_get(mapping: &PersistentMapping, ns: &str, key: &str, json: bool) -> Result<()> {
    let value = match mapping.get(key) {
        Ok(value) => Some(value),
        Err(StorageError::KeyNotFound(_)) => None,
        Err(err) => return Err(err).with_context(|| format!("Failed to read '{key}' from '{ns}'")),
    };

    if json {
        let result = serde_json::json!({
            "key": key,
            "value": value,
            "namespace": ns,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    match value {
        Some(val) => println!(
            "  {} = {}",
            style(key).cyan().bold(),
            style(serde_json::to_string_pretty(&val)?).white(),
        ),
        None => println!(
            "  {} Key '{}' not found in '{}'",
            style("i").blue().bold(),
            style(key).cyan(),
            style(ns).cyan(),
        ),
    }
    println!();

    Ok(())
}

fn kv_delete(mapping: &mut PersistentMapping, ns: &str, key: &str, json: bool) -> Result<()> {
    mapping
        .delete(key)
        .with_context(|| format!("Failed to delete '{key}' from '{ns}'"))?;

    if json {
        let result = serde_json::json!({
            "deleted": key,
            "namespace": ns,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Deleted key '{}' from '{}'",
            style("ok").green(),
            style(key).cyan(),
            style(ns).cyan(),
        );
        println!();
    }

    Ok(())
}

fn kv_list(mapping: &PersistentMapping, ns: &str, json: bool) -> Result<()> {
    let keys = mapping.keys()?;

    if json {
        let result = serde_json::json!({
            "keys": keys,
            "count": keys.len(),
            "namespace": ns,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if keys.is_empty() {
        println!();
        println!(
            "  {} No key-value pairs in '{}'.",
            style("i").blue().bold(),
            style(ns).cyan(),
        );
        println!("     Set one with: botframe kv set <key> <json-value> --namespace {ns}");
        println!();
        return Ok(());
    }

    println!();
    println!("  Keys in '{}' ({} entries)", style(ns).cyan(), keys.len());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Value Preview").fg(Color::White),
    ]);

    for key in &keys {
        let value_preview = match mapping.get(key) {
            Ok(val) => preview(&val),
            Err(_) => "(error)".to_string(),
        };

        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(&value_preview).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();

    Ok(())
}

fn kv_check(mapping: &PersistentMapping, ns: &str, key: &str, reference: &str, json: bool) -> Result<()> {
    let reference: Value =
        serde_json::from_str(reference).context("Reference must be a JSON document")?;
    let shape = Shape::from_reference(&reference);

    let mismatch = match mapping.get_checked(key, &shape) {
        Ok(_) => None,
        Err(MappingError::Invalid(err)) => Some(err),
        Err(MappingError::Storage(err)) => {
            return Err(err).with_context(|| format!("Failed to read '{key}' from '{ns}'"));
        }
    };

    if json {
        let result = serde_json::json!({
            "key": key,
            "namespace": ns,
            "valid": mismatch.is_none(),
            "error": mismatch.as_ref().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        match &mismatch {
            None => println!(
                "  {} '{}' matches the reference structure",
                style("ok").green(),
                style(key).cyan(),
            ),
            Some(err) => println!("  {} {}", style("✗").red(), err),
        }
        println!();
    }

    match mismatch {
        None => Ok(()),
        Some(err) => Err(err).with_context(|| format!("'{key}' in '{ns}' does not match")),
    }
}
