//! CLI command definitions for the `botframe` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod kv;
pub mod serve;
pub mod version;

use std::path::PathBuf;

use botframe_observe::tracing_setup::LogFormat;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run and inspect a botframe bot.
#[derive(Parser)]
#[command(name = "botframe", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding config.toml and file storage.
    #[arg(long, global = true, env = "BOTFRAME_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format (pretty or json).
    #[arg(long, global = true, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect the configured backend and serve until Ctrl+C.
    Serve {
        /// Chat backend to serve (defaults to `backend` in config.toml).
        #[arg(long)]
        backend: Option<String>,

        /// Storage plugin for framework state (defaults to `storage` in config.toml).
        #[arg(long)]
        storage: Option<String>,
    },

    /// Inspect and edit persisted plugin state (set, get, delete, list).
    Kv {
        #[command(subcommand)]
        action: kv::KvCommand,
    },

    /// Framework version and compatibility checks.
    Version {
        #[command(subcommand)]
        action: version::VersionCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
