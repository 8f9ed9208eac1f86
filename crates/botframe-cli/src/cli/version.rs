//! Version subcommands.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;

use botframe_core::version::{Version, check_compatibility, framework_version};

#[derive(Subcommand)]
pub enum VersionCommand {
    /// Print the framework version.
    Show,

    /// Check VERSION against inclusive bounds, as plugin metadata declares them.
    Check {
        /// Version under test (e.g. 6.1.0-rc2).
        #[arg(value_name = "VERSION")]
        candidate: String,

        /// Lowest supported version.
        #[arg(long)]
        min: Option<String>,

        /// Highest supported version.
        #[arg(long)]
        max: Option<String>,
    },
}

pub fn handle_version_command(cmd: VersionCommand, json: bool) -> Result<()> {
    match cmd {
        VersionCommand::Show => show(json),
        VersionCommand::Check {
            candidate,
            min,
            max,
        } => check(&candidate, min.as_deref(), max.as_deref(), json),
    }
}

fn show(json: bool) -> Result<()> {
    let version = framework_version().context("Framework version is malformed")?;

    if json {
        let result = serde_json::json!({
            "version": version,
            "prerelease": version.is_prerelease(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("botframe {}", style(&version).cyan());
    }
    Ok(())
}

fn check(raw: &str, min: Option<&str>, max: Option<&str>, json: bool) -> Result<()> {
    let version: Version = raw
        .parse()
        .with_context(|| format!("'{raw}' is not a valid version"))?;
    let outcome = check_compatibility(&version, min, max);

    if json {
        let result = serde_json::json!({
            "version": version,
            "min": min,
            "max": max,
            "compatible": outcome.is_ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &outcome {
            Ok(()) => println!("  {} {} is compatible", style("ok").green(), style(&version).cyan()),
            Err(err) => println!("  {} {}", style("✗").red(), err),
        }
    }

    outcome.context("Version check failed")
}
