//! Tracing subscriber initialization with structured logging.
//!
//! # Usage
//!
//! ```no_run
//! use botframe_observe::tracing_setup::{LogFormat, init_tracing, verbosity_filter};
//!
//! init_tracing(LogFormat::Pretty, verbosity_filter(1, false)).unwrap();
//! ```

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output format of the `fmt` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines for terminals.
    #[default]
    Pretty,
    /// One JSON object per event, for log collectors.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Default filter directive for a `-v` count and `--quiet` flag.
pub fn verbosity_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,botframe=debug",
        _ => "trace",
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG`, when set and valid, takes precedence over `default_filter`.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init_tracing(format: LogFormat, default_filter: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = resolve_filter(default_filter);

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false),
            )
            .try_init()?,
    }

    Ok(())
}

fn resolve_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(verbosity_filter(0, true), "error");
        assert_eq!(verbosity_filter(0, false), "warn");
        assert_eq!(verbosity_filter(1, true), "info,botframe=debug");
        assert_eq!(verbosity_filter(3, false), "trace");
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_tracing(LogFormat::Pretty, "warn");
        assert!(init_tracing(LogFormat::Json, "warn").is_err());
    }
}
