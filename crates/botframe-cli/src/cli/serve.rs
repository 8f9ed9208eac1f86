//! `botframe serve`: run a chat backend until interrupted.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;
use tokio::sync::broadcast;

use botframe_core::backend::ConnectionLifecycle;
use botframe_core::event::EventBus;
use botframe_core::text::format_timedelta;
use botframe_core::version::framework_version;
use botframe_types::lifecycle::LifecycleEvent;

use crate::state::AppState;

/// Keys the framework records in its core namespace.
pub const LAST_STARTED_KEY: &str = "last_started_at";
pub const LAST_STOPPED_KEY: &str = "last_stopped_at";
pub const FRAMEWORK_VERSION_KEY: &str = "framework_version";

pub async fn serve(
    state: &AppState,
    backend: Option<String>,
    storage: Option<String>,
    json: bool,
) -> Result<()> {
    let backend_name = backend.unwrap_or_else(|| state.config.backend.clone());
    let storage_name = state.storage_name(storage.as_deref());

    let backend = state
        .plugins
        .backend(&backend_name)
        .with_context(|| format!("Chat backend '{backend_name}' is not available"))?;

    let mut core = state.open_mapping(storage_name, &state.config.core_namespace)?;
    let version = framework_version().context("Framework version is malformed")?;
    core.set(LAST_STARTED_KEY, chrono::Utc::now().to_rfc3339())?;
    core.set(FRAMEWORK_VERSION_KEY, version.to_string())?;

    let events = EventBus::default();
    let reporter = tokio::spawn(report_events(events.subscribe(), json));

    let lifecycle = Arc::new(
        ConnectionLifecycle::new(backend, events).with_poll_interval(state.config.poll_interval()),
    );

    let interrupt = lifecycle.interrupt_token();
    let signals = tokio::spawn(async move {
        shutdown_signal().await;
        interrupt.cancel();
    });

    if !json {
        println!(
            "  {} botframe {} serving backend {} (storage {})",
            style("⚡").bold(),
            version,
            style(&backend_name).cyan(),
            style(storage_name).cyan(),
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    let started = Instant::now();
    let outcome = lifecycle.serve_forever().await;
    signals.abort();
    let uptime = format_timedelta(started.elapsed());
    tracing::info!(backend = %backend_name, uptime = %uptime, "serving finished");

    // Dropping the last bus sender lets the reporter drain and finish.
    drop(lifecycle);
    if let Err(err) = reporter.await {
        tracing::warn!("event reporter ended abnormally: {err}");
    }

    core.set(LAST_STOPPED_KEY, chrono::Utc::now().to_rfc3339())?;
    core.close_storage()?;

    outcome.with_context(|| format!("Backend '{backend_name}' stopped with an error"))?;

    if !json {
        println!("\n  Backend stopped after {uptime}.");
    }
    Ok(())
}

/// Print lifecycle events as they arrive, until the bus closes.
async fn report_events(mut rx: broadcast::Receiver<LifecycleEvent>, json: bool) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                tracing::info!(event = ?event, "lifecycle event");
                if json {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(err) => tracing::warn!("failed to encode lifecycle event: {err}"),
                    }
                } else {
                    println!("  {} {}", style("•").dim(), describe(&event));
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "lifecycle reporter lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn describe(event: &LifecycleEvent) -> String {
    match event {
        LifecycleEvent::Connected { mode } => format!("{mode} connected"),
        LifecycleEvent::Disconnected { mode } => format!("{mode} disconnected"),
        LifecycleEvent::ShutDown { mode } => format!("{mode} shut down"),
    }
}

/// Wait for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the failure is logged and that source is
/// ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
