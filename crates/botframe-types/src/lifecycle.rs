//! Connection lifecycle types.
//!
//! `ConnectionState` tracks where a backend is in its
//! connect/serve/shutdown cycle; `LifecycleEvent` is what the framework
//! observes when the lifecycle crosses a boundary.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Connection states of a chat backend.
///
/// `Disconnected -> Connecting -> Connected -> Running -> ShuttingDown -> Disconnected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Running,
    ShuttingDown,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Running => write!(f, "running"),
            ConnectionState::ShuttingDown => write!(f, "shutting_down"),
        }
    }
}

/// Notification published when a backend crosses a lifecycle boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The backend is connected and about to start serving.
    Connected { mode: String },
    /// The serve loop ended, for whatever reason.
    Disconnected { mode: String },
    /// One-time teardown completed.
    ShutDown { mode: String },
}

impl LifecycleEvent {
    /// The backend mode (`null`, ...) this event refers to.
    pub fn mode(&self) -> &str {
        match self {
            LifecycleEvent::Connected { mode }
            | LifecycleEvent::Disconnected { mode }
            | LifecycleEvent::ShutDown { mode } => mode,
        }
    }
}
