//! Broadcast event bus for distributing `LifecycleEvent` to multiple subscribers.
//!
//! Built on `tokio::sync::broadcast`. Publishing with no active subscribers is
//! a no-op, so a backend can run headless without anyone listening.

use botframe_types::lifecycle::LifecycleEvent;
use tokio::sync::broadcast;

/// Default channel capacity; lifecycle traffic is a handful of events per run.
pub const DEFAULT_CAPACITY: usize = 64;

/// Multi-consumer bus for connection lifecycle events.
///
/// Cloning the bus clones the sender, so every clone publishes into the same
/// channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: LifecycleEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
