//! Backend that talks to nothing.
//!
//! Used for headless runs and tests: the transport discards whatever is sent
//! and every poll succeeds, so serving lasts until the lifecycle is stopped
//! or interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use botframe_core::backend::{ChatBackend, Transport};
use botframe_types::error::ServeError;

/// Registry name of the null backend.
pub const MODE: &str = "null";

#[derive(Debug, Default)]
pub struct NullBackend;

impl ChatBackend for NullBackend {
    fn mode(&self) -> &str {
        MODE
    }

    fn open_transport(&self) -> Result<Arc<dyn Transport>, ServeError> {
        Ok(Arc::new(NullTransport::default()))
    }

    fn on_shutdown(&self) {
        tracing::debug!(mode = MODE, "null backend released");
    }
}

/// Transport that drops every message, counting them.
#[derive(Debug, Default)]
pub struct NullTransport {
    discarded: AtomicU64,
    max_message_size: Option<usize>,
}

impl NullTransport {
    /// Transport that advertises a per-message size limit.
    pub fn with_max_message_size(limit: usize) -> Self {
        Self {
            discarded: AtomicU64::new(0),
            max_message_size: Some(limit),
        }
    }

    /// Messages sent so far.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

impl Transport for NullTransport {
    fn send(&self, text: &str) -> Result<(), ServeError> {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(len = text.len(), "discarding message");
        Ok(())
    }

    fn max_message_size(&self) -> Option<usize> {
        self.max_message_size
    }
}
