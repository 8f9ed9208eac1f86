//! Chat backend trait.
//!
//! A backend adapts one chat service. The connection lifecycle owns the
//! connect/serve/shutdown sequencing; the backend only supplies the transport,
//! a per-tick poll hook, and its own teardown. Protocol details live entirely
//! behind these methods.

use std::sync::Arc;

use botframe_types::error::ServeError;

use crate::text::split_string_after;

/// Live connection to a chat service.
pub trait Transport: Send + Sync {
    /// Deliver `text` to the service.
    fn send(&self, text: &str) -> Result<(), ServeError>;

    /// Longest message, in characters, the service accepts in one send.
    fn max_message_size(&self) -> Option<usize> {
        None
    }
}

/// Send `text`, split into as many messages as the transport's size limit
/// requires. Returns the number of messages sent.
pub fn send_split(transport: &dyn Transport, text: &str) -> Result<usize, ServeError> {
    let Some(limit) = transport.max_message_size() else {
        transport.send(text)?;
        return Ok(1);
    };

    let mut sent = 0;
    for chunk in split_string_after(text, limit) {
        transport.send(chunk)?;
        sent += 1;
    }
    if sent > 1 {
        tracing::debug!(parts = sent, limit, "split oversized message");
    }
    Ok(sent)
}

/// A chat service backend selectable by name from the plugin registry.
pub trait ChatBackend: Send + Sync {
    /// Short identifier of the backend (`null`, ...).
    fn mode(&self) -> &str;

    /// Establish a new transport. Called only when none is held.
    fn open_transport(&self) -> Result<Arc<dyn Transport>, ServeError>;

    /// Called once per serve-loop tick.
    ///
    /// Returning `Interrupted` or `EndOfInput` ends serving normally; any other
    /// error ends serving and is returned from `serve_forever`.
    fn poll(&self) -> Result<(), ServeError> {
        Ok(())
    }

    /// Backend-specific teardown, run once per lifecycle by `shutdown`.
    fn on_shutdown(&self) {}
}
