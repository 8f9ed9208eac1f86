//! Connection lifecycle of a chat backend.
//!
//! `Disconnected -> Connecting -> Connected -> Running -> ShuttingDown -> Disconnected`
//!
//! [`ConnectionLifecycle::serve_forever`] connects, announces the connection,
//! then polls a running flag at a fixed cadence until the flag is cleared
//! ([`stop`](ConnectionLifecycle::stop) / [`shutdown`](ConnectionLifecycle::shutdown)),
//! an external interrupt arrives, or the backend reports end of input. However
//! the loop ends, a drop guard announces the disconnection, runs `shutdown`,
//! and leaves the lifecycle `Disconnected` with no transport held, also when
//! an earlier `shutdown` already spent the teardown. `shutdown` is guarded by an atomic compare-and-set on the
//! running flag, so teardown happens once per instance no matter how many
//! call sites race to trigger it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use botframe_types::error::ServeError;
use botframe_types::lifecycle::{ConnectionState, LifecycleEvent};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::chat::{ChatBackend, Transport};
use crate::event::EventBus;

/// Default cadence of the running-flag check.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lower bound for the poll interval; a zero period would spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Drives one backend instance through connect, serve and shutdown.
pub struct ConnectionLifecycle {
    backend: Arc<dyn ChatBackend>,
    events: EventBus,
    poll_interval: Duration,
    state: Mutex<ConnectionState>,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    /// Cleared exactly once, by the first `shutdown`.
    running: AtomicBool,
    interrupt: CancellationToken,
}

impl ConnectionLifecycle {
    pub fn new(backend: Arc<dyn ChatBackend>, events: EventBus) -> Self {
        Self {
            backend,
            events,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: Mutex::new(ConnectionState::Disconnected),
            transport: Mutex::new(None),
            running: AtomicBool::new(true),
            interrupt: CancellationToken::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn mode(&self) -> &str {
        self.backend.mode()
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    /// False once `shutdown` has run.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The transport currently held, if connected.
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        lock(&self.transport).clone()
    }

    /// Token that interrupts `serve_forever` when cancelled.
    ///
    /// Signal handlers hold a clone of this token.
    pub fn interrupt_token(&self) -> CancellationToken {
        self.interrupt.clone()
    }

    /// Deliver an external interrupt to the serve loop.
    pub fn interrupt(&self) {
        self.interrupt.cancel();
    }

    /// Return the held transport, opening one first if none is held.
    pub fn connect(&self) -> Result<Arc<dyn Transport>, ServeError> {
        let mut slot = lock(&self.transport);
        if let Some(transport) = slot.as_ref() {
            return Ok(Arc::clone(transport));
        }

        self.set_state(ConnectionState::Connecting);
        match self.backend.open_transport() {
            Ok(transport) => {
                *slot = Some(Arc::clone(&transport));
                self.set_state(ConnectionState::Connected);
                tracing::debug!(mode = self.mode(), "transport opened");
                Ok(transport)
            }
            Err(err) => {
                self.set_state(ConnectionState::Disconnected);
                tracing::warn!(mode = self.mode(), error = %err, "failed to open transport");
                Err(err)
            }
        }
    }

    /// Serve until stopped, interrupted, or the backend's input ends.
    ///
    /// Returns `Ok(())` for every ordinary termination and the backend's error
    /// for anything else. The disconnect notification and `shutdown` have
    /// always run by the time this returns, and also if the returned future
    /// is dropped early.
    pub async fn serve_forever(&self) -> Result<(), ServeError> {
        self.connect()?;
        self.notify_connected();

        let _cleanup = ServeCleanup { lifecycle: self };
        self.poll_until_stopped().await
    }

    /// Explicit stop request from outside the serve loop.
    ///
    /// Observed by the loop at its next tick.
    pub fn stop(&self) {
        tracing::debug!(mode = self.mode(), "stop requested");
        self.shutdown();
    }

    /// Clear the running flag and tear down. Only the first call has any effect.
    pub fn shutdown(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(mode = self.mode(), "shutdown already performed");
            return;
        }

        self.set_state(ConnectionState::ShuttingDown);
        tracing::info!(mode = self.mode(), "shutting down backend");
        self.backend.on_shutdown();
        lock(&self.transport).take();
        self.set_state(ConnectionState::Disconnected);
        self.events.publish(LifecycleEvent::ShutDown {
            mode: self.mode().to_string(),
        });
    }

    async fn poll_until_stopped(&self) -> Result<(), ServeError> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.is_running() {
            tokio::select! {
                biased;
                _ = self.interrupt.cancelled() => {
                    tracing::info!(mode = self.mode(), "interrupt received");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            if !self.is_running() {
                break;
            }

            match self.backend.poll() {
                Ok(()) => {}
                Err(err) if err.is_termination() => {
                    tracing::info!(mode = self.mode(), reason = %err, "backend requested stop");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn notify_connected(&self) {
        if self.is_running() {
            self.set_state(ConnectionState::Running);
        }
        tracing::info!(mode = self.mode(), "backend connected");
        self.events.publish(LifecycleEvent::Connected {
            mode: self.mode().to_string(),
        });
    }

    fn notify_disconnected(&self) {
        tracing::info!(mode = self.mode(), "backend disconnected");
        self.events.publish(LifecycleEvent::Disconnected {
            mode: self.mode().to_string(),
        });
    }

    /// Drop any transport opened after teardown already ran and end the cycle
    /// in `Disconnected`. Touches neither the backend nor the running flag.
    fn release(&self) {
        if lock(&self.transport).take().is_some() {
            tracing::debug!(mode = self.mode(), "released transport after teardown");
        }
        if self.state() != ConnectionState::Disconnected {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = lock(&self.state);
        tracing::trace!(mode = self.mode(), from = %*state, to = %next, "state change");
        *state = next;
    }
}

impl std::fmt::Debug for ConnectionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLifecycle")
            .field("mode", &self.mode())
            .field("state", &self.state())
            .field("running", &self.is_running())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Runs the disconnect notification and `shutdown` when the serve loop is left
/// by any path: return, error, panic, or the serve future being dropped.
struct ServeCleanup<'a> {
    lifecycle: &'a ConnectionLifecycle,
}

impl Drop for ServeCleanup<'_> {
    fn drop(&mut self) {
        tracing::debug!(mode = self.lifecycle.mode(), "trigger disconnect callback");
        self.lifecycle.notify_disconnected();
        tracing::debug!(mode = self.lifecycle.mode(), "trigger shutdown");
        self.lifecycle.shutdown();
        self.lifecycle.release();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
