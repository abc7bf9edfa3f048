//! Connection lifecycle guard
//!
//! Serializes and memoizes "connect to the KLF-200 and load its state"
//! across independent consumers that start concurrently. At most one
//! connection attempt is ever in flight; every caller during that attempt
//! observes the same attempt and the same outcome. Shutdown cancels an
//! in-flight attempt, waits for it to unwind, then disconnects the gateway
//! exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use klf200::{Gateway, GatewayResult};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fatal lifecycle errors of the guard
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    /// Setup was requested after the hub-stop teardown already ran; this is
    /// a lifecycle violation, never retried
    #[error("gateway setup requested after shutdown")]
    ShutdownInProgress,
}

/// Outcome of one connection attempt
///
/// Transient gateway failures are not errors from the guard's point of
/// view; they degrade to `NotReady` and the host retries later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Gateway connected and scene/node state loaded
    Ready,
    /// The attempt failed or was cancelled; the gateway is not usable yet
    NotReady,
}

/// A waitable handle to an in-flight connection attempt
///
/// Cloned to every consumer that requests a connection while the attempt
/// is running; all clones resolve to the same outcome.
#[derive(Debug, Clone)]
pub struct AttemptHandle {
    generation: u64,
    rx: watch::Receiver<Option<SetupOutcome>>,
}

impl AttemptHandle {
    /// Which attempt this handle belongs to; concurrent consumers of one
    /// attempt hold handles with equal generations
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the attempt to finish
    ///
    /// An attempt whose task was cancelled resolves to
    /// [`SetupOutcome::NotReady`]. Callers impose their own timeout; the
    /// guard never does.
    pub async fn wait(mut self) -> SetupOutcome {
        loop {
            if let Some(outcome) = *self.rx.borrow_and_update() {
                return outcome;
            }
            if self.rx.changed().await.is_err() {
                // Sender dropped without publishing: the attempt was aborted.
                return SetupOutcome::NotReady;
            }
        }
    }
}

struct Pending {
    handle: AttemptHandle,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct GuardState {
    shutdown: bool,
    generation: u64,
    pending: Option<Pending>,
}

/// Guard around the single shared gateway connection
///
/// Created once at component setup with an unconnected [`Gateway`];
/// connects lazily on first consumer demand and is torn down exactly once
/// when the hub stops.
pub struct ConnectionGuard {
    gateway: Arc<Gateway>,
    setup_complete: AtomicBool,
    state: Mutex<GuardState>,
}

impl ConnectionGuard {
    /// Create a guard around an unconnected gateway
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            setup_complete: AtomicBool::new(false),
            state: Mutex::new(GuardState::default()),
        }
    }

    /// The shared gateway handle
    pub fn gateway(&self) -> Arc<Gateway> {
        Arc::clone(&self.gateway)
    }

    /// Whether scene and node state has been loaded successfully
    ///
    /// Transitions false to true at most once and never resets while the
    /// guard is running.
    pub fn is_setup_complete(&self) -> bool {
        self.setup_complete.load(Ordering::SeqCst)
    }

    /// Whether a connection attempt is currently in flight
    pub async fn is_starting(&self) -> bool {
        self.state.lock().await.pending.is_some()
    }

    /// Whether shutdown has run
    pub async fn is_shutdown(&self) -> bool {
        self.state.lock().await.shutdown
    }

    /// Request that the gateway be connected and its state loaded
    ///
    /// If an attempt is already in flight the existing handle is returned;
    /// otherwise a new attempt is spawned. Load failures never surface
    /// here — they resolve the handle to [`SetupOutcome::NotReady`] and
    /// leave `setup_complete` false. The only error is the fatal
    /// setup-after-shutdown case.
    pub async fn ensure_connected(self: &Arc<Self>) -> Result<AttemptHandle, GuardError> {
        let mut state = self.state.lock().await;

        if state.shutdown {
            return Err(GuardError::ShutdownInProgress);
        }

        if let Some(pending) = &state.pending {
            debug!(
                generation = pending.handle.generation,
                "connection attempt already in flight"
            );
            return Ok(pending.handle.clone());
        }

        state.generation += 1;
        let (tx, rx) = watch::channel(None);
        let handle = AttemptHandle {
            generation: state.generation,
            rx,
        };

        debug!(generation = state.generation, "starting connection attempt");
        let guard = Arc::clone(self);
        let task = tokio::spawn(async move {
            guard.run_attempt(tx).await;
        });
        state.pending = Some(Pending {
            handle: handle.clone(),
            task,
        });

        Ok(handle)
    }

    /// Consumer-side wait used by platform setup
    ///
    /// Bounded by `timeout`; expiry is reported as
    /// [`SetupOutcome::NotReady`], identical to a failed attempt.
    pub async fn wait_ready(self: &Arc<Self>, timeout: Duration) -> Result<SetupOutcome, GuardError> {
        if self.is_setup_complete() {
            return Ok(SetupOutcome::Ready);
        }

        let handle = self.ensure_connected().await?;
        match tokio::time::timeout(timeout, handle.wait()).await {
            Ok(SetupOutcome::Ready) if self.is_setup_complete() => Ok(SetupOutcome::Ready),
            Ok(_) => Ok(SetupOutcome::NotReady),
            Err(_elapsed) => {
                debug!("timed out waiting for gateway setup");
                Ok(SetupOutcome::NotReady)
            }
        }
    }

    /// Tear down the gateway link; idempotent
    ///
    /// Marks the guard shut down first so no new attempt can start, cancels
    /// an in-flight attempt and waits for it to unwind, then disconnects
    /// the gateway. The disconnect runs exactly once regardless of what the
    /// cancellation did; its failure is logged, not propagated.
    pub async fn shutdown(&self) {
        let pending = {
            let mut state = self.state.lock().await;
            if state.shutdown {
                debug!("shutdown already performed");
                return;
            }
            state.shutdown = true;
            state.pending.take()
        };

        if let Some(pending) = pending {
            pending.task.abort();
            // Wait for the attempt to actually unwind so the disconnect
            // below cannot race a half-finished load.
            match pending.task.await {
                Ok(()) => debug!("in-flight connection attempt finished before teardown"),
                Err(err) if err.is_cancelled() => {
                    debug!(
                        generation = pending.handle.generation,
                        "cancelled in-flight connection attempt"
                    );
                }
                Err(err) => {
                    warn!(error = %err, "connection attempt did not unwind cleanly");
                }
            }
        }

        if let Err(err) = self.gateway.disconnect().await {
            warn!(error = %err, "gateway disconnect failed");
        }
        info!(host = %self.gateway.host(), "velux gateway interface terminated");
    }

    async fn run_attempt(self: Arc<Self>, tx: watch::Sender<Option<SetupOutcome>>) {
        let outcome = match self.connect_and_load().await {
            Ok(()) => {
                self.setup_complete.store(true, Ordering::SeqCst);
                info!(host = %self.gateway.host(), "connected to KLF-200 and loaded gateway state");
                SetupOutcome::Ready
            }
            Err(err) => {
                info!(host = %self.gateway.host(), error = %err, "could not connect to KLF-200");
                SetupOutcome::NotReady
            }
        };

        // Clear the pending slot before publishing so a caller seeing the
        // outcome can immediately request a fresh attempt.
        let mut state = self.state.lock().await;
        state.pending = None;
        let _ = tx.send(Some(outcome));
    }

    async fn connect_and_load(&self) -> GatewayResult<()> {
        self.gateway.connect().await?;
        self.gateway.load_scenes().await?;
        self.gateway.load_nodes().await?;
        Ok(())
    }
}
