//! Cancellable readiness probe.
//!
//! A probe polls a [`DomAdapter`] for one selector at a fixed interval with
//! a bounded retry budget. It settles exactly once: `Resolved` on the first
//! successful query, `TimedOut` when the budget runs out, `Cancelled` when
//! aborted. The handle is await-friendly, so callers can compose on
//! settlement without callback nesting.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::dom::adapter::{AnchorRef, DomAdapter};
use crate::error::Error;
use crate::identifiers::ProbeId;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked once with the anchor on the first successful query.
pub type FoundFn = Box<dyn FnOnce(AnchorRef) + Send>;

// ============================================================================
// ProbeState
// ============================================================================

/// Lifecycle state of a readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Still polling.
    Pending,

    /// Anchor located; the found callback has run.
    Resolved,

    /// Retry budget exhausted without locating the anchor.
    TimedOut,

    /// Probe aborted before settling.
    Cancelled,
}

impl ProbeState {
    /// Returns `true` once the probe can no longer change state.
    #[inline]
    #[must_use]
    pub fn is_settled(self) -> bool {
        self != Self::Pending
    }
}

// ============================================================================
// ReadinessProbe
// ============================================================================

/// Handle to a spawned readiness probe task.
pub struct ReadinessProbe {
    /// Probe identifier (for log correlation).
    id: ProbeId,

    /// Selector being polled.
    selector: String,

    /// Settlement channel fed by the probe task.
    state_rx: watch::Receiver<ProbeState>,

    /// The polling task.
    task: JoinHandle<()>,
}

impl ReadinessProbe {
    /// Spawns a probe polling `selector` on `adapter`.
    ///
    /// The first successful query invokes `on_found` with the anchor before
    /// the probe reports `Resolved`. The first query happens immediately;
    /// `retries` bounds the total number of queries.
    pub fn spawn(
        adapter: Arc<dyn DomAdapter>,
        selector: impl Into<String>,
        interval: Duration,
        retries: u32,
        on_found: FoundFn,
    ) -> Self {
        let id = ProbeId::generate();
        let selector = selector.into();
        let (state_tx, state_rx) = watch::channel(ProbeState::Pending);

        let task_selector = selector.clone();
        let task = tokio::spawn(async move {
            for attempt in 1..=retries {
                if let Some(anchor) = adapter.query(&task_selector).await {
                    debug!(probe = %id, selector = %task_selector, attempt, "anchor located");
                    on_found(anchor);
                    let _ = state_tx.send(ProbeState::Resolved);
                    return;
                }
                if attempt < retries {
                    sleep(interval).await;
                }
            }

            let err = Error::readiness_timeout(&task_selector, retries);
            warn!(probe = %id, error = %err, "readiness probe gave up");
            let _ = state_tx.send(ProbeState::TimedOut);
        });

        debug!(probe = %id, selector = %selector, retries, "readiness probe started");

        Self {
            id,
            selector,
            state_rx,
            task,
        }
    }

    /// Returns the probe identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ProbeId {
        self.id
    }

    /// Returns the selector being polled.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Returns the current probe state.
    #[must_use]
    pub fn state(&self) -> ProbeState {
        let state = *self.state_rx.borrow();
        if state == ProbeState::Pending && self.task.is_finished() {
            ProbeState::Cancelled
        } else {
            state
        }
    }

    /// Waits until the probe settles and returns the final state.
    pub async fn settled(&self) -> ProbeState {
        let mut rx = self.state_rx.clone();
        loop {
            let state = *rx.borrow_and_update();
            if state.is_settled() {
                return state;
            }
            if rx.changed().await.is_err() {
                // Task gone without settling: it was aborted.
                let last = *rx.borrow();
                return if last.is_settled() {
                    last
                } else {
                    ProbeState::Cancelled
                };
            }
        }
    }

    /// Aborts the probe.
    ///
    /// A probe that already settled is unaffected.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
