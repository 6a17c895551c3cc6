//! Delivered message unit and dispatch report.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::ModuleId;

// ============================================================================
// Callback Types
// ============================================================================

/// Listener callback invoked for each matching broadcast.
///
/// Returning an `Err` marks this listener as failed for the dispatch; the
/// error is logged with the subscriber's identity and delivery continues to
/// the remaining subscribers.
pub type ListenerFn = dyn Fn(&Envelope) -> Result<()> + Send + Sync;

/// Completion callback attached to a broadcast.
///
/// Invoked with the delivery report once the broadcast is dispatched:
/// immediately for a ready network, at queue flush otherwise.
pub type DoneFn = Box<dyn FnOnce(&DispatchReport) + Send>;

// ============================================================================
// Envelope
// ============================================================================

/// A message as delivered to a listener.
///
/// The label is always the bare message name; sender qualification is
/// resolved during matching and surfaced through [`Envelope::sender`].
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Bare message name, e.g. `"say-hello"`.
    pub label: String,

    /// Identity of the broadcasting module (wildcard for manager-level
    /// broadcasts).
    pub sender: ModuleId,

    /// Message payload.
    pub payload: Value,
}

impl Envelope {
    /// Creates an envelope.
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, sender: ModuleId, payload: Value) -> Self {
        Self {
            label: label.into(),
            sender,
            payload,
        }
    }
}

// ============================================================================
// DispatchReport
// ============================================================================

/// Summary of a completed dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// Bare message name that was dispatched.
    pub label: String,

    /// Identity of the broadcasting module.
    pub sender: ModuleId,

    /// Subscribers whose handler ran without error, in delivery order.
    pub delivered: Vec<ModuleId>,
}

impl DispatchReport {
    /// Returns the number of subscribers reached.
    #[inline]
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    /// Returns `true` if no subscriber matched or all matched handlers
    /// failed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
