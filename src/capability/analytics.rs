//! Analytics event forwarding.
//!
//! A [`Tracker`] forwards interaction events and pageviews to an external
//! analytics [`EventSink`]. Sink failures are third-party failures: the
//! tracker logs them and reports the error, but nothing on the page ever
//! depends on tracking having succeeded.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{Error, Result};

// ============================================================================
// EventSink
// ============================================================================

/// External analytics sink.
pub trait EventSink: Send + Sync {
    /// Records an interaction event.
    ///
    /// # Errors
    ///
    /// Implementations report delivery failures as [`Error::Callback`].
    fn event(
        &self,
        category: &str,
        action: &str,
        label: Option<&str>,
        value: Option<i64>,
        non_interactive: bool,
    ) -> Result<()>;

    /// Records a pageview under `path`.
    ///
    /// # Errors
    ///
    /// Implementations report delivery failures as [`Error::Callback`].
    fn pageview(&self, path: &str) -> Result<()>;
}

// ============================================================================
// Tracker
// ============================================================================

/// Analytics capability.
///
/// # Example
///
/// ```ignore
/// let tracker = Tracker::new(sink);
/// tracker.track_event("checkout", "submit", Some("one-click"), None, false)?;
/// tracker.track_pageview("/checkout/done")?;
/// ```
pub struct Tracker {
    /// The analytics sink.
    sink: Arc<dyn EventSink>,
}

impl Tracker {
    /// Creates a tracker backed by `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Tracks an interaction event.
    ///
    /// `non_interactive` events are excluded from engagement metrics such
    /// as bounce rate.
    ///
    /// # Errors
    ///
    /// Propagates the sink's failure after logging it.
    pub fn track_event(
        &self,
        category: &str,
        action: &str,
        label: Option<&str>,
        value: Option<i64>,
        non_interactive: bool,
    ) -> Result<()> {
        debug!(category, action, ?label, ?value, non_interactive, "tracking event");

        if let Err(err) = self
            .sink
            .event(category, action, label, value, non_interactive)
        {
            error!(category, action, error = %err, "analytics sink failed");
            return Err(err);
        }
        Ok(())
    }

    /// Tracks a pageview.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a non-empty `path` does not begin with `/`
    /// - Propagates the sink's failure after logging it
    pub fn track_pageview(&self, path: &str) -> Result<()> {
        if !path.is_empty() && !path.starts_with('/') {
            return Err(Error::config(
                "pageview path must begin with a slash or be empty",
            ));
        }

        debug!(path, "tracking pageview");

        if let Err(err) = self.sink.pageview(path) {
            error!(path, error = %err, "analytics sink failed");
            return Err(err);
        }
        Ok(())
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
