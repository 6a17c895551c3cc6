//! Bus timing options.
//!
//! Controls the cadence and budget of per-module readiness probes and the
//! manager-wide fallback watchdog.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use modnet::BusOptions;
//!
//! let options = BusOptions::new()
//!     .with_probe_interval(Duration::from_millis(50))
//!     .with_probe_retries(100);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default interval between readiness probe attempts.
const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Default number of probe attempts before a module view is given up on.
const DEFAULT_PROBE_RETRIES: u32 = 50;

/// Default interval between watchdog checks.
const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_millis(250);

/// Default watchdog budget before readiness is forced on a loaded page.
const DEFAULT_WATCHDOG_RETRIES: u32 = 40;

// ============================================================================
// BusOptions
// ============================================================================

/// Timing configuration for a [`ModuleManager`](crate::ModuleManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusOptions {
    /// Interval between readiness probe attempts for one module.
    pub probe_interval: Duration,

    /// Probe attempts before a module view is given up on.
    pub probe_retries: u32,

    /// Interval between fallback watchdog checks.
    pub watchdog_interval: Duration,

    /// Watchdog checks before readiness is forced on a loaded page.
    /// Readiness is forced unconditionally after twice this budget.
    pub watchdog_retries: u32,
}

// ============================================================================
// Constructors
// ============================================================================

impl BusOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            probe_interval: DEFAULT_PROBE_INTERVAL,
            probe_retries: DEFAULT_PROBE_RETRIES,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
            watchdog_retries: DEFAULT_WATCHDOG_RETRIES,
        }
    }
}

impl Default for BusOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BusOptions {
    /// Sets the probe interval.
    #[inline]
    #[must_use]
    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Sets the probe retry budget.
    #[inline]
    #[must_use]
    pub fn with_probe_retries(mut self, retries: u32) -> Self {
        self.probe_retries = retries;
        self
    }

    /// Sets the watchdog check interval.
    #[inline]
    #[must_use]
    pub fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    /// Sets the watchdog retry budget.
    #[inline]
    #[must_use]
    pub fn with_watchdog_retries(mut self, retries: u32) -> Self {
        self.watchdog_retries = retries;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
