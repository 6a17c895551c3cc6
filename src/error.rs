//! Error types for the module bus.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use modnet::{Result, Error};
//!
//! fn example(module: &Module) -> Result<()> {
//!     module.listen("say-hello", |envelope| {
//!         println!("{} said hello", envelope.sender);
//!         Ok(())
//!     })?;
//!     module.broadcast("switch-view", serde_json::json!({"view": "grid"}))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::DuplicateModule`], [`Error::MalformedLabel`] |
//! | Registry | [`Error::ModuleNotFound`], [`Error::ModuleNotReady`] |
//! | Broadcast | [`Error::ImpersonatedLabel`] |
//! | Readiness | [`Error::ReadinessTimeout`] |
//! | User callbacks | [`Error::Callback`] |
//!
//! Failures raised by user-supplied callbacks (initializers, listeners,
//! observers) are caught at the manager boundary and logged; they never
//! escape to abort a dispatch or crash the bus.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::ModuleId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a module spec or bus option is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A module with the same identity is already registered.
    ///
    /// Identities are never reused while a module is registered.
    #[error("Module already registered: {id}")]
    DuplicateModule {
        /// The conflicting identity.
        id: ModuleId,
    },

    /// Malformed message label.
    ///
    /// Returned when a label is empty or carries an empty sender prefix.
    #[error("Malformed label: {label:?}")]
    MalformedLabel {
        /// The offending label text.
        label: String,
    },

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// Module identity not present in the registry.
    #[error("Module not found: {id}")]
    ModuleNotFound {
        /// The missing identity.
        id: ModuleId,
    },

    /// Module's view is not ready yet.
    ///
    /// Returned when an operation needs the module's DOM anchor before
    /// readiness detection has located it.
    #[error("Module not ready: {id}")]
    ModuleNotReady {
        /// The not-yet-ready identity.
        id: ModuleId,
    },

    // ========================================================================
    // Broadcast Errors
    // ========================================================================
    /// Qualified label prefix does not match the broadcasting module.
    ///
    /// Guards against one module impersonating another. The broadcast is
    /// rejected and nothing is dispatched.
    #[error("Label {label:?} does not belong to sender {sender}")]
    ImpersonatedLabel {
        /// The qualified label that was rejected.
        label: String,
        /// The module that attempted the broadcast.
        sender: ModuleId,
    },

    // ========================================================================
    // Readiness Errors
    // ========================================================================
    /// Readiness detection exhausted its retry budget.
    ///
    /// The module stays permanently not-ready; the bus keeps running.
    #[error("View {selector:?} did not appear after {attempts} attempts")]
    ReadinessTimeout {
        /// Selector that never matched a DOM node.
        selector: String,
        /// Number of probe attempts made.
        attempts: u32,
    },

    // ========================================================================
    // User Callback Errors
    // ========================================================================
    /// Failure reported by a user-supplied callback.
    ///
    /// Initializers, listeners, and observers return this (or any other
    /// variant) to signal failure; the bus logs it and moves on.
    #[error("Callback error: {message}")]
    Callback {
        /// Description of the callback failure.
        message: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a duplicate module error.
    #[inline]
    pub fn duplicate_module(id: ModuleId) -> Self {
        Self::DuplicateModule { id }
    }

    /// Creates a malformed label error.
    #[inline]
    pub fn malformed_label(label: impl Into<String>) -> Self {
        Self::MalformedLabel {
            label: label.into(),
        }
    }

    /// Creates a module not found error.
    #[inline]
    pub fn module_not_found(id: ModuleId) -> Self {
        Self::ModuleNotFound { id }
    }

    /// Creates a module not ready error.
    #[inline]
    pub fn module_not_ready(id: ModuleId) -> Self {
        Self::ModuleNotReady { id }
    }

    /// Creates an impersonated label error.
    #[inline]
    pub fn impersonated_label(label: impl Into<String>, sender: ModuleId) -> Self {
        Self::ImpersonatedLabel {
            label: label.into(),
            sender,
        }
    }

    /// Creates a readiness timeout error.
    #[inline]
    pub fn readiness_timeout(selector: impl Into<String>, attempts: u32) -> Self {
        Self::ReadinessTimeout {
            selector: selector.into(),
            attempts,
        }
    }

    /// Creates a user callback error.
    #[inline]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a configuration error.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::DuplicateModule { .. } | Self::MalformedLabel { .. }
        )
    }

    /// Returns `true` if this error rejected a broadcast before dispatch.
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ImpersonatedLabel { .. } | Self::MalformedLabel { .. }
        )
    }

    /// Returns `true` if this is a readiness timeout.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadinessTimeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
