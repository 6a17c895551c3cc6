//! Type-safe identifiers for bus entities.
//!
//! Newtype wrappers prevent mixing incompatible identifiers at compile time.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ModuleId`] | Module identity (a selector or explicit id) |
//! | [`ProbeId`] | Readiness probe instance |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// ModuleId
// ============================================================================

/// The reserved identity for manager-level listeners and broadcasts.
pub const WILDCARD: &str = "*";

/// Identity of a registered module.
///
/// A module identity is a non-empty string key, typically the CSS selector
/// of the module's DOM anchor (`"#sidebar"`) or an explicit name. It is
/// assigned at construction and never changes while the module is
/// registered.
///
/// The wildcard identity `"*"` denotes the manager itself; it cannot be
/// produced through [`ModuleId::new`] and is rejected at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Creates a module identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::config("module identity must not be empty"));
        }
        Ok(Self(id))
    }

    /// Returns the wildcard identity used for manager-level listeners.
    #[inline]
    #[must_use]
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    /// Returns `true` if this is the wildcard identity.
    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// Returns the identity as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identity with any leading `#` or `.` selector sigil
    /// removed.
    ///
    /// Used where the identity doubles as a plain element name, e.g. when
    /// composing translation keys.
    #[must_use]
    pub fn element_name(&self) -> &str {
        self.0.trim_start_matches(['#', '.'])
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ModuleId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for ModuleId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

// ============================================================================
// ProbeId
// ============================================================================

/// Unique identifier for a readiness probe task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(Uuid);

impl ProbeId {
    /// Generates a new random probe identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Tests
// ============================================================================
