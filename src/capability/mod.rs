//! Optional module capabilities.
//!
//! Capabilities layer presentation, translation, and analytics onto a
//! module by composition: each is a small wrapper around the module handle
//! plus a narrow service trait, not an inheritance hierarchy. The services
//! themselves (overlay widget, translation resources, analytics tracker)
//! are external collaborators behind traits.
//!
//! # Modules
//!
//! | Module | Capability | Service trait |
//! |--------|-----------|---------------|
//! | `dialog` | Dialog/popup presentation | [`OverlayService`] |
//! | `intl` | Translated strings | [`TranslationStore`] |
//! | `analytics` | Event tracking | [`EventSink`] |

// ============================================================================
// Submodules
// ============================================================================

/// Analytics event forwarding.
pub mod analytics;

/// Dialog and popup presentation.
pub mod dialog;

/// Translated string lookup.
pub mod intl;

// ============================================================================
// Re-exports
// ============================================================================

pub use analytics::{EventSink, Tracker};
pub use dialog::{OverlayService, Presenter};
pub use intl::{TranslationStore, Translator};
