//! Module entities: spec, handle, and group registration.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ModuleSpec`] | Construction spec (identity, selector, callbacks) |
//! | [`Module`] | Handle to a registered module |
//! | [`ModuleState`] | Lifecycle state (`Init` → `Ready`, terminal) |
//! | [`GroupSpec`] / [`ModuleGroup`] | One behavior over several selectors |

// ============================================================================
// Submodules
// ============================================================================

/// Group registration.
pub mod group;

/// Module handle.
pub mod handle;

/// Construction spec and lifecycle state.
pub mod spec;

// ============================================================================
// Re-exports
// ============================================================================

pub use group::{GroupSpec, ModuleGroup};
pub use handle::Module;
pub use spec::{InitFn, MessageFn, ModuleSpec, ModuleState, ViewloadFn};
