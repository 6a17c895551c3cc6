//! DOM boundary: anchor lookup and readiness probing.
//!
//! The bus never touches a real document. Everything it needs from the DOM
//! goes through the [`DomAdapter`] trait: resolve a selector to an
//! [`AnchorRef`] handle, and report whether the surrounding page has
//! finished loading. A [`ReadinessProbe`] polls an adapter at a fixed
//! interval with a bounded retry budget and settles exactly once.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `adapter` | [`DomAdapter`] trait, [`AnchorRef`], in-memory [`StaticDom`] |
//! | `probe` | Cancellable polling probe task |

// ============================================================================
// Submodules
// ============================================================================

/// DOM adapter trait and anchor handles.
pub mod adapter;

/// Cancellable readiness probe.
pub mod probe;

// ============================================================================
// Re-exports
// ============================================================================

pub use adapter::{AnchorRef, DomAdapter, StaticDom};
pub use probe::{ProbeState, ReadinessProbe};
