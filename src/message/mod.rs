//! Message types for the module bus.
//!
//! Broadcasts travel the bus as a [`Label`] naming the message plus a JSON
//! payload; listeners receive them wrapped in an [`Envelope`]. A completed
//! dispatch produces a [`DispatchReport`] naming the subscribers reached.
//!
//! # Label Naming
//!
//! Labels follow the `sender:name` convention:
//!
//! - `"say-hello"`: bare label, matches the message from any sender
//! - `"#foo:say-hello"`: qualified label, matches only when `#foo` sends
//!
//! Qualified keys take precedence over bare ones when a subscriber holds
//! both.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `label` | Label parsing and precedence keys |
//! | `envelope` | Delivered message unit and dispatch report |

// ============================================================================
// Submodules
// ============================================================================

/// Label parsing and precedence keys.
pub mod label;

/// Delivered message unit and dispatch report.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{DispatchReport, DoneFn, Envelope, ListenerFn};
pub use label::Label;
