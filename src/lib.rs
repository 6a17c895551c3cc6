//! modnet - Page-module registry and message bus.
//!
//! This library coordinates discrete page regions ("modules") of a browser
//! UI: modules register with a central manager, announce readiness when
//! their DOM anchor appears, and exchange named messages over a
//! publish/subscribe bus.
//!
//! # Architecture
//!
//! The manager is an explicit context object shared by the page's
//! composition root:
//!
//! - Each [`Module`] holds: identity + readiness state + listener forwarders
//! - Labels use the `sender:name` format; qualified keys beat bare ones
//! - Broadcasts issued before the network is ready queue FIFO and flush on
//!   the ready transition
//! - One listener's failure never stops delivery to the others
//!
//! Key design principles:
//!
//! - The DOM is an external collaborator behind the [`DomAdapter`] trait
//! - Readiness detection is a bounded polling probe, not a blocking wait
//! - A fallback watchdog keeps the bus live when a view never appears
//! - Presentation, translation, and analytics are opt-in capabilities
//!   composed onto modules, not inherited into them
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use modnet::{ModuleManager, ModuleSpec, Result, StaticDom};
//!
//! fn main() -> Result<()> {
//!     let dom = Arc::new(StaticDom::new());
//!     let manager = ModuleManager::new(dom);
//!
//!     // Register page regions
//!     let foo = manager.register(ModuleSpec::for_selector("#foo"))?;
//!     let bar = manager.register(ModuleSpec::for_selector("#bar"))?;
//!
//!     // Wire a listener, then launch the network
//!     bar.listen("say-hello", |envelope| {
//!         println!("{} says {}", envelope.sender, envelope.payload);
//!         Ok(())
//!     })?;
//!     manager.start_all();
//!
//!     // Queued until every view is located, then delivered FIFO
//!     foo.broadcast("say-hello", serde_json::json!("hi"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bus`] | [`ModuleManager`] registry, readiness tracking, dispatch |
//! | [`module`] | Module entities: [`ModuleSpec`], [`Module`], groups |
//! | [`message`] | [`Label`], [`Envelope`], dispatch reports |
//! | [`dom`] | DOM boundary: [`DomAdapter`], readiness probes |
//! | [`capability`] | Optional presentation/translation/analytics layers |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//!
//! # Features
//!
//! - **Isolated failures**: a bad initializer or listener is logged, never
//!   fatal to the network
//! - **Impersonation guard**: a module cannot broadcast under another
//!   module's qualified label
//! - **Liveness over completeness**: the watchdog unblocks cross-module
//!   messaging even when one view never renders

// ============================================================================
// Modules
// ============================================================================

/// The module bus: registry, readiness tracking, and message routing.
///
/// Use [`ModuleManager::new`] to create the per-page coordination context.
pub mod bus;

/// Optional module capabilities (dialogs, translations, analytics).
///
/// Each capability composes a narrow service trait with a module handle.
pub mod capability;

/// DOM boundary: anchor lookup and readiness probing.
///
/// Internal machinery plus the [`StaticDom`] test adapter.
pub mod dom;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for bus entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Message types: labels, envelopes, dispatch reports.
pub mod message;

/// Module entities: construction specs, handles, and groups.
pub mod module;

// ============================================================================
// Re-exports
// ============================================================================

// Bus types
pub use bus::{BusOptions, ModuleManager};

// Capability types
pub use capability::{EventSink, OverlayService, Presenter, Tracker, TranslationStore, Translator};

// DOM types
pub use dom::{AnchorRef, DomAdapter, ProbeState, ReadinessProbe, StaticDom};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ModuleId, ProbeId};

// Message types
pub use message::{DispatchReport, Envelope, Label};

// Module types
pub use module::{GroupSpec, Module, ModuleGroup, ModuleSpec, ModuleState};
