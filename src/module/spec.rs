//! Module construction spec and lifecycle state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::dom::AnchorRef;
use crate::error::Result;
use crate::message::Envelope;

// ============================================================================
// Callback Types
// ============================================================================

/// Module initializer, run exactly once at registration.
///
/// An `Err` is logged with the module identity; the module stays
/// registered.
pub type InitFn = Box<dyn FnOnce() -> Result<()> + Send>;

/// `viewload` observer, fired exactly once when the module's anchor is
/// located.
pub type ViewloadFn = Arc<dyn Fn(&AnchorRef) -> Result<()> + Send + Sync>;

/// `message` observer, fired after each message handler run for this
/// module. Never fired for the wildcard subscriber.
pub type MessageFn = Arc<dyn Fn(&Envelope) -> Result<()> + Send + Sync>;

// ============================================================================
// ModuleState
// ============================================================================

/// Lifecycle state of a module.
///
/// `Ready` is terminal; there is no transition back to `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    /// Registered; view not located yet.
    Init,

    /// View located (or the module has no view) and safe to interact with.
    Ready,
}

// ============================================================================
// ModuleSpec
// ============================================================================

/// Construction spec for a module.
///
/// # Example
///
/// ```
/// use modnet::ModuleSpec;
///
/// let spec = ModuleSpec::for_selector("#sidebar")
///     .with_init(|| {
///         // wire up widgets
///         Ok(())
///     })
///     .on_viewload(|anchor| {
///         println!("sidebar mounted at {}", anchor.selector());
///         Ok(())
///     });
/// ```
pub struct ModuleSpec {
    /// Module identity.
    id: String,

    /// Selector of the module's DOM anchor, if it has a view.
    selector: Option<String>,

    /// Initializer, run once at registration.
    init: Option<InitFn>,

    /// `viewload` observer.
    on_viewload: Option<ViewloadFn>,

    /// `message` observer.
    on_message: Option<MessageFn>,
}

impl ModuleSpec {
    /// Creates a spec for a module without a view.
    ///
    /// Viewless modules become ready immediately when started.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selector: None,
            init: None,
            on_viewload: None,
            on_message: None,
        }
    }

    /// Creates a spec whose identity doubles as its anchor selector.
    ///
    /// This is the common case: one page region per CSS selector.
    #[must_use]
    pub fn for_selector(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self::new(selector.clone()).with_selector(selector)
    }

    /// Sets the anchor selector.
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Sets the initializer.
    #[must_use]
    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.init = Some(Box::new(init));
        self
    }

    /// Sets the `viewload` observer.
    #[must_use]
    pub fn on_viewload<F>(mut self, observer: F) -> Self
    where
        F: Fn(&AnchorRef) -> Result<()> + Send + Sync + 'static,
    {
        self.on_viewload = Some(Arc::new(observer));
        self
    }

    /// Sets the `message` observer.
    #[must_use]
    pub fn on_message<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(observer));
        self
    }

    /// Decomposes the spec for registration.
    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        Option<String>,
        Option<InitFn>,
        Option<ViewloadFn>,
        Option<MessageFn>,
    ) {
        (
            self.id,
            self.selector,
            self.init,
            self.on_viewload,
            self.on_message,
        )
    }
}

impl fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSpec")
            .field("id", &self.id)
            .field("selector", &self.selector)
            .field("init", &self.init.is_some())
            .field("on_viewload", &self.on_viewload.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_selector_sets_both() {
        let (id, selector, ..) = ModuleSpec::for_selector("#foo").into_parts();
        assert_eq!(id, "#foo");
        assert_eq!(selector.as_deref(), Some("#foo"));
    }

    #[test]
    fn test_new_is_viewless() {
        let (id, selector, init, viewload, message) = ModuleSpec::new("panel").into_parts();
        assert_eq!(id, "panel");
        assert!(selector.is_none());
        assert!(init.is_none());
        assert!(viewload.is_none());
        assert!(message.is_none());
    }

    #[test]
    fn test_builder_attaches_callbacks() {
        let spec = ModuleSpec::for_selector("#foo")
            .with_init(|| Ok(()))
            .on_viewload(|_| Ok(()))
            .on_message(|_| Ok(()));

        let (.., init, viewload, message) = spec.into_parts();
        assert!(init.is_some());
        assert!(viewload.is_some());
        assert!(message.is_some());
    }
}
