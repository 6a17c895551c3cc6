//! Group registration for almost-identical modules.
//!
//! When several page regions share one behavior, a [`GroupSpec`] registers
//! them all in one call instead of repeating the same [`ModuleSpec`] per
//! selector.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::bus::manager::ModuleManager;
use crate::dom::AnchorRef;
use crate::error::{Error, Result};
use crate::message::Envelope;
use crate::module::handle::Module;
use crate::module::spec::{MessageFn, ModuleSpec, ViewloadFn};

// ============================================================================
// GroupSpec
// ============================================================================

/// Shared construction spec applied to every selector in a group.
///
/// Unlike [`ModuleSpec`], the initializer here runs once per member, so it
/// is a reusable `Fn` rather than a one-shot callback.
///
/// # Example
///
/// ```
/// use modnet::GroupSpec;
///
/// let spec = GroupSpec::new(["#foo", "#bar"]).on_viewload(|anchor| {
///     println!("{} mounted", anchor.selector());
///     Ok(())
/// });
/// ```
pub struct GroupSpec {
    /// Selectors of the member modules.
    selectors: Vec<String>,

    /// Shared initializer, run once per member.
    init: Option<Arc<dyn Fn() -> Result<()> + Send + Sync>>,

    /// Shared `viewload` observer.
    on_viewload: Option<ViewloadFn>,

    /// Shared `message` observer.
    on_message: Option<MessageFn>,
}

impl GroupSpec {
    /// Creates a group spec over `selectors`.
    #[must_use]
    pub fn new(selectors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
            init: None,
            on_viewload: None,
            on_message: None,
        }
    }

    /// Sets the shared initializer.
    #[must_use]
    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }

    /// Sets the shared `viewload` observer.
    #[must_use]
    pub fn on_viewload<F>(mut self, observer: F) -> Self
    where
        F: Fn(&AnchorRef) -> Result<()> + Send + Sync + 'static,
    {
        self.on_viewload = Some(Arc::new(observer));
        self
    }

    /// Sets the shared `message` observer.
    #[must_use]
    pub fn on_message<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(observer));
        self
    }
}

impl fmt::Debug for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSpec")
            .field("selectors", &self.selectors)
            .field("init", &self.init.is_some())
            .field("on_viewload", &self.on_viewload.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

// ============================================================================
// ModuleGroup
// ============================================================================

/// The modules registered from one [`GroupSpec`].
#[derive(Debug)]
pub struct ModuleGroup {
    /// Member handles, in selector order.
    modules: Vec<Module>,
}

impl ModuleGroup {
    /// Registers one module per selector, sharing the group's behavior.
    ///
    /// A member that fails to register (duplicate identity, invalid
    /// selector) is logged and skipped; the rest of the group still
    /// registers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the spec names no selectors.
    pub fn register(manager: &Arc<ModuleManager>, spec: GroupSpec) -> Result<Self> {
        if spec.selectors.is_empty() {
            return Err(Error::config("a module group needs at least one selector"));
        }

        let mut modules = Vec::with_capacity(spec.selectors.len());
        for selector in &spec.selectors {
            let mut member = ModuleSpec::for_selector(selector);

            if let Some(init) = &spec.init {
                let init = Arc::clone(init);
                member = member.with_init(move || init());
            }
            if let Some(hook) = &spec.on_viewload {
                let hook = Arc::clone(hook);
                member = member.on_viewload(move |anchor| hook(anchor));
            }
            if let Some(hook) = &spec.on_message {
                let hook = Arc::clone(hook);
                member = member.on_message(move |envelope| hook(envelope));
            }

            match manager.register(member) {
                Ok(module) => modules.push(module),
                Err(error) => warn!(selector = %selector, %error, "group member skipped"),
            }
        }

        Ok(Self { modules })
    }

    /// Returns the member handles.
    #[inline]
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Returns the number of registered members.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no member registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterates over the member handles.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
