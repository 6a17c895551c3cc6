//! Dialog and popup presentation.
//!
//! A [`Presenter`] gives one module an overlay surface anchored at its DOM
//! node. The widgetry itself lives behind [`OverlayService`]; the
//! presenter only enforces that the module is ready before anything is
//! shown.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::dom::AnchorRef;
use crate::error::{Error, Result};
use crate::module::Module;

// ============================================================================
// OverlayService
// ============================================================================

/// External overlay/dialog widget service.
pub trait OverlayService: Send + Sync {
    /// Shows the overlay anchored at `anchor`.
    ///
    /// # Errors
    ///
    /// Implementations report widget failures as [`Error::Callback`].
    fn show(&self, anchor: &AnchorRef) -> Result<()>;

    /// Hides the overlay anchored at `anchor`.
    ///
    /// # Errors
    ///
    /// Implementations report widget failures as [`Error::Callback`].
    fn hide(&self, anchor: &AnchorRef) -> Result<()>;

    /// Applies widget attributes (title, content, dimensions, ...) as a
    /// JSON object.
    ///
    /// # Errors
    ///
    /// Implementations report widget failures as [`Error::Callback`].
    fn set_attributes(&self, anchor: &AnchorRef, attributes: &Value) -> Result<()>;
}

// ============================================================================
// Presenter
// ============================================================================

/// Presentation capability for one module.
///
/// # Example
///
/// ```ignore
/// let presenter = Presenter::new(module.clone(), overlay);
/// presenter.set_attributes(&serde_json::json!({
///     "title": "Confirm",
///     "width": 400,
/// }))?;
/// presenter.show()?;
/// ```
pub struct Presenter {
    /// The presented module.
    module: Module,

    /// The overlay widget service.
    service: Arc<dyn OverlayService>,
}

impl Presenter {
    /// Creates a presenter for `module` backed by `service`.
    #[must_use]
    pub fn new(module: Module, service: Arc<dyn OverlayService>) -> Self {
        Self { module, service }
    }

    /// Returns the presented module.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Shows the overlay at the module's anchor.
    ///
    /// # Errors
    ///
    /// - [`Error::ModuleNotReady`] if the module's view is not located yet
    /// - Whatever the overlay service reports
    pub fn show(&self) -> Result<()> {
        let anchor = self.anchor()?;
        debug!(module = %self.module.id(), "showing overlay");
        self.service.show(&anchor)
    }

    /// Hides the overlay at the module's anchor.
    ///
    /// # Errors
    ///
    /// Same as [`Presenter::show`].
    pub fn hide(&self) -> Result<()> {
        let anchor = self.anchor()?;
        debug!(module = %self.module.id(), "hiding overlay");
        self.service.hide(&anchor)
    }

    /// Applies widget attributes at the module's anchor.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `attributes` is not a JSON object
    /// - [`Error::ModuleNotReady`] if the module's view is not located yet
    /// - Whatever the overlay service reports
    pub fn set_attributes(&self, attributes: &Value) -> Result<()> {
        if !attributes.is_object() {
            return Err(Error::config("overlay attributes must be a JSON object"));
        }
        let anchor = self.anchor()?;
        self.service.set_attributes(&anchor, attributes)
    }

    /// Resolves the module's anchor or reports it not ready.
    fn anchor(&self) -> Result<AnchorRef> {
        self.module
            .anchor()
            .ok_or_else(|| Error::module_not_ready(self.module.id().clone()))
    }
}

impl fmt::Debug for Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presenter")
            .field("module", &self.module)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::bus::manager::ModuleManager;
    use crate::bus::options::BusOptions;
    use crate::dom::adapter::StaticDom;
    use crate::module::ModuleSpec;

    #[derive(Default)]
    struct RecordingOverlay {
        calls: Mutex<Vec<String>>,
    }

    impl OverlayService for RecordingOverlay {
        fn show(&self, anchor: &AnchorRef) -> Result<()> {
            self.calls.lock().push(format!("show {}", anchor.selector()));
            Ok(())
        }

        fn hide(&self, anchor: &AnchorRef) -> Result<()> {
            self.calls.lock().push(format!("hide {}", anchor.selector()));
            Ok(())
        }

        fn set_attributes(&self, anchor: &AnchorRef, attributes: &Value) -> Result<()> {
            self.calls
                .lock()
                .push(format!("attrs {} {}", anchor.selector(), attributes));
            Ok(())
        }
    }

    async fn ready_module() -> (Arc<ModuleManager>, Module) {
        let dom = Arc::new(StaticDom::new());
        dom.attach("#dialog");
        let manager = ModuleManager::with_options(
            Arc::clone(&dom) as _,
            BusOptions::new().with_probe_interval(std::time::Duration::from_millis(5)),
        );
        let module = manager
            .register(ModuleSpec::for_selector("#dialog"))
            .expect("register");
        manager.start_all();
        while !module.is_ready() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        (manager, module)
    }

    #[tokio::test]
    async fn test_show_and_hide_route_to_service() {
        let (_manager, module) = ready_module().await;
        let overlay = Arc::new(RecordingOverlay::default());
        let presenter = Presenter::new(module, Arc::clone(&overlay) as _);

        presenter.show().expect("show");
        presenter.hide().expect("hide");

        let calls = overlay.calls.lock().clone();
        assert_eq!(calls, vec!["show #dialog", "hide #dialog"]);
    }

    #[tokio::test]
    async fn test_show_requires_ready_module() {
        let manager =
            ModuleManager::with_options(Arc::new(StaticDom::new()) as _, BusOptions::new());
        let module = manager
            .register(ModuleSpec::for_selector("#dialog"))
            .expect("register");

        let presenter = Presenter::new(module, Arc::new(RecordingOverlay::default()) as _);
        let err = presenter.show().expect_err("not ready");
        assert!(matches!(err, Error::ModuleNotReady { .. }));
    }

    #[tokio::test]
    async fn test_set_attributes_requires_object() {
        let (_manager, module) = ready_module().await;
        let presenter = Presenter::new(module, Arc::new(RecordingOverlay::default()) as _);

        let err = presenter
            .set_attributes(&json!("not an object"))
            .expect_err("attributes must be an object");
        assert!(err.is_config_error());

        presenter
            .set_attributes(&json!({"title": "Confirm", "width": 400}))
            .expect("object attributes accepted");
    }
}
