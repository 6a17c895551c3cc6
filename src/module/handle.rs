//! Module handle.
//!
//! A [`Module`] is a lightweight handle onto one registered page region:
//! the identity plus a reference to the owning manager. Handles are cheap
//! to clone; the registry entry itself lives in the manager and outlives
//! any handle.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::bus::manager::ModuleManager;
use crate::dom::AnchorRef;
use crate::error::Result;
use crate::identifiers::ModuleId;
use crate::message::{DispatchReport, DoneFn, Envelope};
use crate::module::spec::ModuleState;

// ============================================================================
// Module
// ============================================================================

/// Handle to a registered module.
///
/// `broadcast` and `listen` are thin forwarders to the manager under this
/// module's identity.
#[derive(Clone)]
pub struct Module {
    /// This module's identity.
    id: ModuleId,

    /// The owning manager.
    manager: Arc<ModuleManager>,
}

impl Module {
    /// Creates a handle; only the manager constructs these.
    pub(crate) fn new(id: ModuleId, manager: Arc<ModuleManager>) -> Self {
        Self { id, manager }
    }

    /// Returns this module's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Returns the owning manager.
    #[inline]
    #[must_use]
    pub fn manager(&self) -> &Arc<ModuleManager> {
        &self.manager
    }

    /// Returns this module's lifecycle state.
    #[must_use]
    pub fn state(&self) -> ModuleState {
        self.manager
            .module_state(&self.id)
            .unwrap_or(ModuleState::Init)
    }

    /// Returns `true` once this module's view is safe to interact with.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == ModuleState::Ready
    }

    /// Returns this module's anchor handle, if ready.
    #[must_use]
    pub fn anchor(&self) -> Option<AnchorRef> {
        self.manager.module_anchor(&self.id)
    }

    /// Begins readiness tracking for this module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleNotFound`](crate::Error::ModuleNotFound) if
    /// the module was somehow removed from the registry.
    pub fn start(&self) -> Result<()> {
        self.manager.start(&self.id)
    }

    /// Broadcasts a message under this module's identity.
    ///
    /// Returns the delivery report when the network is ready, `None` when
    /// the broadcast was queued.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedLabel`](crate::Error::MalformedLabel) if the
    ///   label does not parse
    /// - [`Error::ImpersonatedLabel`](crate::Error::ImpersonatedLabel) if
    ///   the label names a different sender
    pub fn broadcast(&self, label: &str, payload: Value) -> Result<Option<DispatchReport>> {
        self.manager
            .add_broadcaster(self.id.clone(), label, payload, None)
    }

    /// Like [`Module::broadcast`], with a completion callback that receives
    /// the delivery report at dispatch time.
    ///
    /// # Errors
    ///
    /// Same as [`Module::broadcast`].
    pub fn broadcast_with(
        &self,
        label: &str,
        payload: Value,
        done: DoneFn,
    ) -> Result<Option<DispatchReport>> {
        self.manager
            .add_broadcaster(self.id.clone(), label, payload, Some(done))
    }

    /// Registers a listener under this module's identity.
    ///
    /// Re-registering the same label overwrites the prior handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLabel`](crate::Error::MalformedLabel) if
    /// the label does not parse.
    pub fn listen<F>(&self, label: &str, handler: F) -> Result<()>
    where
        F: Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    {
        self.manager.add_listener(self.id.clone(), label, handler)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("state", &self.state())
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

    use crate::bus::options::BusOptions;
    use crate::dom::adapter::StaticDom;
    use crate::module::spec::ModuleSpec;

    fn test_manager() -> Arc<ModuleManager> {
        ModuleManager::with_options(Arc::new(StaticDom::new()) as _, BusOptions::new())
    }

    #[tokio::test]
    async fn test_clones_share_identity() {
        let manager = test_manager();
        let module = manager
            .register(ModuleSpec::new("panel"))
            .expect("register");
        let clone = module.clone();

        assert_eq!(module.id(), clone.id());
        assert_eq!(clone.state(), ModuleState::Init);
    }

    #[tokio::test]
    async fn test_broadcast_with_done_after_ready() {
        let manager = test_manager();
        let module = manager
            .register(ModuleSpec::new("panel"))
            .expect("register");
        manager.start_all();

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let report = module
            .broadcast_with(
                "ping",
                json!(null),
                Box::new(move |report| *sink.lock() = Some(report.delivered_count())),
            )
            .expect("broadcast")
            .expect("dispatched immediately");

        assert_eq!(report.delivered_count(), 0);
        assert_eq!(*seen.lock(), Some(0));
    }

    #[tokio::test]
    async fn test_listen_forwards_identity() {
        let manager = test_manager();
        let panel = manager
            .register(ModuleSpec::new("panel"))
            .expect("register panel");
        let other = manager
            .register(ModuleSpec::new("other"))
            .expect("register other");
        manager.start_all();

        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&hits);
        panel
            .listen("other:ping", move |envelope| {
                sink.lock().push(envelope.sender.clone());
                Ok(())
            })
            .expect("listener");

        other.broadcast("ping", json!(null)).expect("broadcast");

        let senders = hits.lock().clone();
        assert_eq!(senders.len(), 1);
        assert_eq!(senders[0].as_str(), "other");
    }
}
