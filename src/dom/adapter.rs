//! DOM adapter trait and anchor handles.
//!
//! A [`DomAdapter`] is the bus's only window onto the document. Production
//! code backs it with whatever owns the page (a webview bridge, a browser
//! extension, a server-side renderer); tests use the in-memory
//! [`StaticDom`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;

// ============================================================================
// AnchorRef
// ============================================================================

/// Handle to a module's DOM anchor node.
///
/// The DOM owns the node; this is a lookup handle only. An anchor is set on
/// a module if and only if the module is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorRef {
    /// Selector the anchor was resolved from.
    selector: String,

    /// Adapter-assigned node handle.
    node: u64,
}

impl AnchorRef {
    /// Creates an anchor handle.
    #[inline]
    #[must_use]
    pub fn new(selector: impl Into<String>, node: u64) -> Self {
        Self {
            selector: selector.into(),
            node,
        }
    }

    /// Returns the selector the anchor was resolved from.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Returns the adapter-assigned node handle.
    #[inline]
    #[must_use]
    pub fn node(&self) -> u64 {
        self.node
    }
}

// ============================================================================
// DomAdapter
// ============================================================================

/// Read-only view of the document consumed by readiness detection.
#[async_trait]
pub trait DomAdapter: Send + Sync {
    /// Resolves a selector to its anchor node, if present.
    async fn query(&self, selector: &str) -> Option<AnchorRef>;

    /// Returns `true` once the surrounding page has finished loading.
    ///
    /// Consulted by the manager's fallback watchdog; a page that is loaded
    /// while modules are still missing is what triggers forced readiness.
    async fn page_loaded(&self) -> bool;
}

// ============================================================================
// StaticDom
// ============================================================================

/// In-memory [`DomAdapter`] for tests and demos.
///
/// Selectors "appear" when [`StaticDom::attach`] is called, mimicking
/// deferred rendering.
///
/// # Example
///
/// ```
/// use modnet::StaticDom;
///
/// let dom = StaticDom::new();
/// dom.attach("#sidebar");
/// dom.finish_loading();
/// ```
#[derive(Debug, Default)]
pub struct StaticDom {
    /// Attached selectors and their node handles.
    nodes: RwLock<FxHashMap<String, u64>>,

    /// Whether the page reports loaded.
    loaded: AtomicBool,

    /// Next node handle to assign.
    next_node: AtomicU64,
}

impl StaticDom {
    /// Creates an empty document with the page still loading.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a node for `selector`, returning its anchor handle.
    ///
    /// Attaching an already-present selector keeps the existing node.
    pub fn attach(&self, selector: impl Into<String>) -> AnchorRef {
        let selector = selector.into();
        let mut nodes = self.nodes.write();
        let node = *nodes
            .entry(selector.clone())
            .or_insert_with(|| self.next_node.fetch_add(1, Ordering::Relaxed) + 1);
        AnchorRef::new(selector, node)
    }

    /// Detaches the node for `selector`, if any.
    pub fn detach(&self, selector: &str) {
        self.nodes.write().remove(selector);
    }

    /// Marks the page as finished loading.
    pub fn finish_loading(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DomAdapter for StaticDom {
    async fn query(&self, selector: &str) -> Option<AnchorRef> {
        let nodes = self.nodes.read();
        nodes
            .get(selector)
            .map(|node| AnchorRef::new(selector, *node))
    }

    async fn page_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Tests
// ============================================================================
