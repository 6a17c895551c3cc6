//! Module registry, readiness tracking, and message dispatch.
//!
//! One [`ModuleManager`] coordinates a page's module network. It is an
//! explicit context object owned by the composition root and shared via
//! `Arc`; there is no hidden global instance.
//!
//! # Readiness
//!
//! Each started module with a view gets a polling [`ReadinessProbe`]; a
//! manager-wide watchdog forces the network ready once its budget runs out
//! on a loaded page, so a single missing view cannot starve cross-module
//! communication forever.
//!
//! # Dispatch
//!
//! Listener tables are keyed by [`Label`]; a qualified `sender:name` key
//! beats the bare `name` key for the same subscriber. Handler failures are
//! logged per subscriber and never abort delivery to the rest.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bus::options::BusOptions;
use crate::dom::adapter::{AnchorRef, DomAdapter};
use crate::dom::probe::{ProbeState, ReadinessProbe};
use crate::error::{Error, Result};
use crate::identifiers::ModuleId;
use crate::message::{DispatchReport, DoneFn, Envelope, Label, ListenerFn};
use crate::module::handle::Module;
use crate::module::spec::{MessageFn, ModuleSpec, ModuleState, ViewloadFn};

// ============================================================================
// Internal State
// ============================================================================

/// Registry entry for one module.
struct ModuleEntry {
    /// Anchor selector, if the module has a view.
    selector: Option<String>,

    /// Lifecycle state; `Ready` is terminal.
    state: ModuleState,

    /// Anchor handle; set if and only if `state == Ready` and the module
    /// has a view.
    anchor: Option<AnchorRef>,

    /// `viewload` observer.
    on_viewload: Option<ViewloadFn>,

    /// `message` observer.
    on_message: Option<MessageFn>,

    /// Whether readiness tracking has begun.
    started: bool,
}

/// A broadcast issued before the network was ready.
struct PendingBroadcast {
    sender: ModuleId,
    label: Label,
    payload: Value,
    done: Option<DoneFn>,
}

/// Network readiness flag and the pre-readiness queue, guarded together so
/// the queue is drained exactly once and never refilled.
struct ReadyGate {
    ready: bool,
    queue: VecDeque<PendingBroadcast>,
}

// ============================================================================
// ModuleManager
// ============================================================================

/// Coordination context for a page's module network.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use modnet::{ModuleManager, ModuleSpec, StaticDom};
///
/// # fn demo() -> modnet::Result<()> {
/// let dom = Arc::new(StaticDom::new());
/// let manager = ModuleManager::new(dom);
///
/// let foo = manager.register(ModuleSpec::for_selector("#foo"))?;
/// let bar = manager.register(ModuleSpec::for_selector("#bar"))?;
///
/// bar.listen("say-hello", |envelope| {
///     println!("{} says {}", envelope.sender, envelope.payload);
///     Ok(())
/// })?;
///
/// manager.start_all();
/// foo.broadcast("say-hello", serde_json::json!("hi"))?;
/// # Ok(())
/// # }
/// ```
pub struct ModuleManager {
    /// DOM boundary used by probes and the watchdog.
    adapter: Arc<dyn DomAdapter>,

    /// Timing configuration.
    options: BusOptions,

    /// Registered modules by identity.
    modules: RwLock<FxHashMap<ModuleId, ModuleEntry>>,

    /// Listener tables by subscriber identity (wildcard included).
    listeners: RwLock<FxHashMap<ModuleId, FxHashMap<Label, Arc<ListenerFn>>>>,

    /// Readiness flag plus pre-readiness broadcast queue.
    gate: Mutex<ReadyGate>,

    /// Modules started but not yet ready.
    outstanding: AtomicUsize,

    /// Live readiness probes by module identity.
    probes: Mutex<FxHashMap<ModuleId, ReadinessProbe>>,

    /// Fallback watchdog task, spawned once.
    watchdog: Mutex<Option<JoinHandle<()>>>,
}

// ============================================================================
// ModuleManager - Constructors
// ============================================================================

impl ModuleManager {
    /// Creates a manager with default options.
    #[must_use]
    pub fn new(adapter: Arc<dyn DomAdapter>) -> Arc<Self> {
        Self::with_options(adapter, BusOptions::default())
    }

    /// Creates a manager with explicit options.
    #[must_use]
    pub fn with_options(adapter: Arc<dyn DomAdapter>, options: BusOptions) -> Arc<Self> {
        Arc::new(Self {
            adapter,
            options,
            modules: RwLock::new(FxHashMap::default()),
            listeners: RwLock::new(FxHashMap::default()),
            gate: Mutex::new(ReadyGate {
                ready: false,
                queue: VecDeque::new(),
            }),
            outstanding: AtomicUsize::new(0),
            probes: Mutex::new(FxHashMap::default()),
            watchdog: Mutex::new(None),
        })
    }
}

// ============================================================================
// ModuleManager - Registration
// ============================================================================

impl ModuleManager {
    /// Registers a module and runs its initializer.
    ///
    /// An initializer failure is logged; the module stays registered so one
    /// bad module cannot break the network.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the identity is empty or the reserved `"*"`
    /// - [`Error::DuplicateModule`] if the identity is already registered
    pub fn register(self: &Arc<Self>, spec: ModuleSpec) -> Result<Module> {
        let (id, selector, init, on_viewload, on_message) = spec.into_parts();
        let id = ModuleId::new(id)?;

        if id.is_wildcard() {
            let err = Error::config("the identity \"*\" is reserved for the manager");
            warn!(error = %err, "registration rejected");
            return Err(err);
        }

        {
            let mut modules = self.modules.write();
            if modules.contains_key(&id) {
                let err = Error::duplicate_module(id);
                warn!(error = %err, "registration rejected");
                return Err(err);
            }
            modules.insert(
                id.clone(),
                ModuleEntry {
                    selector,
                    state: ModuleState::Init,
                    anchor: None,
                    on_viewload,
                    on_message,
                    started: false,
                },
            );
        }

        debug!(module = %id, "module registered");

        if let Some(init) = init
            && let Err(error) = init()
        {
            error!(module = %id, %error, "initializer failed; module stays registered");
        }

        Ok(Module::new(id, Arc::clone(self)))
    }
}

// ============================================================================
// ModuleManager - Readiness
// ============================================================================

impl ModuleManager {
    /// Begins readiness tracking for one module.
    ///
    /// A module without a view is ready immediately. A module with a view
    /// gets a polling probe; the module joins the outstanding count until
    /// its anchor appears. Starting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleNotFound`] if the identity is not registered.
    pub fn start(self: &Arc<Self>, id: &ModuleId) -> Result<()> {
        if let Some(selector) = self.begin_tracking(id)? {
            self.spawn_probe(id, selector);
        }
        self.ensure_watchdog();
        Ok(())
    }

    /// Begins readiness tracking for every registered module.
    ///
    /// The outstanding count covers every pending view before the first
    /// probe runs, so an early anchor cannot complete the network while
    /// later modules are still joining. If no view is outstanding
    /// afterwards, the network is ready on the spot.
    pub fn start_all(self: &Arc<Self>) {
        info!(modules = self.module_count(), "starting module network");

        let ids: Vec<ModuleId> = self.modules.read().keys().cloned().collect();
        let mut probes = Vec::new();
        for id in ids {
            match self.begin_tracking(&id) {
                Ok(Some(selector)) => probes.push((id, selector)),
                Ok(None) => {}
                Err(error) => warn!(module = %id, %error, "start failed"),
            }
        }

        for (id, selector) in probes {
            self.spawn_probe(&id, selector);
        }

        self.ensure_watchdog();

        if self.outstanding.load(Ordering::SeqCst) == 0 {
            self.mark_network_ready("no module views outstanding");
        }
    }

    /// Marks a module started and claims its slot in the outstanding
    /// count. Returns the selector to probe, if the module has a pending
    /// view.
    fn begin_tracking(&self, id: &ModuleId) -> Result<Option<String>> {
        let mut modules = self.modules.write();
        let entry = modules
            .get_mut(id)
            .ok_or_else(|| Error::module_not_found(id.clone()))?;

        if entry.started {
            return Ok(None);
        }
        entry.started = true;

        if entry.state == ModuleState::Ready {
            return Ok(None);
        }
        if let Some(selector) = entry.selector.clone() {
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            return Ok(Some(selector));
        }

        entry.state = ModuleState::Ready;
        debug!(module = %id, "module has no view; ready immediately");
        Ok(None)
    }

    /// Spawns the readiness probe for one pending view.
    fn spawn_probe(self: &Arc<Self>, id: &ModuleId, selector: String) {
        let manager = Arc::clone(self);
        let module_id = id.clone();
        let probe = ReadinessProbe::spawn(
            Arc::clone(&self.adapter),
            selector,
            self.options.probe_interval,
            self.options.probe_retries,
            Box::new(move |anchor| manager.anchor_found(&module_id, anchor)),
        );
        self.probes.lock().insert(id.clone(), probe);
    }

    /// Records a located anchor, fires `viewload`, and completes network
    /// readiness when this was the last outstanding module.
    fn anchor_found(&self, id: &ModuleId, anchor: AnchorRef) {
        let hook = {
            let mut modules = self.modules.write();
            let Some(entry) = modules.get_mut(id) else {
                return;
            };
            if entry.state == ModuleState::Ready {
                return;
            }
            entry.state = ModuleState::Ready;
            entry.anchor = Some(anchor.clone());
            entry.on_viewload.clone()
        };

        debug!(module = %id, selector = anchor.selector(), "module view loaded");

        if let Some(hook) = hook
            && let Err(error) = hook(&anchor)
        {
            warn!(module = %id, %error, "viewload observer failed");
        }

        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.mark_network_ready("all module views loaded");
        }
    }

    /// Spawns the fallback watchdog if it is not running yet.
    fn ensure_watchdog(self: &Arc<Self>) {
        let mut slot = self.watchdog.lock();
        if slot.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        *slot = Some(tokio::spawn(async move { manager.watchdog_loop().await }));
    }

    /// Fallback poll: forces readiness once the budget runs out on a loaded
    /// page, and unconditionally after twice the budget.
    async fn watchdog_loop(self: Arc<Self>) {
        let interval = self.options.watchdog_interval;
        let budget = self.options.watchdog_retries.max(1);
        let mut ticks = 0u32;

        loop {
            if self.is_ready() {
                return;
            }

            if self.outstanding.load(Ordering::SeqCst) == 0 {
                self.mark_network_ready("no module views outstanding");
                return;
            }

            ticks += 1;
            if ticks >= budget
                && (self.adapter.page_loaded().await || ticks >= budget.saturating_mul(2))
            {
                let laggards = self.unready_modules();
                warn!(
                    laggards = ?laggards.iter().map(ModuleId::as_str).collect::<Vec<_>>(),
                    ticks,
                    "readiness budget exhausted; forcing network ready"
                );
                self.mark_network_ready("watchdog fallback");
                return;
            }

            sleep(interval).await;
        }
    }

    /// Flips the network ready and flushes the queue strictly FIFO.
    ///
    /// The flag and the queue swap happen under one guard, so no broadcast
    /// can slip into an already-drained queue.
    fn mark_network_ready(&self, reason: &str) {
        let drained = {
            let mut gate = self.gate.lock();
            if gate.ready {
                return;
            }
            gate.ready = true;
            std::mem::take(&mut gate.queue)
        };

        info!(reason, flushed = drained.len(), "module network ready");

        for pending in drained {
            let report = self.dispatch(&pending.sender, pending.label.name(), &pending.payload);
            if let Some(done) = pending.done {
                done(&report);
            }
        }
    }
}

// ============================================================================
// ModuleManager - Messaging
// ============================================================================

impl ModuleManager {
    /// Registers a listener for `subscriber` under `label`.
    ///
    /// Re-registering the same label overwrites the prior handler. The
    /// subscriber does not have to be a registered module; the wildcard
    /// identity registers a manager-level listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedLabel`] if the label does not parse.
    pub fn add_listener<F>(&self, subscriber: ModuleId, label: &str, handler: F) -> Result<()>
    where
        F: Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    {
        let label = Label::parse(label)?;
        let handler: Arc<ListenerFn> = Arc::new(handler);

        let mut listeners = self.listeners.write();
        let table = listeners.entry(subscriber.clone()).or_default();
        let replaced = table.insert(label.clone(), handler).is_some();

        debug!(subscriber = %subscriber, label = %label, replaced, "listener registered");
        Ok(())
    }

    /// Routes a broadcast from `sender` through the bus.
    ///
    /// Dispatches immediately when the network is ready, returning the
    /// delivery report; queues FIFO otherwise and returns `None`. The
    /// optional `done` callback receives the report either way, at dispatch
    /// time.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedLabel`] if the label does not parse
    /// - [`Error::ImpersonatedLabel`] if the label's sender prefix does not
    ///   match `sender`
    pub fn add_broadcaster(
        &self,
        sender: ModuleId,
        label: &str,
        payload: Value,
        done: Option<DoneFn>,
    ) -> Result<Option<DispatchReport>> {
        let parsed = Label::parse(label)?;
        if let Some(prefix) = parsed.sender()
            && *prefix != sender
        {
            let err = Error::impersonated_label(label, sender);
            warn!(error = %err, "broadcast rejected");
            return Err(err);
        }
        let label = parsed.qualify(&sender);

        {
            let mut gate = self.gate.lock();
            if !gate.ready {
                debug!(
                    sender = %sender,
                    label = %label,
                    queued = gate.queue.len() + 1,
                    "network not ready; broadcast queued"
                );
                gate.queue.push_back(PendingBroadcast {
                    sender,
                    label,
                    payload,
                    done,
                });
                return Ok(None);
            }
        }

        let report = self.dispatch(&sender, label.name(), &payload);
        if let Some(done) = done {
            done(&report);
        }
        Ok(Some(report))
    }

    /// Broadcasts under the manager's wildcard identity.
    ///
    /// # Errors
    ///
    /// Same as [`ModuleManager::add_broadcaster`].
    pub fn broadcast(&self, label: &str, payload: Value) -> Result<Option<DispatchReport>> {
        self.add_broadcaster(ModuleId::wildcard(), label, payload, None)
    }

    /// Registers a manager-level listener matching any sender.
    ///
    /// # Errors
    ///
    /// Same as [`ModuleManager::add_listener`].
    pub fn listen<F>(&self, label: &str, handler: F) -> Result<()>
    where
        F: Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    {
        self.add_listener(ModuleId::wildcard(), label, handler)
    }

    /// Fan-out dispatch of one message.
    ///
    /// For each subscriber the qualified `sender:name` key wins over the
    /// bare `name` key. Handler failures are logged and skipped; successful
    /// deliveries fire the target module's `message` observer (wildcard
    /// excluded).
    fn dispatch(&self, sender: &ModuleId, name: &str, payload: &Value) -> DispatchReport {
        let qualified = Label::from_parts(Some(sender.clone()), name.to_string());
        let bare = Label::from_parts(None, name.to_string());

        // Handlers are invoked outside the listener lock, so a handler may
        // itself call listen/broadcast.
        let matched: Vec<(ModuleId, Arc<ListenerFn>)> = {
            let listeners = self.listeners.read();
            listeners
                .iter()
                .filter_map(|(subscriber, table)| {
                    table
                        .get(&qualified)
                        .or_else(|| table.get(&bare))
                        .map(|handler| (subscriber.clone(), Arc::clone(handler)))
                })
                .collect()
        };

        let envelope = Envelope::new(name, sender.clone(), payload.clone());
        let mut delivered = Vec::with_capacity(matched.len());

        for (subscriber, handler) in matched {
            if let Err(error) = handler(&envelope) {
                error!(subscriber = %subscriber, %error, "listener failed; continuing dispatch");
                continue;
            }
            if !subscriber.is_wildcard() {
                self.notify_message(&subscriber, &envelope);
            }
            delivered.push(subscriber);
        }

        debug!(
            sender = %sender,
            label = name,
            delivered = ?delivered.iter().map(ModuleId::as_str).collect::<Vec<_>>(),
            "dispatch complete"
        );

        DispatchReport {
            label: name.to_string(),
            sender: sender.clone(),
            delivered,
        }
    }

    /// Fires the `message` observer of a delivered-to module, if any.
    fn notify_message(&self, subscriber: &ModuleId, envelope: &Envelope) {
        let hook = {
            let modules = self.modules.read();
            modules
                .get(subscriber)
                .and_then(|entry| entry.on_message.clone())
        };

        if let Some(hook) = hook
            && let Err(error) = hook(envelope)
        {
            warn!(module = %subscriber, %error, "message observer failed");
        }
    }
}

// ============================================================================
// ModuleManager - Inspection
// ============================================================================

impl ModuleManager {
    /// Returns `true` once the module network is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gate.lock().ready
    }

    /// Returns the number of registered modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.read().len()
    }

    /// Returns the number of broadcasts waiting for network readiness.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.gate.lock().queue.len()
    }

    /// Returns a module's lifecycle state.
    #[must_use]
    pub fn module_state(&self, id: &ModuleId) -> Option<ModuleState> {
        self.modules.read().get(id).map(|entry| entry.state)
    }

    /// Returns a module's anchor handle, if ready.
    #[must_use]
    pub fn module_anchor(&self, id: &ModuleId) -> Option<AnchorRef> {
        self.modules.read().get(id).and_then(|entry| entry.anchor.clone())
    }

    /// Returns the state of a module's readiness probe, if one was spawned.
    #[must_use]
    pub fn probe_state(&self, id: &ModuleId) -> Option<ProbeState> {
        self.probes.lock().get(id).map(ReadinessProbe::state)
    }

    /// Returns the identities of started modules that are not ready.
    #[must_use]
    pub fn unready_modules(&self) -> Vec<ModuleId> {
        self.modules
            .read()
            .iter()
            .filter(|(_, entry)| entry.started && entry.state != ModuleState::Ready)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use parking_lot::Mutex as ParkingMutex;
    use serde_json::json;

    use crate::dom::adapter::StaticDom;

    const TICK: Duration = Duration::from_millis(5);

    fn fast_options() -> BusOptions {
        BusOptions::new()
            .with_probe_interval(TICK)
            .with_probe_retries(200)
            .with_watchdog_interval(TICK)
            .with_watchdog_retries(3)
    }

    fn test_bus() -> (Arc<StaticDom>, Arc<ModuleManager>) {
        let dom = Arc::new(StaticDom::new());
        let manager = ModuleManager::with_options(Arc::clone(&dom) as _, fast_options());
        (dom, manager)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            sleep(TICK).await;
        }
        panic!("condition not met within budget");
    }

    fn record_into(log: &Arc<ParkingMutex<Vec<String>>>, tag: &str) -> impl Fn(&Envelope) -> Result<()> + use<> {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        move |envelope| {
            log.lock().push(format!(
                "{tag}:{}:{}:{}",
                envelope.label, envelope.sender, envelope.payload
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_rejected() {
        let (_dom, manager) = test_bus();

        manager
            .register(ModuleSpec::for_selector("#foo"))
            .expect("first registration");
        let err = manager
            .register(ModuleSpec::for_selector("#foo"))
            .expect_err("duplicate registration");

        assert!(matches!(err, Error::DuplicateModule { .. }));
        assert_eq!(manager.module_count(), 1);
    }

    #[tokio::test]
    async fn test_register_wildcard_rejected() {
        let (_dom, manager) = test_bus();
        let err = manager
            .register(ModuleSpec::new("*"))
            .expect_err("wildcard registration");
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_failing_initializer_still_registers() {
        let (_dom, manager) = test_bus();

        let module = manager
            .register(
                ModuleSpec::for_selector("#foo")
                    .with_init(|| Err(Error::callback("init exploded"))),
            )
            .expect("registration survives init failure");

        assert_eq!(manager.module_count(), 1);
        assert_eq!(module.state(), ModuleState::Init);
    }

    #[tokio::test]
    async fn test_readiness_monotonic_and_anchor_iff_ready() {
        let (dom, manager) = test_bus();
        let foo = manager
            .register(ModuleSpec::for_selector("#foo"))
            .expect("register");

        manager.start_all();
        assert!(!foo.is_ready());
        assert!(foo.anchor().is_none());

        dom.attach("#foo");
        wait_until(|| foo.is_ready()).await;

        assert!(foo.anchor().is_some());
        assert_eq!(foo.state(), ModuleState::Ready);

        // Detaching the node later does not revert readiness.
        dom.detach("#foo");
        sleep(TICK * 4).await;
        assert!(foo.is_ready());
        assert!(foo.anchor().is_some());
    }

    #[tokio::test]
    async fn test_viewless_network_ready_on_start_all() {
        let (_dom, manager) = test_bus();
        manager
            .register(ModuleSpec::new("state-holder"))
            .expect("register");

        manager.start_all();
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_fifo_queue_flush() {
        let (dom, manager) = test_bus();
        let foo = manager
            .register(ModuleSpec::for_selector("#foo"))
            .expect("register");

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        manager
            .add_listener(
                ModuleId::new("#sink").expect("valid id"),
                "tick",
                record_into(&log, "sink"),
            )
            .expect("listener");

        for n in 1..=3 {
            let queued = foo
                .broadcast("tick", json!(n))
                .expect("broadcast accepted");
            assert!(queued.is_none(), "pre-readiness broadcast must queue");
        }
        assert_eq!(manager.pending_count(), 3);

        dom.attach("#foo");
        manager.start_all();
        wait_until(|| manager.is_ready()).await;

        let entries = log.lock().clone();
        assert_eq!(
            entries,
            vec!["sink:tick:#foo:1", "sink:tick:#foo:2", "sink:tick:#foo:3"]
        );
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_qualified_label_precedence() {
        let (_dom, manager) = test_bus();
        let sender = manager
            .register(ModuleSpec::new("sender1"))
            .expect("register");
        manager.start_all();

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        let subscriber = ModuleId::new("#x").expect("valid id");
        manager
            .add_listener(subscriber.clone(), "ping", record_into(&log, "bare"))
            .expect("bare listener");
        manager
            .add_listener(subscriber, "sender1:ping", record_into(&log, "qualified"))
            .expect("qualified listener");

        sender.broadcast("ping", json!(null)).expect("broadcast");

        let entries = log.lock().clone();
        assert_eq!(entries, vec!["qualified:ping:sender1:null"]);
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let (_dom, manager) = test_bus();
        let sender = manager.register(ModuleSpec::new("src")).expect("register");
        manager.start_all();

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        manager
            .add_listener(
                ModuleId::new("#a").expect("valid id"),
                "boom",
                record_into(&log, "a"),
            )
            .expect("listener a");
        manager
            .add_listener(ModuleId::new("#b").expect("valid id"), "boom", |_| {
                Err(Error::callback("listener b exploded"))
            })
            .expect("listener b");
        manager
            .add_listener(
                ModuleId::new("#c").expect("valid id"),
                "boom",
                record_into(&log, "c"),
            )
            .expect("listener c");

        let report = sender
            .broadcast("boom", json!(null))
            .expect("broadcast")
            .expect("dispatched");

        assert_eq!(report.delivered_count(), 2);
        let entries = log.lock().clone();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.starts_with("a:")));
        assert!(entries.iter().any(|e| e.starts_with("c:")));
    }

    #[tokio::test]
    async fn test_impersonation_guard() {
        let (_dom, manager) = test_bus();
        let foo = manager.register(ModuleSpec::new("foo")).expect("register");
        manager.start_all();

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        manager
            .add_listener(
                ModuleId::new("#sink").expect("valid id"),
                "bar:hello",
                record_into(&log, "sink"),
            )
            .expect("listener");

        let err = foo
            .broadcast("bar:hello", json!("hi"))
            .expect_err("impersonated broadcast");

        assert!(matches!(err, Error::ImpersonatedLabel { .. }));
        assert!(log.lock().is_empty(), "nothing may be dispatched");
        assert_eq!(manager.pending_count(), 0, "nothing may be queued");
    }

    #[tokio::test]
    async fn test_self_qualified_broadcast_allowed() {
        let (_dom, manager) = test_bus();
        let foo = manager.register(ModuleSpec::new("foo")).expect("register");
        manager.start_all();

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        manager
            .add_listener(
                ModuleId::new("#sink").expect("valid id"),
                "hello",
                record_into(&log, "sink"),
            )
            .expect("listener");

        foo.broadcast("foo:hello", json!("hi")).expect("broadcast");
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_liveness() {
        let (dom, manager) = test_bus();
        let fast = manager
            .register(ModuleSpec::for_selector("#fast"))
            .expect("register fast");
        manager
            .register(ModuleSpec::for_selector("#slow"))
            .expect("register slow");

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        manager
            .add_listener(
                ModuleId::new("#sink").expect("valid id"),
                "status",
                record_into(&log, "sink"),
            )
            .expect("listener");

        fast.broadcast("status", json!("pending"))
            .expect("broadcast queued");

        dom.attach("#fast");
        dom.finish_loading();
        manager.start_all();

        wait_until(|| manager.is_ready()).await;

        assert_eq!(log.lock().len(), 1, "queued broadcast flushed");
        let laggards = manager.unready_modules();
        assert_eq!(laggards.len(), 1);
        assert_eq!(laggards[0].as_str(), "#slow");
        assert!(
            manager.probe_state(&laggards[0]).is_some(),
            "the laggard's probe keeps running after the fallback"
        );

        // Post-fallback broadcasts for ready modules proceed normally.
        let report = fast
            .broadcast("status", json!("done"))
            .expect("broadcast")
            .expect("dispatched");
        assert_eq!(report.delivered_count(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_say_hello() {
        let (dom, manager) = test_bus();
        let foo = manager
            .register(ModuleSpec::for_selector("#foo"))
            .expect("register foo");
        let bar = manager
            .register(ModuleSpec::for_selector("#bar"))
            .expect("register bar");

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        bar.listen("say-hello", record_into(&log, "bar"))
            .expect("listener");

        let queued = foo
            .broadcast("say-hello", json!("hi"))
            .expect("broadcast accepted");
        assert!(queued.is_none());

        dom.attach("#foo");
        dom.attach("#bar");
        manager.start_all();
        wait_until(|| manager.is_ready()).await;

        let entries = log.lock().clone();
        assert_eq!(entries, vec!["bar:say-hello:#foo:\"hi\""]);
    }

    #[tokio::test]
    async fn test_wildcard_listener_and_message_observer() {
        let (dom, manager) = test_bus();

        let observer_hits = Arc::new(ParkingMutex::new(0usize));
        let observed = Arc::clone(&observer_hits);
        let bar = manager
            .register(ModuleSpec::for_selector("#bar").on_message(move |_| {
                *observed.lock() += 1;
                Ok(())
            }))
            .expect("register bar");
        let foo = manager.register(ModuleSpec::new("foo")).expect("register foo");

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        manager
            .listen("announce", record_into(&log, "manager"))
            .expect("wildcard listener");
        bar.listen("announce", record_into(&log, "bar"))
            .expect("module listener");

        dom.attach("#bar");
        manager.start_all();
        wait_until(|| manager.is_ready()).await;

        foo.broadcast("announce", json!(1)).expect("broadcast");

        assert_eq!(log.lock().len(), 2, "wildcard and module both receive");
        assert_eq!(
            *observer_hits.lock(),
            1,
            "message observer fires for the module, not the wildcard"
        );
    }

    #[tokio::test]
    async fn test_relisten_overwrites() {
        let (_dom, manager) = test_bus();
        let foo = manager.register(ModuleSpec::new("foo")).expect("register");
        manager.start_all();

        let log = Arc::new(ParkingMutex::new(Vec::new()));
        let subscriber = ModuleId::new("#sink").expect("valid id");
        manager
            .add_listener(subscriber.clone(), "ping", record_into(&log, "first"))
            .expect("first listener");
        manager
            .add_listener(subscriber, "ping", record_into(&log, "second"))
            .expect("second listener");

        foo.broadcast("ping", json!(null)).expect("broadcast");

        let entries = log.lock().clone();
        assert_eq!(entries, vec!["second:ping:foo:null"]);
    }

    #[tokio::test]
    async fn test_done_callback_runs_at_flush() {
        let (_dom, manager) = test_bus();
        manager.register(ModuleSpec::new("foo")).expect("register");

        let flushed = Arc::new(ParkingMutex::new(None));
        let sink = Arc::clone(&flushed);
        manager
            .add_broadcaster(
                ModuleId::new("foo").expect("valid id"),
                "late",
                json!(42),
                Some(Box::new(move |report| {
                    *sink.lock() = Some(report.delivered_count());
                })),
            )
            .expect("broadcast queued");

        assert!(flushed.lock().is_none(), "not dispatched yet");

        manager.start_all();
        assert!(manager.is_ready());
        assert_eq!(*flushed.lock(), Some(0));
    }

    #[tokio::test]
    async fn test_malformed_label_rejected() {
        let (_dom, manager) = test_bus();
        let foo = manager.register(ModuleSpec::new("foo")).expect("register");

        let err = foo.broadcast(":oops", json!(null)).expect_err("malformed");
        assert!(err.is_rejection());
    }
}
