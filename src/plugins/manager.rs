use super::{Plugin, PluginError, PluginFactory};
use crate::engine::events::{EngineEvent, PluginLifecycle};
use crate::models::{PluginOptions, PluginSpec};
use crate::plugins::context::{ContextSeed, PluginContext};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// One configured plugin.
///
/// `instance` is `Some` exactly while the plugin is initialized; the manager
/// is the only code that sets or clears it.
pub struct PluginDescriptor {
    name: String,
    enabled: bool,
    options: PluginOptions,
    instance: Option<Box<dyn Plugin>>,
    context: Option<PluginContext>,
}

impl PluginDescriptor {
    pub fn from_spec(spec: &PluginSpec) -> Self {
        Self {
            name: spec.name.clone(),
            enabled: spec.enabled,
            options: spec.options.clone(),
            instance: None,
            context: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.is_some()
    }

    pub fn instance(&self) -> Option<&(dyn Plugin + 'static)> {
        self.instance.as_deref()
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFailure {
    pub name: String,
    pub error: PluginError,
}

/// Result of a batch initialization. Never an error: failures are collected.
#[derive(Debug, Default)]
pub struct InitOutcome {
    pub initialized: Vec<String>,
    pub failures: Vec<PluginFailure>,
    /// Lifecycle events plus anything plugins published while initializing,
    /// in the order they happened. The caller emits them once its own state
    /// is consistent.
    pub events: Vec<EngineEvent>,
}

/// Result of enabling or disabling one plugin at runtime
#[derive(Debug, Default)]
pub struct PluginToggle {
    pub events: Vec<EngineEvent>,
    pub failure: Option<PluginError>,
}

/// Owns plugin instances and drives their lifecycle.
pub struct PluginManager {
    factory: Arc<dyn PluginFactory>,
    descriptors: Vec<PluginDescriptor>,
    init_order: Vec<String>,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("descriptors", &self.descriptors)
            .field("init_order", &self.init_order)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "plugin panicked".to_string()
    }
}

impl PluginManager {
    pub fn new(factory: Arc<dyn PluginFactory>) -> Self {
        Self {
            factory,
            descriptors: Vec::new(),
            init_order: Vec::new(),
        }
    }

    /// Replace the descriptor set, destroying anything still initialized.
    pub fn load(&mut self, specs: &[PluginSpec]) -> Vec<EngineEvent> {
        let events = self.destroy_all();
        self.descriptors = specs.iter().map(PluginDescriptor::from_spec).collect();
        events
    }

    pub fn descriptors(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&PluginDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// The live instance, if `name` is initialized. Never constructs one.
    pub fn get(&self, name: &str) -> Option<&(dyn Plugin + 'static)> {
        self.descriptor(name).and_then(PluginDescriptor::instance)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of initialized plugins, oldest first
    pub fn initialized(&self) -> &[String] {
        &self.init_order
    }

    /// Initialize every enabled, not yet initialized descriptor in declaration order.
    pub fn initialize_all(&mut self, seed: &ContextSeed) -> InitOutcome {
        let mut outcome = InitOutcome::default();
        let factory = Arc::clone(&self.factory);

        for descriptor in self.descriptors.iter_mut() {
            if !descriptor.enabled || descriptor.is_initialized() {
                continue;
            }
            match Self::initialize_one(descriptor, factory.as_ref(), seed) {
                Ok(deferred) => {
                    self.init_order.push(descriptor.name.clone());
                    outcome.initialized.push(descriptor.name.clone());
                    outcome
                        .events
                        .push(EngineEvent::PluginLifecycle(PluginLifecycle::initialized(
                            &descriptor.name,
                        )));
                    outcome.events.extend(deferred);
                }
                Err(error) => {
                    outcome
                        .events
                        .push(EngineEvent::PluginLifecycle(PluginLifecycle::failed(
                            &descriptor.name,
                            error.to_string(),
                        )));
                    outcome.failures.push(PluginFailure {
                        name: descriptor.name.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Plugins initialized: {} ok, {} failed",
            outcome.initialized.len(),
            outcome.failures.len()
        );
        outcome
    }

    /// Destroy every initialized plugin, newest first. Safe to call repeatedly.
    pub fn destroy_all(&mut self) -> Vec<EngineEvent> {
        let order = std::mem::take(&mut self.init_order);
        let mut events = Vec::with_capacity(order.len());
        for name in order.iter().rev() {
            if let Some(descriptor) = self.descriptors.iter_mut().find(|d| &d.name == name) {
                if let Some(event) = Self::destroy_one(descriptor) {
                    events.push(event);
                }
            }
        }
        events
    }

    /// Enable or disable one plugin: destroy it if initialized, then initialize
    /// it again when `enabled`. Other plugins are not touched.
    pub fn set_enabled(
        &mut self,
        name: &str,
        enabled: bool,
        seed: &ContextSeed,
    ) -> Result<PluginToggle, PluginError> {
        let index = self
            .descriptors
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| PluginError::NotConfigured(name.to_string()))?;

        let factory = Arc::clone(&self.factory);
        let descriptor = &mut self.descriptors[index];
        let mut toggle = PluginToggle::default();

        if let Some(event) = Self::destroy_one(descriptor) {
            self.init_order.retain(|n| n != name);
            toggle.events.push(event);
        }
        descriptor.enabled = enabled;

        if enabled {
            match Self::initialize_one(descriptor, factory.as_ref(), seed) {
                Ok(deferred) => {
                    self.init_order.push(name.to_string());
                    toggle
                        .events
                        .push(EngineEvent::PluginLifecycle(PluginLifecycle::initialized(name)));
                    toggle.events.extend(deferred);
                }
                Err(error) => {
                    toggle
                        .events
                        .push(EngineEvent::PluginLifecycle(PluginLifecycle::failed(
                            name,
                            error.to_string(),
                        )));
                    toggle.failure = Some(error);
                }
            }
        }

        tracing::info!("Plugin {} {}", name, if enabled { "enabled" } else { "disabled" });
        Ok(toggle)
    }

    /// Overlay html from initialized plugins, in initialization order
    pub fn overlays(&self) -> Vec<String> {
        self.init_order
            .iter()
            .filter_map(|name| self.get(name))
            .filter(|plugin| plugin.is_enabled())
            .filter_map(|plugin| plugin.overlay())
            .collect()
    }

    fn initialize_one(
        descriptor: &mut PluginDescriptor,
        factory: &dyn PluginFactory,
        seed: &ContextSeed,
    ) -> Result<Vec<EngineEvent>, PluginError> {
        let name = descriptor.name.clone();
        let mut plugin = factory.create(&name, &descriptor.options)?;
        let context = seed.context_for(&name, &descriptor.options);

        let result = panic::catch_unwind(AssertUnwindSafe(|| plugin.init(context.clone())))
            .unwrap_or_else(|payload| {
                Err(PluginError::init_failed(&name, panic_message(payload.as_ref())))
            });

        match result {
            Ok(()) => {
                plugin.set_enabled(true);
                let deferred = context.go_live();
                descriptor.instance = Some(plugin);
                descriptor.context = Some(context);
                tracing::debug!("Plugin {} initialized", name);
                Ok(deferred)
            }
            Err(error) => {
                // Whatever the plugin subscribed before failing goes away with it
                context.release();
                tracing::warn!("Plugin {} failed to initialize: {}", name, error);
                Err(error)
            }
        }
    }

    fn destroy_one(descriptor: &mut PluginDescriptor) -> Option<EngineEvent> {
        let mut plugin = descriptor.instance.take()?;
        plugin.set_enabled(false);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| plugin.destroy())) {
            tracing::warn!(
                "Plugin {} panicked during destroy: {}",
                descriptor.name,
                panic_message(payload.as_ref())
            );
        }
        if let Some(context) = descriptor.context.take() {
            context.release();
        }
        tracing::debug!("Plugin {} destroyed", descriptor.name);
        Some(EngineEvent::PluginLifecycle(PluginLifecycle::destroyed(
            &descriptor.name,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::{EventBus, PluginPhase, Topic};
    use crate::engine::input::Action;
    use crate::plugins::context::SlideView;
    use crate::plugins::{MockPlugin, PluginRegistry};
    use crate::services::SlideDeck;
    use crate::state::Navigator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, RwLock};
    use tokio::sync::mpsc;

    struct Harness {
        seed: ContextSeed,
        bus: EventBus,
        _navigator: Navigator,
        _rx: mpsc::UnboundedReceiver<Action>,
    }

    fn harness() -> Harness {
        let navigator = Navigator::new(false);
        navigator.set_slide_count(3);
        let bus = EventBus::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let seed = ContextSeed::new(
            navigator.view(),
            SlideView::new(Arc::new(RwLock::new(SlideDeck::parse("a\n---\nb\n---\nc")))),
            bus.clone(),
            tx,
        );
        Harness {
            seed,
            bus,
            _navigator: navigator,
            _rx: rx,
        }
    }

    /// A mock that initializes fine and records its destroy into `log`
    fn well_behaved(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> MockPlugin {
        let mut plugin = MockPlugin::new();
        plugin.expect_init().returning(|ctx| {
            ctx.on_slide_change(|_| Ok(()));
            Ok(())
        });
        plugin.expect_set_enabled().return_const(());
        plugin.expect_is_enabled().return_const(true);
        plugin.expect_overlay().returning(move || Some(format!("<{name}>")));
        plugin
            .expect_destroy()
            .times(1)
            .returning(move || log.lock().unwrap().push(name.to_string()));
        plugin
    }

    fn failing() -> MockPlugin {
        let mut plugin = MockPlugin::new();
        plugin
            .expect_init()
            .returning(|_| Err(PluginError::init_failed("broken", "no canvas")));
        plugin.expect_destroy().never();
        plugin
    }

    fn registry(log: &Arc<Mutex<Vec<String>>>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        for name in ["alpha", "beta", "gamma"] {
            let log = Arc::clone(log);
            registry.register(name, move |_| {
                Ok(Box::new(well_behaved(name, Arc::clone(&log))) as Box<dyn Plugin>)
            });
        }
        registry.register("broken", |_| Ok(Box::new(failing()) as Box<dyn Plugin>));
        registry.register("panicky", |_| Ok(Box::new(Panicky) as Box<dyn Plugin>));
        registry
    }

    struct Panicky;

    impl Plugin for Panicky {
        fn init(&mut self, _ctx: PluginContext) -> Result<(), PluginError> {
            panic!("init exploded")
        }

        fn destroy(&mut self) {}

        fn is_enabled(&self) -> bool {
            false
        }

        fn set_enabled(&mut self, _enabled: bool) {}
    }

    fn spec(name: &str, enabled: bool) -> PluginSpec {
        PluginSpec {
            name: name.to_string(),
            enabled,
            options: PluginOptions::new(),
        }
    }

    #[test]
    fn test_initialize_all_in_declared_order_skipping_disabled() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = harness();
        let mut manager = PluginManager::new(Arc::new(registry(&log)));
        manager.load(&[spec("beta", true), spec("gamma", false), spec("alpha", true)]);

        let outcome = manager.initialize_all(&h.seed);
        assert_eq!(outcome.initialized, vec!["beta", "alpha"]);
        assert!(outcome.failures.is_empty());
        assert!(manager.is_initialized("beta"));
        assert!(!manager.is_initialized("gamma"));
        assert!(manager.descriptor("gamma").is_some());
        assert_eq!(manager.overlays(), vec!["<beta>", "<alpha>"]);
        assert_eq!(h.bus.subscriber_count(&Topic::SlideChanged), 2);

        manager.destroy_all();
    }

    #[test]
    fn test_failures_are_collected_not_thrown() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = harness();
        let mut manager = PluginManager::new(Arc::new(registry(&log)));
        manager.load(&[
            spec("alpha", true),
            spec("broken", true),
            spec("panicky", true),
            spec("missing", true),
            spec("beta", true),
        ]);

        let outcome = manager.initialize_all(&h.seed);
        assert_eq!(outcome.initialized, vec!["alpha", "beta"]);
        let failed: Vec<&str> = outcome.failures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["broken", "panicky", "missing"]);
        assert_eq!(
            outcome.failures[2].error,
            PluginError::Unknown("missing".to_string())
        );
        assert!(matches!(
            &outcome.failures[1].error,
            PluginError::InitFailed { reason, .. } if reason.contains("init exploded")
        ));
        for name in ["broken", "panicky", "missing"] {
            assert!(!manager.is_initialized(name));
        }

        let phases: Vec<(String, PluginPhase)> = outcome
            .events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::PluginLifecycle(l) => Some((l.plugin.clone(), l.phase)),
                _ => None,
            })
            .collect();
        assert_eq!(phases.len(), 5);
        assert_eq!(phases[0], ("alpha".to_string(), PluginPhase::Initialized));
        assert_eq!(phases[1], ("broken".to_string(), PluginPhase::Failed));

        manager.destroy_all();
    }

    #[test]
    fn test_destroy_all_reverse_order_and_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = harness();
        let mut manager = PluginManager::new(Arc::new(registry(&log)));
        manager.load(&[spec("alpha", true), spec("beta", true), spec("gamma", true)]);
        manager.initialize_all(&h.seed);

        let events = manager.destroy_all();
        assert_eq!(events.len(), 3);
        assert_eq!(*log.lock().unwrap(), vec!["gamma", "beta", "alpha"]);
        assert_eq!(h.bus.subscriber_count(&Topic::SlideChanged), 0);

        // Second call is a no-op; the mocks enforce destroy().times(1)
        assert!(manager.destroy_all().is_empty());
        assert!(manager.initialized().is_empty());
        assert!(manager.get("alpha").is_none());
    }

    #[test]
    fn test_set_enabled_touches_only_one_plugin() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = harness();
        let mut manager = PluginManager::new(Arc::new(registry(&log)));
        manager.load(&[spec("alpha", true), spec("beta", true)]);
        manager.initialize_all(&h.seed);

        let toggle = manager.set_enabled("alpha", false, &h.seed).unwrap();
        assert!(toggle.failure.is_none());
        assert_eq!(toggle.events.len(), 1);
        assert!(!manager.is_initialized("alpha"));
        assert!(manager.is_initialized("beta"));
        assert!(!manager.descriptor("alpha").unwrap().is_enabled());

        // Re-enabling makes it the newest plugin
        manager.set_enabled("alpha", true, &h.seed).unwrap();
        assert_eq!(manager.initialized(), ["beta".to_string(), "alpha".to_string()]);

        manager.destroy_all();
        assert_eq!(*log.lock().unwrap(), vec!["alpha", "alpha", "beta"]);
    }

    #[test]
    fn test_set_enabled_reports_failure_and_unknown() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = harness();
        let mut manager = PluginManager::new(Arc::new(registry(&log)));
        manager.load(&[spec("broken", false)]);
        manager.initialize_all(&h.seed);

        let toggle = manager.set_enabled("broken", true, &h.seed).unwrap();
        assert!(toggle.failure.is_some());
        assert!(!manager.is_initialized("broken"));

        assert_eq!(
            manager.set_enabled("ghost", true, &h.seed).err(),
            Some(PluginError::NotConfigured("ghost".to_string()))
        );
    }

    #[test]
    fn test_failed_init_releases_subscriptions() {
        let h = harness();
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new();
        let counter = Arc::clone(&attempts);
        registry.register("half", move |_| {
            let counter = Arc::clone(&counter);
            let mut plugin = MockPlugin::new();
            plugin.expect_init().returning(move |ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.on_slide_change(|_| Ok(()));
                Err(PluginError::init_failed("half", "gave up"))
            });
            Ok(Box::new(plugin) as Box<dyn Plugin>)
        });

        let mut manager = PluginManager::new(Arc::new(registry));
        manager.load(&[spec("half", true)]);
        let outcome = manager.initialize_all(&h.seed);

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(h.bus.subscriber_count(&Topic::SlideChanged), 0);
    }
}
