use crate::engine::events::{
    EmitReport, EngineEvent, EventBus, SubscriptionId, Topic, WeakEventBus,
};
use crate::engine::input::Action;
use crate::models::PluginOptions;
use crate::services::SlideDeck;
use crate::state::{NavigationState, NavigationView, SlideChange};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::mpsc::UnboundedSender;

/// Read-only access to the parsed slides.
#[derive(Clone, Debug)]
pub struct SlideView {
    deck: Arc<RwLock<SlideDeck>>,
}

impl SlideView {
    pub(crate) fn new(deck: Arc<RwLock<SlideDeck>>) -> Self {
        Self { deck }
    }

    fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SlideDeck) -> R,
    {
        f(&self.deck.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.read(SlideDeck::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(SlideDeck::is_empty)
    }

    pub fn raw_content(&self, index: usize) -> Option<String> {
        self.read(|deck| deck.get(index).map(|s| s.raw_content().to_string()))
    }

    pub fn title(&self, index: usize) -> Option<String> {
        self.read(|deck| deck.get(index).and_then(|s| s.title()).map(str::to_string))
    }
}

/// Sends navigation requests to the engine's queue.
///
/// Requests are applied by the engine after the current operation finishes,
/// through the same public operations a host would call.
#[derive(Clone, Debug)]
pub struct ActionRequester {
    tx: UnboundedSender<Action>,
}

impl ActionRequester {
    /// Returns false once the engine is gone
    pub fn request(&self, action: Action) -> bool {
        self.tx.send(action).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextPhase {
    Initializing,
    Live,
    Released,
}

#[derive(Debug)]
struct ContextShared {
    phase: ContextPhase,
    subscriptions: Vec<SubscriptionId>,
    deferred: Vec<EngineEvent>,
}

/// Publishes custom events on behalf of one plugin.
///
/// While the plugin is still initializing, events are held back and
/// delivered by the engine once initialization has finished. After the
/// plugin is destroyed, publishing does nothing.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    bus: WeakEventBus,
    shared: Arc<Mutex<ContextShared>>,
}

impl EventPublisher {
    /// Returns false if the event was dropped
    pub fn publish(&self, name: &str, payload: serde_yaml_ng::Value) -> bool {
        let event = EngineEvent::custom(name, payload);
        let phase = {
            let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
            if shared.phase == ContextPhase::Initializing {
                shared.deferred.push(event);
                return true;
            }
            shared.phase
        };
        match phase {
            ContextPhase::Live => {
                let report: EmitReport = self.bus.emit(&event);
                tracing::debug!(
                    "Plugin event {} delivered to {} handlers",
                    name,
                    report.delivered
                );
                true
            }
            _ => false,
        }
    }
}

/// Everything a plugin is allowed to touch.
///
/// Cloning is cheap; clones share the subscription list, so subscriptions made
/// through any clone are released together when the plugin is destroyed.
#[derive(Clone, Debug)]
pub struct PluginContext {
    name: String,
    navigation: NavigationView,
    slides: SlideView,
    bus: EventBus,
    requests: ActionRequester,
    options: PluginOptions,
    shared: Arc<Mutex<ContextShared>>,
}

impl PluginContext {
    fn shared(&self) -> MutexGuard<'_, ContextShared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_index(&self) -> usize {
        self.navigation.current_index()
    }

    pub fn total_slides(&self) -> usize {
        self.navigation.total_slides()
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation.snapshot()
    }

    pub fn navigation_view(&self) -> NavigationView {
        self.navigation.clone()
    }

    pub fn slides(&self) -> &SlideView {
        &self.slides
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// Subscribe to any topic. The subscription ends when the plugin is
    /// destroyed. Returns `None` if the engine is shutting down.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Option<SubscriptionId>
    where
        F: Fn(&EngineEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut shared = self.shared();
        if shared.phase == ContextPhase::Released {
            return None;
        }
        let id = self.bus.on(topic, handler)?;
        shared.subscriptions.push(id);
        Some(id)
    }

    pub fn on_slide_change<F>(&self, handler: F) -> Option<SubscriptionId>
    where
        F: Fn(&SlideChange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(Topic::SlideChanged, move |event| match event {
            EngineEvent::SlideChanged(change) => handler(change),
            _ => Ok(()),
        })
    }

    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            bus: self.bus.downgrade(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Publish a custom event. Plugins cannot publish engine state events.
    pub fn publish(&self, name: &str, payload: serde_yaml_ng::Value) -> bool {
        self.publisher().publish(name, payload)
    }

    pub fn requester(&self) -> ActionRequester {
        self.requests.clone()
    }

    pub fn request(&self, action: Action) -> bool {
        self.requests.request(action)
    }

    pub fn subscription_count(&self) -> usize {
        self.shared().subscriptions.len()
    }

    /// Mark initialization complete and hand back anything published during it.
    pub(crate) fn go_live(&self) -> Vec<EngineEvent> {
        let mut shared = self.shared();
        shared.phase = ContextPhase::Live;
        std::mem::take(&mut shared.deferred)
    }

    /// Drop every subscription and stop publishing. Idempotent.
    pub(crate) fn release(&self) {
        let ids = {
            let mut shared = self.shared();
            shared.phase = ContextPhase::Released;
            shared.deferred.clear();
            std::mem::take(&mut shared.subscriptions)
        };
        for id in ids {
            self.bus.off(id);
        }
    }
}

/// The engine-owned parts every [`PluginContext`] is built from.
#[derive(Clone, Debug)]
pub struct ContextSeed {
    navigation: NavigationView,
    slides: SlideView,
    bus: EventBus,
    requests: ActionRequester,
}

impl ContextSeed {
    pub fn new(
        navigation: NavigationView,
        slides: SlideView,
        bus: EventBus,
        requests: UnboundedSender<Action>,
    ) -> Self {
        Self {
            navigation,
            slides,
            bus,
            requests: ActionRequester { tx: requests },
        }
    }

    pub fn context_for(&self, name: &str, options: &PluginOptions) -> PluginContext {
        PluginContext {
            name: name.to_string(),
            navigation: self.navigation.clone(),
            slides: self.slides.clone(),
            bus: self.bus.clone(),
            requests: self.requests.clone(),
            options: options.clone(),
            shared: Arc::new(Mutex::new(ContextShared {
                phase: ContextPhase::Initializing,
                subscriptions: Vec::new(),
                deferred: Vec::new(),
            })),
        }
    }
}
