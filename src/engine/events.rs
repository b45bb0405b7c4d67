// Event bus - synchronous, ordered publish/subscribe for engine events
//
// Handlers run on the caller's thread, in subscription order. A handler that
// returns an error or panics is logged and counted; the remaining handlers
// still run and nothing propagates out of emit().

use crate::services::ThemeError;
use crate::state::SlideChange;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, Weak};

pub type SubscriptionId = u64;

pub type EventHandler = Arc<dyn Fn(&EngineEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    SlideChanged,
    PluginLifecycle,
    Theme,
    Overview,
    Ready,
    ContentEmpty,
    Custom(String),
}

impl Topic {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluginPhase {
    Initialized,
    Destroyed,
    Failed,
}

/// Plugin lifecycle notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginLifecycle {
    pub plugin: String,
    pub phase: PluginPhase,
    pub reason: Option<String>,
}

impl PluginLifecycle {
    pub fn initialized(plugin: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            phase: PluginPhase::Initialized,
            reason: None,
        }
    }

    pub fn destroyed(plugin: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            phase: PluginPhase::Destroyed,
            reason: None,
        }
    }

    pub fn failed(plugin: &str, reason: impl Into<String>) -> Self {
        Self {
            plugin: plugin.to_string(),
            phase: PluginPhase::Failed,
            reason: Some(reason.into()),
        }
    }
}

/// Everything published on the engine's event bus.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Position moved; emitted after the new state is in place
    SlideChanged(SlideChange),

    PluginLifecycle(PluginLifecycle),

    ThemeApplied {
        theme: String,
    },

    /// Theme could not be applied; the previous theme is still active
    ThemeFailed {
        theme: String,
        error: ThemeError,
    },

    OverviewToggled {
        active: bool,
    },

    /// Initialization finished
    Ready {
        total_slides: usize,
        current_index: usize,
    },

    /// Content parsed to zero slides
    ContentEmpty,

    /// Free-form event for plugins and hosts
    Custom {
        name: String,
        payload: serde_yaml_ng::Value,
    },
}

impl EngineEvent {
    pub fn custom(name: impl Into<String>, payload: serde_yaml_ng::Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Self::SlideChanged(_) => Topic::SlideChanged,
            Self::PluginLifecycle(_) => Topic::PluginLifecycle,
            Self::ThemeApplied { .. } | Self::ThemeFailed { .. } => Topic::Theme,
            Self::OverviewToggled { .. } => Topic::Overview,
            Self::Ready { .. } => Topic::Ready,
            Self::ContentEmpty => Topic::ContentEmpty,
            Self::Custom { name, .. } => Topic::Custom(name.clone()),
        }
    }
}

/// Outcome of a single emit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub delivered: usize,
    pub failed: usize,
}

struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    handler: EventHandler,
}

#[derive(Default)]
struct BusState {
    next_id: SubscriptionId,
    subscriptions: Vec<Subscription>,
    closed: bool,
}

/// Multi-subscriber event bus, cheap to clone (clones share subscribers).
///
/// `emit` takes a snapshot of the matching handlers before calling any of
/// them, so handlers may subscribe, unsubscribe or emit without deadlocking.
/// Changes made during an emit take effect from the next emit.
#[derive(Clone, Default)]
pub struct EventBus {
    state: Arc<RwLock<BusState>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventBus")
            .field("subscriptions", &state.subscriptions.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Returns `None` once the bus has been closed.
    pub fn on<F>(&self, topic: Topic, handler: F) -> Option<SubscriptionId>
    where
        F: Fn(&EngineEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return None;
        }
        state.next_id += 1;
        let id = state.next_id;
        state.subscriptions.push(Subscription {
            id,
            topic,
            handler: Arc::new(handler),
        });
        Some(id)
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let before = state.subscriptions.len();
        state.subscriptions.retain(|sub| sub.id != id);
        state.subscriptions.len() != before
    }

    /// Deliver `event` to every handler of its topic, in subscription order.
    pub fn emit(&self, event: &EngineEvent) -> EmitReport {
        let topic = event.topic();
        let handlers: Vec<(SubscriptionId, EventHandler)> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if state.closed {
                return EmitReport::default();
            }
            state
                .subscriptions
                .iter()
                .filter(|sub| sub.topic == topic)
                .map(|sub| (sub.id, Arc::clone(&sub.handler)))
                .collect()
        };

        let mut report = EmitReport::default();
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!("Handler {} for {:?} failed: {:#}", id, topic, e);
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::warn!("Handler {} for {:?} panicked", id, topic);
                }
            }
        }
        report
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .subscriptions
            .iter()
            .filter(|sub| &sub.topic == topic)
            .count()
    }

    /// Drop every handler and refuse new ones.
    pub fn close(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.subscriptions.clear();
        state.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    /// Handle that does not keep the bus alive. Handlers that publish hold
    /// one of these so a subscription never owns its own bus.
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            state: Arc::downgrade(&self.state),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WeakEventBus {
    state: Weak<RwLock<BusState>>,
}

impl WeakEventBus {
    pub fn upgrade(&self) -> Option<EventBus> {
        self.state.upgrade().map(|state| EventBus { state })
    }

    /// Emit if the bus still exists, otherwise deliver nothing.
    pub fn emit(&self, event: &EngineEvent) -> EmitReport {
        self.upgrade()
            .map(|bus| bus.emit(event))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn change(new_index: usize) -> EngineEvent {
        EngineEvent::SlideChanged(SlideChange {
            previous_index: Some(0),
            new_index,
        })
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            bus.on(Topic::SlideChanged, move |_| {
                log.lock().unwrap().push(name);
                Ok(())
            });
        }

        let report = bus.emit(&change(1));
        assert_eq!(report, EmitReport { delivered: 3, failed: 0 });
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let bus = EventBus::new();
        let reached = Arc::new(Mutex::new(0));

        bus.on(Topic::SlideChanged, |_| anyhow::bail!("handler exploded"));
        bus.on(Topic::SlideChanged, |_| panic!("handler panicked"));
        let counter = Arc::clone(&reached);
        bus.on(Topic::SlideChanged, move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        let report = bus.emit(&change(2));
        assert_eq!(report.failed, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(*reached.lock().unwrap(), 1);
    }

    #[test]
    fn test_topics_are_isolated() {
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&hits);
        bus.on(Topic::custom("remote"), move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });

        bus.emit(&change(1));
        bus.emit(&EngineEvent::custom("other", serde_yaml_ng::Value::Null));
        bus.emit(&EngineEvent::custom("remote", serde_yaml_ng::Value::from("next")));

        let hits = hits.lock().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].topic(), Topic::custom("remote"));
    }

    #[test]
    fn test_off_removes_handler() {
        let bus = EventBus::new();
        let id = bus.on(Topic::Ready, |_| Ok(())).unwrap();
        assert_eq!(bus.subscriber_count(&Topic::Ready), 1);
        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.subscriber_count(&Topic::Ready), 0);
    }

    #[test]
    fn test_handler_may_subscribe_during_emit() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        bus.on(Topic::Ready, move |_| {
            inner_bus.on(Topic::Ready, |_| Ok(()));
            Ok(())
        });

        let report = bus.emit(&EngineEvent::Ready {
            total_slides: 1,
            current_index: 0,
        });
        assert_eq!(report.delivered, 1);
        assert_eq!(bus.subscriber_count(&Topic::Ready), 2);
    }

    #[test]
    fn test_closed_bus_rejects_everything() {
        let bus = EventBus::new();
        bus.on(Topic::SlideChanged, |_| Ok(()));
        bus.close();

        assert!(bus.is_closed());
        assert_eq!(bus.subscriber_count(&Topic::SlideChanged), 0);
        assert!(bus.on(Topic::SlideChanged, |_| Ok(())).is_none());
        assert_eq!(bus.emit(&change(1)), EmitReport::default());
    }

    #[test]
    fn test_weak_bus_does_not_outlive_bus() {
        let bus = EventBus::new();
        bus.on(Topic::ContentEmpty, |_| Ok(()));
        let weak = bus.downgrade();
        assert_eq!(weak.emit(&EngineEvent::ContentEmpty).delivered, 1);

        drop(bus);
        assert!(weak.upgrade().is_none());
        assert_eq!(weak.emit(&EngineEvent::ContentEmpty), EmitReport::default());
    }
}
