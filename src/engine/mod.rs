//! Engine - the presentation orchestrator.
//!
//! [`Engine`] composes the splitter, render cache, navigator, theme loader and
//! plugin manager, owns the validated [`EngineConfig`], and is the only thing
//! hosts and plugins talk to.
//!
//! # Ordering
//!
//! Every operation applies its state change under one lock, releases it, and
//! only then emits events. Handlers therefore always observe consistent
//! state and may call back into the engine.
//!
//! # Async
//!
//! `initialize`, `reconfigure` and `apply_theme` await content and theme
//! loads *before* touching engine state. A load that completes after
//! `destroy()` or after a newer initialization is discarded and reported as
//! [`EngineError::Cancelled`].

pub mod events;
pub mod input;
pub mod location;
pub mod surface;

use crate::metrics::EngineMetrics;
use crate::models::{
    ConfigError, ContentSource, DeckConfig, EngineConfig, is_valid_theme_name,
};
use crate::plugins::{
    ContextSeed, Plugin, PluginError, PluginFactory, PluginFailure, PluginManager,
    PluginRegistry, SlideView,
};
use crate::services::content::{self, ContentError, ContentFetcher, FileFetcher};
use crate::services::{
    BuiltinThemes, MarkdownRenderer, PreformattedRenderer, RENDER_ERROR_FRAGMENT, SlideDeck,
    ThemeError, ThemeLoader, ThemeSource,
};
use crate::state::{NavigationError, NavigationState, Navigator, Point, SlideChange};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

pub use events::{
    EmitReport, EngineEvent, EventBus, PluginLifecycle, PluginPhase, SubscriptionId, Topic,
};
pub use input::{Action, FocusTarget, InputSource, Key, KeyInput, key_action};
pub use location::{encode_slide_hash, parse_slide_hash};
pub use surface::{
    Direction, EMPTY_DECK_FRAGMENT, MemorySurface, SlideFrame, StdoutSurface, Surface,
};

/// Upper bound on plugin requests applied per drain, so a plugin that keeps
/// requesting navigation cannot spin forever on a looping deck.
const MAX_REQUESTS_PER_DRAIN: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("engine has not been initialized")]
    NotInitialized,

    #[error("engine has been destroyed")]
    Destroyed,

    #[error("operation was cancelled")]
    Cancelled,
}

/// What `initialize` did. Non-fatal problems are reported here, not as errors.
#[derive(Debug, Clone, PartialEq)]
pub struct InitReport {
    pub slide_count: usize,
    pub content_empty: bool,
    pub start_index: usize,
    /// Theme that could not be applied; the previous theme (if any) is still active
    pub theme_error: Option<ThemeError>,
    pub plugin_failures: Vec<PluginFailure>,
}

/// External capabilities the engine depends on.
#[derive(Clone)]
pub struct EngineServices {
    pub renderer: Arc<dyn MarkdownRenderer>,
    pub themes: Arc<dyn ThemeSource>,
    pub fetcher: Arc<dyn ContentFetcher>,
    pub plugins: Arc<dyn PluginFactory>,
}

impl Default for EngineServices {
    fn default() -> Self {
        Self {
            renderer: Arc::new(PreformattedRenderer),
            themes: Arc::new(BuiltinThemes),
            fetcher: Arc::new(FileFetcher::new()),
            plugins: Arc::new(PluginRegistry::with_builtins()),
        }
    }
}

impl EngineServices {
    pub fn with_renderer(mut self, renderer: impl MarkdownRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_themes(mut self, themes: impl ThemeSource + 'static) -> Self {
        self.themes = Arc::new(themes);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl ContentFetcher + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_plugins(mut self, plugins: impl PluginFactory + 'static) -> Self {
        self.plugins = Arc::new(plugins);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Ready,
    Destroyed,
}

struct EngineInner {
    lifecycle: Lifecycle,
    /// Bumped by every initialize and by destroy; stale async completions
    /// compare against it
    generation: u64,
    config: Option<Arc<EngineConfig>>,
    deck: Arc<RwLock<SlideDeck>>,
    navigator: Navigator,
    themes: ThemeLoader,
    plugins: PluginManager,
    inputs: input::InputBindings,
    surface: Box<dyn Surface>,
    overview: bool,
    renderer: Arc<dyn MarkdownRenderer>,
    fetcher: Arc<dyn ContentFetcher>,
    requests_tx: mpsc::UnboundedSender<Action>,
    requests_rx: mpsc::UnboundedReceiver<Action>,
}

impl EngineInner {
    fn ensure_live(&self) -> Result<(), EngineError> {
        match self.lifecycle {
            Lifecycle::Destroyed => Err(EngineError::Destroyed),
            _ => Ok(()),
        }
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        match self.lifecycle {
            Lifecycle::Created => Err(EngineError::NotInitialized),
            Lifecycle::Ready => Ok(()),
            Lifecycle::Destroyed => Err(EngineError::Destroyed),
        }
    }

    fn deck_mut(&self) -> RwLockWriteGuard<'_, SlideDeck> {
        self.deck.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn seed(&self, bus: &EventBus) -> ContextSeed {
        ContextSeed::new(
            self.navigator.view(),
            SlideView::new(Arc::clone(&self.deck)),
            bus.clone(),
            self.requests_tx.clone(),
        )
    }

    fn url_hash_enabled(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.url_hash)
    }

    fn sync_hash(&mut self) {
        let state = self.navigator.snapshot();
        if self.url_hash_enabled() && !state.is_empty() {
            self.surface
                .set_location_hash(&encode_slide_hash(state.current_index));
        }
    }

    /// Render the current slide and hand a frame to the surface.
    fn present(&mut self, direction: Option<Direction>, metrics: &EngineMetrics) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let state = self.navigator.snapshot();

        let (html, title) = if state.is_empty() {
            (EMPTY_DECK_FRAGMENT.to_string(), None)
        } else {
            let mut deck = self.deck_mut();
            let title = deck
                .get(state.current_index)
                .and_then(|slide| slide.title())
                .map(str::to_string);
            let html = match deck.render(state.current_index, self.renderer.as_ref()) {
                Some(rendered) => {
                    metrics.record_render(rendered.source);
                    rendered.html.to_string()
                }
                None => RENDER_ERROR_FRAGMENT.to_string(),
            };
            (html, title)
        };

        let frame = SlideFrame {
            index: state.current_index,
            total: state.total_slides,
            html,
            title,
            transition: config.transition,
            direction,
            overlays: self.plugins.overlays(),
            overview: self.overview,
            scale: config.scale,
            center: config.center_content,
        };
        self.surface.present(&frame);
    }

    /// Swap in a modified copy of the configuration snapshot
    fn update_config<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut EngineConfig),
    {
        self.config = self.config.as_deref().map(|current| {
            let mut next = current.clone();
            edit(&mut next);
            Arc::new(next)
        });
    }
}

/// The presentation engine.
///
/// Cheap to clone; clones drive the same presentation. All navigation and
/// event operations are synchronous. After [`destroy`](Self::destroy) every
/// operation returns [`EngineError::Destroyed`].
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Mutex<EngineInner>>,
    bus: EventBus,
    metrics: Arc<EngineMetrics>,
    cancel: Arc<watch::Sender<bool>>,
    draining: Arc<AtomicBool>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Engine")
            .field("lifecycle", &inner.lifecycle)
            .field("navigation", &inner.navigator.snapshot())
            .field("plugins", &inner.plugins.initialized())
            .finish()
    }
}

impl Engine {
    /// Engine with the default services: preformatted renderer, built-in
    /// themes, file content and built-in plugins.
    pub fn new(surface: impl Surface + 'static) -> Self {
        Self::with_services(surface, EngineServices::default())
    }

    pub fn with_services(surface: impl Surface + 'static, services: EngineServices) -> Self {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (cancel, _) = watch::channel(false);

        let inner = EngineInner {
            lifecycle: Lifecycle::Created,
            generation: 0,
            config: None,
            deck: Arc::new(RwLock::new(SlideDeck::new())),
            navigator: Navigator::new(false),
            themes: ThemeLoader::new(services.themes),
            plugins: PluginManager::new(services.plugins),
            inputs: input::InputBindings::new(),
            surface: Box::new(surface),
            overview: false,
            renderer: services.renderer,
            fetcher: services.fetcher,
            requests_tx,
            requests_rx,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            bus: EventBus::new(),
            metrics: Arc::new(EngineMetrics::new()),
            cancel: Arc::new(cancel),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: &EngineEvent) {
        let report = self.bus.emit(event);
        self.metrics.record_handler_failures(report.failed);
    }

    /// Run `future` unless the engine is destroyed first.
    async fn cancellable<F: Future>(&self, future: F) -> Result<F::Output, EngineError> {
        let mut destroyed = self.cancel.subscribe();
        tokio::select! {
            output = future => Ok(output),
            _ = destroyed.wait_for(|destroyed| *destroyed) => Err(EngineError::Cancelled),
        }
    }

    /// Validate `deck`, load content and theme, then (re)build the presentation.
    ///
    /// Only configuration problems and content failures are errors. An unknown
    /// theme, failing plugins and an empty deck are reported in the
    /// [`InitReport`] and on the event bus.
    pub async fn initialize(&self, deck: &DeckConfig) -> Result<InitReport, EngineError> {
        let config = Arc::new(EngineConfig::from_deck(deck).inspect_err(|e| {
            tracing::warn!("Rejected deck configuration: {}", e);
        })?);

        let (generation, fetcher, pending) = {
            let mut inner = self.lock();
            inner.ensure_live()?;
            inner.generation += 1;
            let pending = inner.themes.prepare(&config.theme);
            (inner.generation, Arc::clone(&inner.fetcher), pending)
        };
        tracing::info!(
            "Initializing deck on {} from {}",
            config.mount,
            config.content.describe()
        );

        let source = self
            .cancellable(content::resolve(&config.content, fetcher.as_ref()))
            .await?
            .inspect_err(|e| tracing::warn!("Content unavailable: {}", e))?;
        let theme_result = self.cancellable(pending.fetch()).await?;

        let (report, events) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            if inner.lifecycle == Lifecycle::Destroyed || inner.generation != generation {
                tracing::debug!("Discarding stale initialization {}", generation);
                return Err(EngineError::Cancelled);
            }

            let mut events = inner.plugins.load(&config.plugins);
            inner.inputs.detach_all();
            inner.overview = false;

            let theme_error = match theme_result {
                Ok(sheet) => {
                    if let Some(active) = inner.themes.commit(pending.ticket(), sheet) {
                        inner.surface.install_theme(Some(active));
                        self.metrics.record_theme_load();
                        events.push(EngineEvent::ThemeApplied {
                            theme: active.theme.clone(),
                        });
                    }
                    None
                }
                Err(error) => {
                    tracing::warn!("Theme {} not applied: {}", config.theme, error);
                    self.metrics.record_theme_failure();
                    events.push(EngineEvent::ThemeFailed {
                        theme: config.theme.clone(),
                        error: error.clone(),
                    });
                    Some(error)
                }
            };

            let slide_count = inner.deck_mut().replace(&source);
            inner.navigator.set_loop(config.loop_slides);
            inner.navigator.reset(slide_count);
            inner.surface.attach(&config.mount);
            inner.config = Some(Arc::clone(&config));

            let start_index = if config.url_hash {
                inner
                    .surface
                    .location_hash()
                    .and_then(|hash| parse_slide_hash(&hash, slide_count))
                    .unwrap_or(0)
            } else {
                0
            };
            if start_index > 0 {
                if let Err(e) = inner.navigator.go_to(start_index) {
                    tracing::warn!("Could not restore slide {}: {}", start_index, e);
                }
            }
            inner.sync_hash();

            let seed = inner.seed(&self.bus);
            let outcome = inner.plugins.initialize_all(&seed);
            self.metrics
                .record_plugin_results(outcome.initialized.len(), outcome.failures.len());
            events.extend(outcome.events);

            inner.inputs.attach(config.keyboard, config.touch);
            inner.lifecycle = Lifecycle::Ready;
            inner.present(None, &self.metrics);

            if slide_count == 0 {
                tracing::warn!("Deck has no slides");
                events.push(EngineEvent::ContentEmpty);
            }
            events.push(EngineEvent::Ready {
                total_slides: slide_count,
                current_index: start_index,
            });

            let report = InitReport {
                slide_count,
                content_empty: slide_count == 0,
                start_index,
                theme_error,
                plugin_failures: outcome.failures,
            };
            (report, events)
        };

        for event in &events {
            self.publish(event);
        }
        self.process_requests();

        tracing::info!(
            "Deck ready: {} slides, starting at {}, {} plugin failures",
            report.slide_count,
            report.start_index,
            report.plugin_failures.len()
        );
        Ok(report)
    }

    /// Controlled re-initialization with a new configuration snapshot.
    pub async fn reconfigure(&self, deck: &DeckConfig) -> Result<InitReport, EngineError> {
        self.lock().ensure_ready()?;
        self.initialize(deck).await
    }

    fn navigate<F>(&self, op: F) -> Result<Option<SlideChange>, EngineError>
    where
        F: FnOnce(&Navigator) -> Result<Option<SlideChange>, NavigationError>,
    {
        let change = {
            let mut inner = self.lock();
            inner.ensure_ready()?;
            let change = match op(&inner.navigator) {
                Ok(Some(change)) => change,
                Ok(None) => return Ok(None),
                Err(error) => {
                    self.metrics.record_navigation_rejected();
                    tracing::debug!("Navigation refused: {}", error);
                    return Err(error.into());
                }
            };
            inner.sync_hash();
            let direction = if change.is_forward() {
                Direction::Forward
            } else {
                Direction::Backward
            };
            inner.present(Some(direction), &self.metrics);
            change
        };

        self.metrics.record_navigation();
        self.publish(&EngineEvent::SlideChanged(change));
        self.process_requests();
        Ok(Some(change))
    }

    /// Advance one slide. `Ok(None)` at the last slide without loop.
    pub fn next_slide(&self) -> Result<Option<SlideChange>, EngineError> {
        self.navigate(Navigator::next)
    }

    pub fn previous_slide(&self) -> Result<Option<SlideChange>, EngineError> {
        self.navigate(Navigator::previous)
    }

    /// Jump to a 0-based index. Out of range is an error and changes nothing.
    pub fn go_to_slide(&self, index: usize) -> Result<Option<SlideChange>, EngineError> {
        self.navigate(|nav| nav.go_to(index))
    }

    pub fn first_slide(&self) -> Result<Option<SlideChange>, EngineError> {
        self.navigate(Navigator::first)
    }

    pub fn last_slide(&self) -> Result<Option<SlideChange>, EngineError> {
        self.navigate(Navigator::last)
    }

    /// Flip overview mode, returning the new state
    pub fn toggle_overview(&self) -> Result<bool, EngineError> {
        let active = {
            let mut inner = self.lock();
            inner.ensure_ready()?;
            inner.overview = !inner.overview;
            inner.present(None, &self.metrics);
            inner.overview
        };
        self.publish(&EngineEvent::OverviewToggled { active });
        Ok(active)
    }

    /// Subscribe to a topic. Handlers run in subscription order.
    pub fn on<F>(&self, topic: Topic, handler: F) -> Result<SubscriptionId, EngineError>
    where
        F: Fn(&EngineEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bus.on(topic, handler).ok_or(EngineError::Destroyed)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    /// Publish a custom event. Handler failures are counted, never returned.
    pub fn emit(
        &self,
        name: &str,
        payload: serde_yaml_ng::Value,
    ) -> Result<EmitReport, EngineError> {
        if self.bus.is_closed() {
            return Err(EngineError::Destroyed);
        }
        let report = self.bus.emit(&EngineEvent::custom(name, payload));
        self.metrics.record_handler_failures(report.failed);
        self.process_requests();
        Ok(report)
    }

    /// Tear everything down. Returns false if already destroyed.
    pub fn destroy(&self) -> bool {
        let events = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            if inner.lifecycle == Lifecycle::Destroyed {
                return false;
            }
            inner.lifecycle = Lifecycle::Destroyed;
            inner.generation += 1;
            self.cancel.send_replace(true);
            inner.themes.clear();

            let events = inner.plugins.destroy_all();
            inner.inputs.detach_all();
            inner.surface.clear();
            inner.deck_mut().clear();
            inner.navigator.reset(0);
            inner.overview = false;
            inner.config = None;

            inner.requests_rx.close();
            while inner.requests_rx.try_recv().is_ok() {}
            events
        };

        for event in &events {
            self.publish(event);
        }
        self.bus.close();
        self.metrics.log_summary();
        tracing::info!("Engine destroyed");
        true
    }

    /// Load and activate a theme. On failure the previous theme stays.
    pub async fn apply_theme(&self, name: &str) -> Result<(), EngineError> {
        if !is_valid_theme_name(name) {
            return Err(ConfigError::InvalidThemeName(name.to_string()).into());
        }
        let pending = {
            let mut inner = self.lock();
            inner.ensure_ready()?;
            inner.themes.prepare(name)
        };

        let result = self.cancellable(pending.fetch()).await?;

        let applied = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            if inner.lifecycle == Lifecycle::Destroyed {
                return Err(EngineError::Cancelled);
            }
            match result {
                Ok(sheet) => {
                    let Some(active) = inner.themes.commit(pending.ticket(), sheet) else {
                        return Err(EngineError::Cancelled);
                    };
                    inner.surface.install_theme(Some(active));
                    let theme = active.theme.clone();
                    inner.update_config(|config| config.theme = theme.clone());
                    self.metrics.record_theme_load();
                    Ok(theme)
                }
                Err(error) => {
                    self.metrics.record_theme_failure();
                    Err(error)
                }
            }
        };

        match applied {
            Ok(theme) => {
                self.publish(&EngineEvent::ThemeApplied { theme });
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Theme {} not applied: {}", name, error);
                self.publish(&EngineEvent::ThemeFailed {
                    theme: name.to_string(),
                    error: error.clone(),
                });
                Err(error.into())
            }
        }
    }

    /// Enable or disable one configured plugin; the others are untouched.
    pub fn set_plugin_enabled(&self, name: &str, enabled: bool) -> Result<(), EngineError> {
        let toggle = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            inner.ensure_ready()?;

            let seed = inner.seed(&self.bus);
            let toggle = inner.plugins.set_enabled(name, enabled, &seed)?;
            match &toggle.failure {
                Some(_) => self.metrics.record_plugin_results(0, 1),
                None if enabled => self.metrics.record_plugin_results(1, 0),
                None => {}
            }
            inner.update_config(|config| {
                if let Some(spec) = config.plugins.iter_mut().find(|p| p.name == name) {
                    spec.enabled = enabled;
                }
            });
            inner.present(None, &self.metrics);
            toggle
        };

        for event in &toggle.events {
            self.publish(event);
        }
        self.process_requests();
        match toggle.failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Replace the slide source. The render cache is dropped and the position
    /// kept when still valid, otherwise clamped to the new last slide.
    pub fn set_content(&self, markdown: &str) -> Result<usize, EngineError> {
        let (count, change) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            inner.ensure_ready()?;

            let count = inner.deck_mut().replace(markdown);
            let change = inner.navigator.set_slide_count(count);
            if count == 0 {
                inner.overview = false;
            }
            inner.update_config(|config| {
                config.content = ContentSource::Inline(markdown.to_string());
            });
            inner.sync_hash();
            inner.present(None, &self.metrics);
            (count, change)
        };

        tracing::info!("Content replaced: {} slides", count);
        if let Some(change) = change {
            self.metrics.record_navigation();
            self.publish(&EngineEvent::SlideChanged(change));
        }
        if count == 0 {
            self.publish(&EngineEvent::ContentEmpty);
        }
        self.process_requests();
        Ok(count)
    }

    /// Apply one navigation intent through the public operations.
    pub fn dispatch(&self, action: Action) -> Result<(), EngineError> {
        match action {
            Action::Next => self.next_slide().map(|_| ()),
            Action::Previous => self.previous_slide().map(|_| ()),
            Action::First => self.first_slide().map(|_| ()),
            Action::Last => self.last_slide().map(|_| ()),
            Action::GoTo(index) => self.go_to_slide(index).map(|_| ()),
            Action::ToggleOverview => self.toggle_overview().map(|_| ()),
        }
    }

    fn perform(&self, action: Option<Action>) -> Result<Option<Action>, EngineError> {
        if let Some(action) = action {
            self.dispatch(action)?;
        }
        Ok(action)
    }

    /// Feed a key press. Returns the action it mapped to, if any.
    pub fn handle_key(&self, key: &KeyInput) -> Result<Option<Action>, EngineError> {
        let action = {
            let inner = self.lock();
            inner.ensure_live()?;
            inner.inputs.key(key)
        };
        self.perform(action)
    }

    pub fn touch_start(&self, point: Point) -> Result<bool, EngineError> {
        let mut inner = self.lock();
        inner.ensure_live()?;
        Ok(inner.inputs.touch_start(point))
    }

    pub fn touch_end(&self, point: Point) -> Result<Option<Action>, EngineError> {
        let action = {
            let mut inner = self.lock();
            inner.ensure_live()?;
            inner.inputs.touch_end(point)
        };
        self.perform(action)
    }

    pub fn pointer_down(&self, point: Point) -> Result<bool, EngineError> {
        let mut inner = self.lock();
        inner.ensure_live()?;
        Ok(inner.inputs.pointer_down(point))
    }

    pub fn pointer_up(&self, point: Point) -> Result<Option<Action>, EngineError> {
        let action = {
            let mut inner = self.lock();
            inner.ensure_live()?;
            inner.inputs.pointer_up(point)
        };
        self.perform(action)
    }

    /// Apply navigation requests queued by plugins. Returns how many were
    /// taken off the queue. Re-entrant calls return 0 immediately.
    pub fn process_requests(&self) -> usize {
        if self.draining.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let mut handled = 0;
        while handled < MAX_REQUESTS_PER_DRAIN {
            let next = self.lock().requests_rx.try_recv().ok();
            let Some(action) = next else {
                break;
            };
            if let Err(e) = self.dispatch(action) {
                tracing::debug!("Plugin request {:?} not applied: {}", action, e);
            }
            handled += 1;
        }

        self.draining.store(false, Ordering::Release);
        handled
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lock().lifecycle
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle() == Lifecycle::Destroyed
    }

    pub fn navigation(&self) -> NavigationState {
        self.lock().navigator.snapshot()
    }

    pub fn current_index(&self) -> usize {
        self.navigation().current_index
    }

    pub fn slide_count(&self) -> usize {
        self.navigation().total_slides
    }

    pub fn config(&self) -> Option<Arc<EngineConfig>> {
        self.lock().config.clone()
    }

    pub fn active_theme(&self) -> Option<String> {
        self.lock().themes.active_name().map(str::to_string)
    }

    pub fn is_overview(&self) -> bool {
        self.lock().overview
    }

    /// Html for one slide, rendering it on first request.
    pub fn slide_html(&self, index: usize) -> Result<String, EngineError> {
        let inner = self.lock();
        inner.ensure_ready()?;
        let mut deck = inner.deck_mut();
        let total = deck.len();
        let rendered = deck
            .render(index, inner.renderer.as_ref())
            .ok_or(NavigationError::OutOfRange { index, total })?;
        self.metrics.record_render(rendered.source);
        Ok(rendered.html.to_string())
    }

    pub fn current_slide_html(&self) -> Result<String, EngineError> {
        let state = self.navigation();
        if state.is_empty() {
            return Err(NavigationError::Empty.into());
        }
        self.slide_html(state.current_index)
    }

    pub fn plugin_initialized(&self, name: &str) -> bool {
        self.lock().plugins.is_initialized(name)
    }

    /// Names of initialized plugins, oldest first
    pub fn initialized_plugins(&self) -> Vec<String> {
        self.lock().plugins.initialized().to_vec()
    }

    /// Run `f` against a live plugin instance. `f` must not call back into
    /// the engine.
    pub fn with_plugin<R>(&self, name: &str, f: impl FnOnce(&dyn Plugin) -> R) -> Option<R> {
        let inner = self.lock();
        inner.plugins.get(name).map(|plugin| f(plugin))
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }
}
