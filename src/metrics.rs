// Engine metrics module
//
// Lightweight counters for one engine instance, logged when it is destroyed

use crate::services::RenderSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-engine counters.
///
/// Uses relaxed atomics so recording never takes a lock. Read them at any
/// time; `log_summary` is called from `Engine::destroy`.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Successful slide changes
    pub navigations: AtomicU64,

    /// Navigation requests refused (out of range, empty deck)
    pub navigations_rejected: AtomicU64,

    /// Calls into the markdown renderer
    pub renderer_invocations: AtomicU64,

    /// Renders served from the content cache
    pub render_cache_hits: AtomicU64,

    /// Slides that fell back to the error fragment
    pub render_failures: AtomicU64,

    pub plugin_inits: AtomicU64,

    pub plugin_failures: AtomicU64,

    /// Event handlers that returned an error or panicked
    pub handler_failures: AtomicU64,

    pub theme_loads: AtomicU64,

    pub theme_failures: AtomicU64,

    start_time: Instant,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            navigations: AtomicU64::new(0),
            navigations_rejected: AtomicU64::new(0),
            renderer_invocations: AtomicU64::new(0),
            render_cache_hits: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
            plugin_inits: AtomicU64::new(0),
            plugin_failures: AtomicU64::new(0),
            handler_failures: AtomicU64::new(0),
            theme_loads: AtomicU64::new(0),
            theme_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_navigation(&self) {
        self.navigations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_navigation_rejected(&self) {
        self.navigations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how a slide's html was obtained
    pub fn record_render(&self, source: RenderSource) {
        let counter = match source {
            RenderSource::Cache => &self.render_cache_hits,
            RenderSource::Renderer => &self.renderer_invocations,
            RenderSource::Fallback => {
                // A fallback still cost a renderer call
                self.renderer_invocations.fetch_add(1, Ordering::Relaxed);
                &self.render_failures
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plugin_results(&self, initialized: usize, failed: usize) {
        self.plugin_inits
            .fetch_add(initialized as u64, Ordering::Relaxed);
        self.plugin_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn record_handler_failures(&self, failed: usize) {
        if failed > 0 {
            self.handler_failures
                .fetch_add(failed as u64, Ordering::Relaxed);
        }
    }

    pub fn record_theme_load(&self) {
        self.theme_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_theme_failure(&self) {
        self.theme_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of renders served from the cache, 0.0 when nothing rendered yet
    pub fn cache_hit_ratio(&self) -> f64 {
        let hits = self.render_cache_hits.load(Ordering::Relaxed);
        let total = hits + self.renderer_invocations.load(Ordering::Relaxed);
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Engine Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Navigation: {} moves, {} rejected",
            self.navigations.load(Ordering::Relaxed),
            self.navigations_rejected.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Rendering: {} renderer calls, {} cache hits ({:.0}%), {} failures",
            self.renderer_invocations.load(Ordering::Relaxed),
            self.render_cache_hits.load(Ordering::Relaxed),
            self.cache_hit_ratio() * 100.0,
            self.render_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Plugins: {} initialized, {} failed; handler failures: {}",
            self.plugin_inits.load(Ordering::Relaxed),
            self.plugin_failures.load(Ordering::Relaxed),
            self.handler_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Themes: {} loaded, {} failed",
            self.theme_loads.load(Ordering::Relaxed),
            self.theme_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
