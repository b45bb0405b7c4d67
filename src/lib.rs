// Slidedeck - presentation engine for markdown slide decks
//
// This is the library crate containing the engine, its components and the
// built-in plugins. The binary crate (main.rs) drives an engine from stdin.

pub mod config;
pub mod engine;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod plugins;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use engine::{
    Action, EmitReport, Engine, EngineError, EngineEvent, EngineServices, InitReport, Lifecycle,
    MemorySurface, SlideFrame, StdoutSurface, Surface, Topic,
};
pub use metrics::EngineMetrics;
pub use models::{DeckConfig, EngineConfig, PluginSettings, Slide};
pub use plugins::{Plugin, PluginContext, PluginError, PluginRegistry};
pub use state::{NavigationState, SlideChange};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
