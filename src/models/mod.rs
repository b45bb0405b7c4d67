//! Data models for the slidedeck engine.
//!
//! - [`DeckConfig`]: deck configuration as written in `deck.yaml` (every field defaulted)
//! - [`EngineConfig`]: the validated, immutable snapshot the engine runs against
//! - [`Slide`]: one addressable unit of content with lazily rendered html
//!
//! # Architecture Note
//!
//! Config structs derive `Serialize`/`Deserialize` for YAML persistence. Only
//! [`EngineConfig::from_deck`] turns a deck into something the engine accepts,
//! so invalid transitions, scales or theme names never reach runtime state.

pub mod config;
pub mod slide;

pub use config::{
    CenterContent, ConfigError, ContentSource, DeckConfig, Easing, EngineConfig, PluginOptions,
    PluginSettings, PluginSpec, TransitionConfig, TransitionKind, TransitionSpec, is_valid_theme_name,
};
pub use slide::Slide;
