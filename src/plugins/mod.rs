//! Plugins - optional extensions with a start/stop lifecycle.
//!
//! A plugin only ever sees a [`PluginContext`]: read-only views of navigation
//! state and slides, an event subscription handle, its own options and a way
//! to *request* navigation. Every mutation goes back through the engine.
//!
//! # Components
//!
//! - [`Plugin`]: the capability interface every plugin implements
//! - [`PluginFactory`] / [`PluginRegistry`]: turn a configured name into an instance
//! - [`PluginManager`]: initialization, teardown and runtime toggling, keeping
//!   "instance present iff initialized" for every descriptor
//! - [`builtin`]: the plugins shipped with the engine

pub mod builtin;
pub mod context;
pub mod manager;

use crate::models::PluginOptions;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

pub use builtin::{BUILTIN_PLUGINS, BuiltinPlugin};
pub use context::{ActionRequester, ContextSeed, EventPublisher, PluginContext, SlideView};
pub use manager::{InitOutcome, PluginDescriptor, PluginFailure, PluginManager, PluginToggle};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("unknown plugin {0:?}")]
    Unknown(String),

    #[error("plugin {name} failed to initialize: {reason}")]
    InitFailed { name: String, reason: String },

    #[error("invalid option {option:?} for plugin {name}: {reason}")]
    InvalidConfig {
        name: String,
        option: String,
        reason: String,
    },

    #[error("plugin {0:?} is not declared in the configuration")]
    NotConfigured(String),
}

impl PluginError {
    pub fn init_failed(name: &str, reason: impl Into<String>) -> Self {
        Self::InitFailed {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(name: &str, option: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.to_string(),
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}

/// Capability interface implemented by every plugin.
///
/// The manager calls `init` once per activation and `destroy` once per
/// successful `init`. `set_enabled(true)` follows a successful `init` and
/// `set_enabled(false)` precedes `destroy`.
#[cfg_attr(test, mockall::automock)]
pub trait Plugin: Send {
    fn init(&mut self, ctx: PluginContext) -> Result<(), PluginError>;

    fn destroy(&mut self);

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Html the plugin wants drawn over the current slide
    fn overlay(&self) -> Option<String> {
        None
    }
}

/// Creates plugin instances by configured name.
pub trait PluginFactory: Send + Sync {
    fn create(&self, name: &str, options: &PluginOptions) -> Result<Box<dyn Plugin>, PluginError>;
}

pub type PluginConstructor =
    Arc<dyn Fn(&PluginOptions) -> Result<Box<dyn Plugin>, PluginError> + Send + Sync>;

/// Name to constructor table.
///
/// Hosts start from [`PluginRegistry::with_builtins`] and register their own
/// plugins on top; registering an existing name replaces it.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    constructors: IndexMap<String, PluginConstructor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for &name in BUILTIN_PLUGINS {
            registry.register(name, move |options: &PluginOptions| {
                BuiltinPlugin::create(name, options).map(|p| Box::new(p) as Box<dyn Plugin>)
            });
        }
        registry
    }

    pub fn register<F>(&mut self, name: &str, constructor: F) -> &mut Self
    where
        F: Fn(&PluginOptions) -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.to_string(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.constructors.keys()).finish()
    }
}

impl PluginFactory for PluginRegistry {
    fn create(&self, name: &str, options: &PluginOptions) -> Result<Box<dyn Plugin>, PluginError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| PluginError::Unknown(name.to_string()))?;
        constructor(options)
    }
}
