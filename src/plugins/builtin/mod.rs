//! Plugins shipped with the engine.
//!
//! [`BuiltinPlugin`] is a closed set of variants dispatched by `match`; each
//! variant also implements [`Plugin`] on its own so it can be used directly.

pub mod effects;
pub mod progress;
pub mod remote;
pub mod slide_number;

use super::{Plugin, PluginContext, PluginError};
use crate::models::PluginOptions;

pub use effects::{EFFECT_TOPIC, Effects, EffectTrigger};
pub use progress::{BarPosition, ProgressBar};
pub use remote::{REMOTE_TOPIC, RemoteCommand, RemoteControl};
pub use slide_number::{DEFAULT_FORMAT, SlideNumber};

pub const BUILTIN_PLUGINS: &[&str] = &["progress", "slide-number", "remote", "effects"];

#[derive(Debug)]
pub enum BuiltinPlugin {
    Progress(ProgressBar),
    SlideNumber(SlideNumber),
    Remote(RemoteControl),
    Effects(Effects),
}

impl BuiltinPlugin {
    /// Build a built-in plugin from its configured options.
    pub fn create(name: &str, options: &PluginOptions) -> Result<Self, PluginError> {
        match name {
            "progress" => ProgressBar::from_options(options).map(Self::Progress),
            "slide-number" => SlideNumber::from_options(options).map(Self::SlideNumber),
            "remote" => RemoteControl::from_options(options).map(Self::Remote),
            "effects" => Effects::from_options(options).map(Self::Effects),
            other => Err(PluginError::Unknown(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Progress(_) => "progress",
            Self::SlideNumber(_) => "slide-number",
            Self::Remote(_) => "remote",
            Self::Effects(_) => "effects",
        }
    }

    fn as_plugin(&self) -> &dyn Plugin {
        match self {
            Self::Progress(p) => p,
            Self::SlideNumber(p) => p,
            Self::Remote(p) => p,
            Self::Effects(p) => p,
        }
    }

    fn as_plugin_mut(&mut self) -> &mut dyn Plugin {
        match self {
            Self::Progress(p) => p,
            Self::SlideNumber(p) => p,
            Self::Remote(p) => p,
            Self::Effects(p) => p,
        }
    }
}

impl Plugin for BuiltinPlugin {
    fn init(&mut self, ctx: PluginContext) -> Result<(), PluginError> {
        self.as_plugin_mut().init(ctx)
    }

    fn destroy(&mut self) {
        self.as_plugin_mut().destroy()
    }

    fn is_enabled(&self) -> bool {
        self.as_plugin().is_enabled()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.as_plugin_mut().set_enabled(enabled)
    }

    fn overlay(&self) -> Option<String> {
        self.as_plugin().overlay()
    }
}

/// Read an optional string option, rejecting non-string values.
pub(crate) fn string_option<'a>(
    plugin: &str,
    options: &'a PluginOptions,
    key: &str,
) -> Result<Option<&'a str>, PluginError> {
    match options.get(key) {
        None | Some(serde_yaml_ng::Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| PluginError::invalid_config(plugin, key, "expected a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_each_builtin() {
        for name in BUILTIN_PLUGINS {
            let plugin = BuiltinPlugin::create(name, &PluginOptions::new()).unwrap();
            assert_eq!(plugin.name(), *name);
            assert!(!plugin.is_enabled());
        }
    }

    #[test]
    fn test_create_unknown() {
        assert!(matches!(
            BuiltinPlugin::create("spotlight", &PluginOptions::new()),
            Err(PluginError::Unknown(_))
        ));
    }

    #[test]
    fn test_string_option_type_check() {
        let mut options = PluginOptions::new();
        options.insert("format".to_string(), serde_yaml_ng::Value::from(3));
        assert!(string_option("slide-number", &options, "format").is_err());
        assert_eq!(string_option("slide-number", &options, "missing"), Ok(None));
    }
}
