use camino::Utf8PathBuf;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Plugin-specific settings, passed through to the plugin untouched.
pub type PluginOptions = IndexMap<String, serde_yaml_ng::Value>;

static THEME_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("Invalid theme name regex"));

static CUBIC_BEZIER: LazyLock<Regex> = LazyLock::new(|| {
    let num = r"\s*(-?[0-9]*\.?[0-9]+)\s*";
    Regex::new(&format!(r"^cubic-bezier\({num},{num},{num},{num}\)$"))
        .expect("Invalid cubic-bezier regex")
});

/// Whether `name` is a well-formed theme name (lowercase alphanumerics, `-`, `_`).
pub fn is_valid_theme_name(name: &str) -> bool {
    THEME_NAME.is_match(name)
}

/// Errors raised while validating a [`DeckConfig`] into an [`EngineConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("mount target must not be empty")]
    EmptyMount,

    #[error("invalid theme name {0:?}")]
    InvalidThemeName(String),

    #[error("unknown transition type {0:?} (expected horizontal, vertical or fade)")]
    UnknownTransition(String),

    #[error("transition duration must be positive, got {0}ms")]
    InvalidDuration(i64),

    #[error("unknown easing {0:?}")]
    UnknownEasing(String),

    #[error("scale must be a positive number, got {0}")]
    InvalidScale(f64),

    #[error("plugin names must not be empty")]
    EmptyPluginName,

    #[error("content file path must not be empty")]
    EmptyContentPath,
}

/// Where the slide markdown comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    /// Markdown supplied directly in the configuration
    Inline(String),
    /// Markdown fetched from a file when the engine initializes
    File(Utf8PathBuf),
}

impl Default for ContentSource {
    fn default() -> Self {
        Self::Inline(String::new())
    }
}

impl ContentSource {
    /// Short description for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Inline(text) => format!("inline ({} bytes)", text.len()),
            Self::File(path) => path.to_string(),
        }
    }
}

/// Transition as written in the deck file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration_ms: i64,
    pub easing: String,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            kind: "horizontal".to_string(),
            duration_ms: 400,
            easing: "ease".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterContent {
    pub vertical: bool,
    pub horizontal: bool,
}

impl Default for CenterContent {
    fn default() -> Self {
        Self {
            vertical: true,
            horizontal: true,
        }
    }
}

/// Per-plugin entry of the `plugins` map.
///
/// Any key other than `enabled` is kept in `options` for the plugin itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(flatten)]
    pub options: PluginOptions,
}

impl PluginSettings {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            options: PluginOptions::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            options: PluginOptions::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<serde_yaml_ng::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

fn default_true() -> bool {
    true
}

/// Deck configuration as loaded from `deck.yaml` or built in code.
///
/// This is the unvalidated shape. The engine only ever works with the
/// [`EngineConfig`] produced by [`EngineConfig::from_deck`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub mount: String,
    /// Written as a one-key map: `content: {file: talk.md}` or `content: {inline: ...}`
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    pub content: ContentSource,
    pub theme: String,
    pub transition: TransitionConfig,
    pub scale: f64,
    #[serde(rename = "loop")]
    pub loop_slides: bool,
    pub plugins: IndexMap<String, PluginSettings>,
    pub keyboard: bool,
    pub touch: bool,
    pub url_hash: bool,
    pub center_content: CenterContent,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            mount: "#slides".to_string(),
            content: ContentSource::default(),
            theme: "default".to_string(),
            transition: TransitionConfig::default(),
            scale: 1.0,
            loop_slides: false,
            plugins: IndexMap::new(),
            keyboard: true,
            touch: true,
            url_hash: true,
            center_content: CenterContent::default(),
        }
    }
}

impl DeckConfig {
    /// Default configuration presenting the given markdown.
    pub fn inline(markdown: impl Into<String>) -> Self {
        Self {
            content: ContentSource::Inline(markdown.into()),
            ..Self::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }

    pub fn with_plugin(mut self, name: &str, settings: PluginSettings) -> Self {
        self.plugins.insert(name.to_string(), settings);
        self
    }

    pub fn validate(&self) -> Result<EngineConfig, ConfigError> {
        EngineConfig::from_deck(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Horizontal,
    Vertical,
    Fade,
}

impl TransitionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            "fade" => Some(Self::Fade),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Fade => "fade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier([f64; 4]),
}

impl Easing {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "linear" => Some(Self::Linear),
            "ease" => Some(Self::Ease),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            other => {
                let caps = CUBIC_BEZIER.captures(other)?;
                let mut points = [0.0; 4];
                for (slot, point) in points.iter_mut().enumerate() {
                    *point = caps.get(slot + 1)?.as_str().parse().ok()?;
                }
                // x coordinates of the control points must stay within the unit interval
                let x_in_range = |x: f64| (0.0..=1.0).contains(&x);
                (x_in_range(points[0]) && x_in_range(points[2])).then_some(Self::CubicBezier(points))
            }
        }
    }

    /// CSS timing-function text
    pub fn css(&self) -> String {
        match self {
            Self::Linear => "linear".to_string(),
            Self::Ease => "ease".to_string(),
            Self::EaseIn => "ease-in".to_string(),
            Self::EaseOut => "ease-out".to_string(),
            Self::EaseInOut => "ease-in-out".to_string(),
            Self::CubicBezier([x1, y1, x2, y2]) => format!("cubic-bezier({x1}, {y1}, {x2}, {y2})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    pub duration: Duration,
    pub easing: Easing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginSpec {
    pub name: String,
    pub enabled: bool,
    pub options: PluginOptions,
}

/// Validated, immutable configuration snapshot.
///
/// Built once per `initialize`/`reconfigure` and shared by reference
/// (`Arc<EngineConfig>`) with every component. Reconfiguring builds a new
/// snapshot; an existing one is never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub mount: String,
    pub content: ContentSource,
    pub theme: String,
    pub transition: TransitionSpec,
    pub scale: f64,
    pub loop_slides: bool,
    pub plugins: Vec<PluginSpec>,
    pub keyboard: bool,
    pub touch: bool,
    pub url_hash: bool,
    pub center_content: CenterContent,
}

impl EngineConfig {
    /// Validate every field, returning the first problem found.
    ///
    /// Nothing is partially applied: either the whole snapshot is built or an
    /// error is returned.
    pub fn from_deck(deck: &DeckConfig) -> Result<Self, ConfigError> {
        let mount = deck.mount.trim();
        if mount.is_empty() {
            return Err(ConfigError::EmptyMount);
        }

        if !is_valid_theme_name(&deck.theme) {
            return Err(ConfigError::InvalidThemeName(deck.theme.clone()));
        }

        if let ContentSource::File(path) = &deck.content {
            if path.as_str().trim().is_empty() {
                return Err(ConfigError::EmptyContentPath);
            }
        }

        let kind = TransitionKind::from_name(&deck.transition.kind)
            .ok_or_else(|| ConfigError::UnknownTransition(deck.transition.kind.clone()))?;

        if deck.transition.duration_ms <= 0 {
            return Err(ConfigError::InvalidDuration(deck.transition.duration_ms));
        }

        let easing = Easing::parse(&deck.transition.easing)
            .ok_or_else(|| ConfigError::UnknownEasing(deck.transition.easing.clone()))?;

        if !deck.scale.is_finite() || deck.scale <= 0.0 {
            return Err(ConfigError::InvalidScale(deck.scale));
        }

        let mut plugins = Vec::with_capacity(deck.plugins.len());
        for (name, settings) in &deck.plugins {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyPluginName);
            }
            plugins.push(PluginSpec {
                name: name.clone(),
                enabled: settings.enabled,
                options: settings.options.clone(),
            });
        }

        Ok(Self {
            mount: mount.to_string(),
            content: deck.content.clone(),
            theme: deck.theme.clone(),
            transition: TransitionSpec {
                kind,
                duration: Duration::from_millis(deck.transition.duration_ms as u64),
                easing,
            },
            scale: deck.scale,
            loop_slides: deck.loop_slides,
            plugins,
            keyboard: deck.keyboard,
            touch: deck.touch,
            url_hash: deck.url_hash,
            center_content: deck.center_content,
        })
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginSpec> {
        self.plugins.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deck_validates() {
        let config = DeckConfig::default().validate().unwrap();
        assert_eq!(config.mount, "#slides");
        assert_eq!(config.theme, "default");
        assert_eq!(config.transition.kind, TransitionKind::Horizontal);
        assert_eq!(config.transition.duration, Duration::from_millis(400));
        assert_eq!(config.transition.easing, Easing::Ease);
        assert!(!config.loop_slides);
        assert!(config.keyboard && config.touch && config.url_hash);
    }

    #[test]
    fn test_rejects_bad_transition() {
        let mut deck = DeckConfig::default();
        deck.transition.kind = "spin".to_string();
        assert_eq!(
            deck.validate(),
            Err(ConfigError::UnknownTransition("spin".to_string()))
        );

        let mut deck = DeckConfig::default();
        deck.transition.duration_ms = 0;
        assert_eq!(deck.validate(), Err(ConfigError::InvalidDuration(0)));

        let mut deck = DeckConfig::default();
        deck.transition.easing = "bouncy".to_string();
        assert!(matches!(deck.validate(), Err(ConfigError::UnknownEasing(_))));
    }

    #[test]
    fn test_rejects_malformed_theme_name_and_scale() {
        let mut deck = DeckConfig::default();
        deck.theme = "Dark Theme".to_string();
        assert!(matches!(deck.validate(), Err(ConfigError::InvalidThemeName(_))));

        let mut deck = DeckConfig::default();
        deck.scale = 0.0;
        assert_eq!(deck.validate(), Err(ConfigError::InvalidScale(0.0)));

        let mut deck = DeckConfig::default();
        deck.scale = f64::NAN;
        assert!(matches!(deck.validate(), Err(ConfigError::InvalidScale(_))));

        let mut deck = DeckConfig::default();
        deck.mount = "   ".to_string();
        assert_eq!(deck.validate(), Err(ConfigError::EmptyMount));
    }

    #[test]
    fn test_unknown_but_wellformed_theme_passes_validation() {
        let mut deck = DeckConfig::default();
        deck.theme = "nonexistent".to_string();
        assert!(deck.validate().is_ok());
    }

    #[test]
    fn test_easing_parse() {
        assert_eq!(Easing::parse("ease-in-out"), Some(Easing::EaseInOut));
        assert_eq!(
            Easing::parse("cubic-bezier(0.25, 0.1, 0.25, 1)"),
            Some(Easing::CubicBezier([0.25, 0.1, 0.25, 1.0]))
        );
        assert_eq!(Easing::parse("cubic-bezier(1.5, 0, 0.2, 1)"), None);
        assert_eq!(Easing::parse("cubic-bezier(0.1, 0.2)"), None);
        assert_eq!(
            Easing::CubicBezier([0.5, -0.5, 0.5, 1.5]).css(),
            "cubic-bezier(0.5, -0.5, 0.5, 1.5)"
        );
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = r##"
mount: "#deck"
content:
  file: talk.md
theme: dark
transition:
  type: fade
  duration_ms: 250
  easing: linear
loop: true
plugins:
  slide-number:
    format: "{current} of {total}"
  progress:
    enabled: false
    position: top
url_hash: false
"##;
        let deck = DeckConfig::from_yaml(yaml).unwrap();
        assert_eq!(deck.content, ContentSource::File(Utf8PathBuf::from("talk.md")));
        assert!(deck.loop_slides);
        assert!(!deck.url_hash);
        assert!(deck.keyboard, "unset fields keep their defaults");

        let names: Vec<&str> = deck.plugins.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["slide-number", "progress"]);
        assert!(deck.plugins["slide-number"].enabled);
        assert!(!deck.plugins["progress"].enabled);
        assert_eq!(
            deck.plugins["progress"].options.get("position"),
            Some(&serde_yaml_ng::Value::from("top"))
        );

        let config = deck.validate().unwrap();
        assert_eq!(config.transition.kind, TransitionKind::Fade);
        assert_eq!(config.plugins.len(), 2);
        assert_eq!(config.plugin("progress").map(|p| p.enabled), Some(false));
    }

    #[test]
    fn test_content_is_a_one_key_map() {
        let deck = DeckConfig::from_yaml("content:\n  inline: \"# A\\n---\\n# B\"\n").unwrap();
        assert_eq!(deck.content, ContentSource::Inline("# A\n---\n# B".to_string()));

        let yaml = DeckConfig::inline("# Only").to_yaml().unwrap();
        assert!(yaml.contains("content:\n  inline:"), "{yaml}");
        assert!(!yaml.contains("!inline"), "{yaml}");

        let mut deck = DeckConfig::default();
        deck.content = ContentSource::File(Utf8PathBuf::from("slides/talk.md"));
        let yaml = deck.to_yaml().unwrap();
        assert!(yaml.contains("content:\n  file: slides/talk.md"), "{yaml}");
        assert_eq!(DeckConfig::from_yaml(&yaml).unwrap(), deck);
    }

    #[test]
    fn test_yaml_round_trip_keeps_plugin_order() {
        let deck = DeckConfig::inline("# One")
            .with_plugin("remote", PluginSettings::enabled().with_option("token", "abc"))
            .with_plugin("effects", PluginSettings::disabled());

        let reparsed = DeckConfig::from_yaml(&deck.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed, deck);
    }
}
