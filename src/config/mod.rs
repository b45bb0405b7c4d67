use crate::models::{ContentSource, DeckConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the deck configuration inside the config directory
pub const DECK_FILE: &str = "deck.yaml";

/// Prefix of environment variables that override `deck.yaml`
pub const ENV_PREFIX: &str = "SLIDEDECK";

/// Loads and saves the deck configuration of one config directory.
///
/// `load_deck_config` layers two sources with the `config` crate:
/// - `deck.yaml` in the config directory (optional)
/// - `SLIDEDECK_*` environment variables, `__` separating nested keys
///   (`SLIDEDECK_TRANSITION__DURATION_MS=250`)
///
/// A relative `content.file` is resolved against the config directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    deck_path: Utf8PathBuf,
    environment: Option<config::Map<String, String>>,
}

impl ConfigManager {
    /// Create a manager for `config_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            deck_path: config_dir.join(DECK_FILE),
            config_dir,
            environment: None,
        })
    }

    /// Read overrides from `vars` instead of the process environment.
    pub fn with_environment(mut self, vars: config::Map<String, String>) -> Self {
        self.environment = Some(vars);
        self
    }

    pub fn deck_path(&self) -> &Utf8Path {
        &self.deck_path
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load the deck configuration. Defaults apply to every missing key.
    ///
    /// The result is not validated; pass it to the engine (or
    /// [`DeckConfig::validate`]) for that.
    pub fn load_deck_config(&self) -> Result<DeckConfig> {
        if !self.deck_path.exists() {
            tracing::warn!(
                "Deck config file not found at {}, using defaults",
                self.deck_path
            );
        }

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(self.environment.clone());

        let settings = config::Config::builder()
            .add_source(
                config::File::new(self.deck_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read deck config: {}", self.deck_path))?;

        let mut deck: DeckConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse deck config: {}", self.deck_path))?;

        if let ContentSource::File(path) = &mut deck.content {
            if path.is_relative() {
                *path = self.config_dir.join(&*path);
            }
        }

        tracing::info!(
            "Loaded deck config from {} ({} plugins)",
            self.deck_path,
            deck.plugins.len()
        );
        Ok(deck)
    }

    /// Save the deck configuration as YAML.
    ///
    /// Content files inside the config directory are written back relative to it.
    pub fn save_deck_config(&self, deck: &DeckConfig) -> Result<()> {
        let mut deck = deck.clone();
        if let ContentSource::File(path) = &mut deck.content {
            if let Ok(relative) = path.strip_prefix(&self.config_dir) {
                *path = relative.to_path_buf();
            }
        }

        let yaml_string =
            serde_yaml_ng::to_string(&deck).context("Failed to serialize deck config to YAML")?;

        fs::write(&self.deck_path, yaml_string)
            .with_context(|| format!("Failed to write deck config: {}", self.deck_path))?;

        tracing::info!("Saved deck config to {}", self.deck_path);
        Ok(())
    }
}
