use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::io::ErrorKind;
use std::sync::Arc;
use thiserror::Error;

/// Themes shipped with the engine, as `(name, css)` pairs.
pub const BUILTIN_THEMES: &[(&str, &str)] = &[
    (
        "default",
        ".slidedeck { background: #ffffff; color: #222222; font-family: sans-serif; }",
    ),
    (
        "dark",
        ".slidedeck { background: #1e1e1e; color: #e6e6e6; font-family: sans-serif; }",
    ),
    (
        "light",
        ".slidedeck { background: #fafafa; color: #333333; font-family: sans-serif; }",
    ),
    (
        "minimal",
        ".slidedeck { background: #ffffff; color: #000000; font-family: monospace; }",
    ),
    (
        "serif",
        ".slidedeck { background: #f4f1ea; color: #2b2b2b; font-family: Georgia, serif; }",
    ),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThemeError {
    #[error("theme not found: {0}")]
    NotFound(String),

    #[error("failed to load theme {name}: {reason}")]
    LoadFailed { name: String, reason: String },
}

/// A loaded theme ready to be installed on the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub theme: String,
    pub css: String,
}

/// Resolves a theme name to its css.
#[async_trait]
pub trait ThemeSource: Send + Sync {
    async fn load(&self, name: &str) -> Result<String, ThemeError>;
}

/// In-memory source over [`BUILTIN_THEMES`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinThemes;

impl BuiltinThemes {
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTIN_THEMES.iter().map(|(name, _)| *name)
    }

    pub fn get(name: &str) -> Option<&'static str> {
        BUILTIN_THEMES
            .iter()
            .find(|(theme, _)| *theme == name)
            .map(|(_, css)| *css)
    }
}

#[async_trait]
impl ThemeSource for BuiltinThemes {
    async fn load(&self, name: &str) -> Result<String, ThemeError> {
        Self::get(name)
            .map(str::to_string)
            .ok_or_else(|| ThemeError::NotFound(name.to_string()))
    }
}

/// Loads `<dir>/<name>.css`, falling back to the built-in themes when the file
/// does not exist.
#[derive(Debug, Clone)]
pub struct DirectoryThemes {
    dir: Utf8PathBuf,
}

impl DirectoryThemes {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ThemeSource for DirectoryThemes {
    async fn load(&self, name: &str) -> Result<String, ThemeError> {
        let path = self.dir.join(format!("{name}.css"));
        match tokio::fs::read_to_string(&path).await {
            Ok(css) => {
                tracing::debug!("Loaded theme {} from {}", name, path);
                Ok(css)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BuiltinThemes.load(name).await,
            Err(e) => Err(ThemeError::LoadFailed {
                name: name.to_string(),
                reason: format!("{path}: {e}"),
            }),
        }
    }
}

/// A theme load that has been started but not yet committed.
///
/// Holding a `PendingTheme` does not lock the loader, so the fetch can be
/// awaited without blocking navigation. Only the most recently prepared load
/// may commit.
pub struct PendingTheme {
    ticket: u64,
    name: String,
    source: Arc<dyn ThemeSource>,
}

impl PendingTheme {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn fetch(&self) -> Result<Stylesheet, ThemeError> {
        let css = self.source.load(&self.name).await?;
        Ok(Stylesheet {
            theme: self.name.clone(),
            css,
        })
    }
}

/// Keeps track of the single active theme.
///
/// Loading happens in two steps: [`prepare`](Self::prepare) hands out a
/// [`PendingTheme`], and [`commit`](Self::commit) swaps it in. A failed fetch
/// never reaches `commit`, so the previously active theme stays in place.
pub struct ThemeLoader {
    source: Arc<dyn ThemeSource>,
    active: Option<Stylesheet>,
    latest_ticket: u64,
}

impl ThemeLoader {
    pub fn new(source: Arc<dyn ThemeSource>) -> Self {
        Self {
            source,
            active: None,
            latest_ticket: 0,
        }
    }

    pub fn active(&self) -> Option<&Stylesheet> {
        self.active.as_ref()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(|sheet| sheet.theme.as_str())
    }

    /// Start loading a theme. Any load prepared earlier becomes stale.
    pub fn prepare(&mut self, name: &str) -> PendingTheme {
        self.latest_ticket += 1;
        PendingTheme {
            ticket: self.latest_ticket,
            name: name.to_string(),
            source: Arc::clone(&self.source),
        }
    }

    /// Make `sheet` the active theme if `ticket` is still the latest load.
    ///
    /// Returns the newly active stylesheet, or `None` for a stale completion.
    pub fn commit(&mut self, ticket: u64, sheet: Stylesheet) -> Option<&Stylesheet> {
        if ticket != self.latest_ticket {
            tracing::debug!("Ignoring stale theme load for {}", sheet.theme);
            return None;
        }
        tracing::info!("Theme {} is now active", sheet.theme);
        self.active = Some(sheet);
        self.active.as_ref()
    }

    /// Make every outstanding load stale.
    pub fn cancel_pending(&mut self) {
        self.latest_ticket += 1;
    }

    /// Drop the active theme and any outstanding load.
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.active = None;
    }

    /// Load and activate a theme in one step.
    pub async fn apply(&mut self, name: &str) -> Result<&Stylesheet, ThemeError> {
        let pending = self.prepare(name);
        let sheet = pending.fetch().await?;
        let ticket = pending.ticket();
        self.commit(ticket, sheet)
            .ok_or_else(|| ThemeError::LoadFailed {
                name: name.to_string(),
                reason: "superseded by a newer theme load".to_string(),
            })
    }
}
