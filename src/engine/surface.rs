use crate::models::{CenterContent, TransitionSpec};
use crate::services::Stylesheet;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Html shown when the deck has no slides, so the mount is never blank.
pub const EMPTY_DECK_FRAGMENT: &str =
    r#"<div class="slidedeck-empty" role="status">This presentation has no slides.</div>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Everything the host needs to draw the current slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideFrame {
    pub index: usize,
    pub total: usize,
    pub html: String,
    pub title: Option<String>,
    pub transition: TransitionSpec,
    /// `None` for the first frame after (re)initialization
    pub direction: Option<Direction>,
    pub overlays: Vec<String>,
    pub overview: bool,
    pub scale: f64,
    pub center: CenterContent,
}

/// The host page as seen by the engine.
pub trait Surface: Send {
    /// Bind to the mount target
    fn attach(&mut self, mount: &str);

    fn location_hash(&self) -> Option<String>;

    fn set_location_hash(&mut self, hash: &str);

    /// Replace the active stylesheet in a single step; `None` removes it.
    fn install_theme(&mut self, sheet: Option<&Stylesheet>);

    fn present(&mut self, frame: &SlideFrame);

    /// Remove everything the engine put on the page
    fn clear(&mut self);
}

#[derive(Debug, Default, Clone)]
pub struct SurfaceRecord {
    pub mounted_at: Option<String>,
    pub hash: Option<String>,
    pub theme: Option<Stylesheet>,
    pub theme_installs: usize,
    pub frames: Vec<SlideFrame>,
    pub cleared: bool,
}

/// Headless surface that records everything, for tests and embedding.
///
/// Clones share the same record, so a test can keep one handle while the
/// engine owns another.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    record: Arc<Mutex<SurfaceRecord>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface whose URL already carries a fragment
    pub fn with_hash(hash: &str) -> Self {
        let surface = Self::default();
        surface.record().hash = Some(hash.to_string());
        surface
    }

    fn record(&self) -> MutexGuard<'_, SurfaceRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SurfaceRecord {
        self.record().clone()
    }

    pub fn hash(&self) -> Option<String> {
        self.record().hash.clone()
    }

    pub fn theme_name(&self) -> Option<String> {
        self.record().theme.as_ref().map(|s| s.theme.clone())
    }

    pub fn theme_installs(&self) -> usize {
        self.record().theme_installs
    }

    pub fn last_frame(&self) -> Option<SlideFrame> {
        self.record().frames.last().cloned()
    }

    pub fn frame_count(&self) -> usize {
        self.record().frames.len()
    }

    pub fn is_cleared(&self) -> bool {
        self.record().cleared
    }
}

impl Surface for MemorySurface {
    fn attach(&mut self, mount: &str) {
        let mut record = self.record();
        record.mounted_at = Some(mount.to_string());
        record.cleared = false;
    }

    fn location_hash(&self) -> Option<String> {
        self.hash()
    }

    fn set_location_hash(&mut self, hash: &str) {
        self.record().hash = Some(hash.to_string());
    }

    fn install_theme(&mut self, sheet: Option<&Stylesheet>) {
        let mut record = self.record();
        record.theme = sheet.cloned();
        record.theme_installs += 1;
    }

    fn present(&mut self, frame: &SlideFrame) {
        self.record().frames.push(frame.clone());
    }

    fn clear(&mut self) {
        let mut record = self.record();
        record.mounted_at = None;
        record.theme = None;
        record.cleared = true;
    }
}

/// Writes frames to stdout as plain text. Used by the binary.
#[derive(Debug, Default)]
pub struct StdoutSurface {
    hash: Option<String>,
}

impl StdoutSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for StdoutSurface {
    fn attach(&mut self, mount: &str) {
        tracing::debug!("Presenting into {}", mount);
    }

    fn location_hash(&self) -> Option<String> {
        self.hash.clone()
    }

    fn set_location_hash(&mut self, hash: &str) {
        self.hash = Some(hash.to_string());
    }

    fn install_theme(&mut self, sheet: Option<&Stylesheet>) {
        if let Some(sheet) = sheet {
            tracing::info!("Theme {} installed ({} bytes)", sheet.theme, sheet.css.len());
        }
    }

    fn present(&mut self, frame: &SlideFrame) {
        let mut out = std::io::stdout().lock();
        let header = match (&frame.title, frame.total) {
            (_, 0) => "empty deck".to_string(),
            (Some(title), total) => format!("{}/{} {}", frame.index + 1, total, title),
            (None, total) => format!("{}/{}", frame.index + 1, total),
        };
        // A closed stdout only loses output
        let _ = writeln!(
            out,
            "==== {}{} ====",
            header,
            if frame.overview { " [overview]" } else { "" }
        );
        let _ = writeln!(out, "{}", frame.html);
        for overlay in &frame.overlays {
            let _ = writeln!(out, "{overlay}");
        }
    }

    fn clear(&mut self) {
        self.hash = None;
    }
}
