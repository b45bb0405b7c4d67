/// One addressable unit of content.
///
/// Slides are produced by [`crate::services::splitter::split`] and owned by a
/// [`crate::services::render::SlideDeck`]. Everything except `html` is fixed at
/// creation; `html` is filled in on first render and then kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slide {
    index: usize,
    raw_content: String,
    html: Option<String>,
}

impl Slide {
    pub fn new(index: usize, raw_content: impl Into<String>) -> Self {
        Self {
            index,
            raw_content: raw_content.into(),
            html: None,
        }
    }

    /// 0-based position in the deck
    pub fn index(&self) -> usize {
        self.index
    }

    /// Trimmed markdown source of this slide
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// Rendered html, absent until the slide has been rendered once
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn is_rendered(&self) -> bool {
        self.html.is_some()
    }

    pub(crate) fn set_html(&mut self, html: String) {
        self.html = Some(html);
    }

    /// First markdown heading of the slide, if any.
    pub fn title(&self) -> Option<&str> {
        self.raw_content
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with('#'))
            .map(|line| line.trim_start_matches('#').trim())
            .filter(|title| !title.is_empty())
    }
}
