use crate::models::Slide;
use crate::services::splitter::split;
use std::collections::HashMap;
use thiserror::Error;

/// Html shown in place of a slide whose markdown could not be rendered.
pub const RENDER_ERROR_FRAGMENT: &str =
    r#"<div class="slide-render-error" role="alert">This slide could not be rendered.</div>"#;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("markdown renderer failed: {0}")]
    Failed(String),
}

/// External markdown-to-html capability.
///
/// The engine never interprets markdown itself; it hands slide source to this
/// trait and caches whatever comes back.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

/// Fallback renderer used when no markdown renderer is wired in.
///
/// Escapes the source and wraps it in a `<pre>` block.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreformattedRenderer;

impl MarkdownRenderer for PreformattedRenderer {
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        Ok(format!(
            "<pre class=\"slide-markdown\">{}</pre>",
            escape_html(markdown)
        ))
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Where the html handed back by [`SlideDeck::render`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSource {
    /// Already rendered, either this slide or another with identical source
    Cache,
    /// Renderer invoked for this call
    Renderer,
    /// Renderer failed; the error fragment was used
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered<'a> {
    pub html: &'a str,
    pub source: RenderSource,
}

/// The parsed slide sequence plus its render cache.
///
/// The cache maps exact `raw_content` to rendered html, so identical slides
/// share one renderer call. Replacing the source discards both the slides and
/// the cache.
#[derive(Debug, Default, Clone)]
pub struct SlideDeck {
    slides: Vec<Slide>,
    cache: HashMap<String, String>,
}

impl SlideDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(source: &str) -> Self {
        Self {
            slides: split(source),
            cache: HashMap::new(),
        }
    }

    /// Re-parse from new source. Returns the new slide count.
    pub fn replace(&mut self, source: &str) -> usize {
        self.slides = split(source);
        self.cache.clear();
        self.slides.len()
    }

    pub fn clear(&mut self) {
        self.slides.clear();
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Render one slide, at most once per distinct source text.
    ///
    /// A renderer failure only affects this slide: its html becomes
    /// [`RENDER_ERROR_FRAGMENT`] and the failure is not cached by content, so
    /// a fresh parse may try again.
    pub fn render(&mut self, index: usize, renderer: &dyn MarkdownRenderer) -> Option<Rendered<'_>> {
        let slide = self.slides.get_mut(index)?;

        let source = if slide.is_rendered() {
            RenderSource::Cache
        } else if let Some(html) = self.cache.get(slide.raw_content()) {
            slide.set_html(html.clone());
            RenderSource::Cache
        } else {
            match renderer.render(slide.raw_content()) {
                Ok(html) => {
                    self.cache
                        .insert(slide.raw_content().to_string(), html.clone());
                    slide.set_html(html);
                    RenderSource::Renderer
                }
                Err(e) => {
                    tracing::warn!("Slide {} failed to render: {}", index, e);
                    slide.set_html(RENDER_ERROR_FRAGMENT.to_string());
                    RenderSource::Fallback
                }
            }
        };

        let html = slide.html().unwrap_or(RENDER_ERROR_FRAGMENT);
        Some(Rendered { html, source })
    }

    /// Render every slide, returning how many fell back to the error fragment.
    pub fn render_all(&mut self, renderer: &dyn MarkdownRenderer) -> usize {
        (0..self.slides.len())
            .filter(|&index| {
                matches!(
                    self.render(index, renderer).map(|r| r.source),
                    Some(RenderSource::Fallback)
                )
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails on any source containing "boom"
    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl MarkdownRenderer for CountingRenderer {
        fn render(&self, markdown: &str) -> Result<String, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if markdown.contains("boom") {
                Err(RenderError::Failed("exploded".to_string()))
            } else {
                Ok(format!("<section>{markdown}</section>"))
            }
        }
    }

    #[test]
    fn test_render_is_lazy_and_cached() {
        let renderer = CountingRenderer::default();
        let mut deck = SlideDeck::parse("# A\n---\n# B");
        assert!(deck.slides().iter().all(|s| !s.is_rendered()));

        let first = deck.render(0, &renderer).unwrap();
        assert_eq!(first.source, RenderSource::Renderer);
        assert_eq!(first.html, "<section># A</section>");

        let second = deck.render(0, &renderer).unwrap();
        assert_eq!(second.source, RenderSource::Cache);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert!(!deck.get(1).unwrap().is_rendered());
    }

    #[test]
    fn test_identical_content_shares_cache_entry() {
        let renderer = CountingRenderer::default();
        let mut deck = SlideDeck::parse("same\n---\nsame\n---\nother");

        deck.render(0, &renderer);
        let twin = deck.render(1, &renderer).unwrap();
        assert_eq!(twin.source, RenderSource::Cache);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(deck.cached_entries(), 1);
    }

    #[test]
    fn test_failure_is_contained_to_one_slide() {
        let renderer = CountingRenderer::default();
        let mut deck = SlideDeck::parse("ok\n---\nboom\n---\nfine");

        let failures = deck.render_all(&renderer);
        assert_eq!(failures, 1);
        assert_eq!(deck.get(0).unwrap().html(), Some("<section>ok</section>"));
        assert_eq!(deck.get(1).unwrap().html(), Some(RENDER_ERROR_FRAGMENT));
        assert_eq!(deck.get(2).unwrap().html(), Some("<section>fine</section>"));
    }

    #[test]
    fn test_replace_clears_cache() {
        let renderer = CountingRenderer::default();
        let mut deck = SlideDeck::parse("a\n---\nb");
        deck.render_all(&renderer);
        assert_eq!(deck.cached_entries(), 2);

        let count = deck.replace("a");
        assert_eq!(count, 1);
        assert_eq!(deck.cached_entries(), 0);

        deck.render(0, &renderer);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_render_out_of_range() {
        let mut deck = SlideDeck::parse("only");
        assert!(deck.render(5, &PreformattedRenderer).is_none());
    }

    #[test]
    fn test_preformatted_renderer_escapes() {
        let html = PreformattedRenderer.render("<b>\"x\" & 'y'</b>").unwrap();
        assert_eq!(
            html,
            "<pre class=\"slide-markdown\">&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;</pre>"
        );
    }
}
