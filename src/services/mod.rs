//! Services module - the engine's leaf components.
//!
//! None of these know about the [`Engine`](crate::engine::Engine); the engine
//! composes them.
//!
//! # Components
//!
//! - [`splitter`]: turns markdown source into an ordered slide sequence, split on
//!   lines made of three or more dashes
//! - [`render`]: the [`MarkdownRenderer`] seam and [`SlideDeck`], which renders
//!   slides lazily and caches html by exact source text
//! - [`content`]: resolves inline or file content through a [`ContentFetcher`]
//! - [`theme`]: resolves theme names to css through a [`ThemeSource`] and keeps
//!   exactly one active [`Stylesheet`] via [`ThemeLoader`]
//!
//! # Async
//!
//! Content fetching and theme loading are the only suspension points in the
//! engine. Both are exposed as `async` traits (`async-trait`) so hosts can plug
//! in network or file backed implementations.

pub mod content;
pub mod render;
pub mod splitter;
pub mod theme;

pub use content::{ContentError, ContentFetcher, FileFetcher};
pub use render::{
    MarkdownRenderer, PreformattedRenderer, RENDER_ERROR_FRAGMENT, RenderError, RenderSource,
    Rendered, SlideDeck,
};
pub use splitter::split;
pub use theme::{
    BUILTIN_THEMES, BuiltinThemes, DirectoryThemes, PendingTheme, Stylesheet, ThemeError,
    ThemeLoader, ThemeSource,
};
