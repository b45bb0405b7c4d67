use crate::models::ContentSource;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("failed to load content from {location}: {reason}")]
    Fetch { location: String, reason: String },
}

/// Capability used to resolve a non-inline content source.
///
/// Timeouts and retries belong to the implementation; the engine treats any
/// error as final for that initialization.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, location: &Utf8Path) -> Result<String, ContentError>;
}

/// Reads content files from disk, resolving relative paths against `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    base_dir: Option<Utf8PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    pub fn resolve_path(&self, location: &Utf8Path) -> Utf8PathBuf {
        match &self.base_dir {
            Some(base) if location.is_relative() => base.join(location),
            _ => location.to_path_buf(),
        }
    }
}

#[async_trait]
impl ContentFetcher for FileFetcher {
    async fn fetch(&self, location: &Utf8Path) -> Result<String, ContentError> {
        let path = self.resolve_path(location);
        tracing::debug!("Reading slide content from {}", path);

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ContentError::Fetch {
                location: path.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Turn a content source into markdown text.
pub async fn resolve(
    source: &ContentSource,
    fetcher: &dyn ContentFetcher,
) -> Result<String, ContentError> {
    match source {
        ContentSource::Inline(text) => Ok(text.clone()),
        ContentSource::File(path) => {
            let text = fetcher.fetch(path).await?;
            tracing::info!("Loaded {} bytes of slide content from {}", text.len(), path);
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_inline_source_needs_no_fetch() {
        let fetcher = FileFetcher::new();
        let text = tokio_test::block_on(resolve(
            &ContentSource::Inline("# Hi".to_string()),
            &fetcher,
        ))
        .unwrap();
        assert_eq!(text, "# Hi");
    }

    #[tokio::test]
    async fn test_file_source_relative_to_base_dir() {
        let (_guard, dir) = temp_dir();
        std::fs::write(dir.join("talk.md"), "# One\n---\n# Two").unwrap();

        let fetcher = FileFetcher::with_base_dir(dir.clone());
        let text = resolve(&ContentSource::File("talk.md".into()), &fetcher)
            .await
            .unwrap();
        assert_eq!(text, "# One\n---\n# Two");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let (_guard, dir) = temp_dir();
        let fetcher = FileFetcher::with_base_dir(dir.clone());

        let err = resolve(&ContentSource::File("missing.md".into()), &fetcher)
            .await
            .unwrap_err();
        let ContentError::Fetch { location, .. } = err;
        assert!(location.ends_with("missing.md"));
    }

    #[test]
    fn test_absolute_paths_ignore_base_dir() {
        let fetcher = FileFetcher::with_base_dir("/decks");
        let absolute = if cfg!(windows) { "C:\\talk.md" } else { "/tmp/talk.md" };
        assert_eq!(fetcher.resolve_path(Utf8Path::new(absolute)), Utf8PathBuf::from(absolute));
        assert_eq!(
            fetcher.resolve_path(Utf8Path::new("talk.md")),
            Utf8PathBuf::from("/decks/talk.md")
        );
    }
}
