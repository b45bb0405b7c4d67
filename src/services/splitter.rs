use crate::models::Slide;
use regex::Regex;
use std::sync::LazyLock;

/// A line made only of three or more dashes, surrounding whitespace ignored.
static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-{3,}\s*$").expect("Invalid delimiter regex"));

/// Check whether a single line separates two slides
pub fn is_delimiter(line: &str) -> bool {
    DELIMITER.is_match(line)
}

/// Split a markdown document into slides.
///
/// Segments between delimiter lines become slides in source order, each
/// trimmed. An empty segment produced only by a delimiter at the very start or
/// very end of the document is dropped; an empty segment between two
/// delimiters is kept as an intentionally empty slide. Empty or
/// whitespace-only input yields no slides.
pub fn split(source: &str) -> Vec<Slide> {
    if source.trim().is_empty() {
        return Vec::new();
    }

    let mut segments: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in source.lines() {
        if is_delimiter(line) {
            segments.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    segments.push(current.join("\n"));

    // More than one segment means at least one delimiter was seen, so an
    // empty first/last segment came from an edge delimiter.
    let saw_delimiter = segments.len() > 1;
    let mut segments: Vec<&str> = segments.iter().map(|s| s.trim()).collect();

    if saw_delimiter {
        if segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }
        if segments.first().is_some_and(|s| s.is_empty()) {
            segments.remove(0);
        }
    }

    let slides: Vec<Slide> = segments
        .into_iter()
        .enumerate()
        .map(|(index, raw)| Slide::new(index, raw))
        .collect();

    tracing::debug!("Split source into {} slides", slides.len());
    slides
}
