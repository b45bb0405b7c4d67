use regex::Regex;
use std::sync::LazyLock;

static SLIDE_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?/?([0-9]+)$").expect("Invalid slide hash regex"));

/// Fragment for a 0-based slide index, e.g. index 2 becomes `#/3`.
pub fn encode_slide_hash(index: usize) -> String {
    format!("#/{}", index + 1)
}

/// Read a 0-based slide index back from a URL fragment.
///
/// Accepts `#/3`, `#3`, `/3` and `3` (1-based). Returns `None` for anything
/// else, for slide 0 and for numbers past the end of the deck.
pub fn parse_slide_hash(hash: &str, total_slides: usize) -> Option<usize> {
    let caps = SLIDE_HASH.captures(hash.trim())?;
    let number: usize = caps.get(1)?.as_str().parse().ok()?;
    let index = number.checked_sub(1)?;
    (index < total_slides).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode_slide_hash(0), "#/1");
        assert_eq!(encode_slide_hash(9), "#/10");
    }

    #[test]
    fn test_parse_accepted_forms() {
        for hash in ["#/3", "#3", "/3", "3", " #/3 "] {
            assert_eq!(parse_slide_hash(hash, 5), Some(2), "{hash:?}");
        }
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(parse_slide_hash("", 5), None);
        assert_eq!(parse_slide_hash("#/0", 5), None);
        assert_eq!(parse_slide_hash("#/6", 5), None);
        assert_eq!(parse_slide_hash("#/intro", 5), None);
        assert_eq!(parse_slide_hash("#/-1", 5), None);
        assert_eq!(parse_slide_hash("#/1", 0), None);
        assert_eq!(parse_slide_hash("#/99999999999999999999999999", 5), None);
    }

    #[test]
    fn test_round_trip_through_deck_bounds() {
        for index in 0..4 {
            assert_eq!(parse_slide_hash(&encode_slide_hash(index), 4), Some(index));
        }
    }
}
