//! Grapheme cluster boundaries for caret placement.
//!
//! Movement and caret snapping operate on user-perceived characters, not
//! runes. The boundary table lists the rune offset of every grapheme cluster
//! boundary in the document, endpoints included, so snapping is a binary
//! search.

use unicode_segmentation::UnicodeSegmentation;

/// Rune offsets of every grapheme cluster boundary in `text`, starting with
/// `0` and ending with the rune count.
pub(crate) fn grapheme_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::with_capacity(text.len() / 2 + 2);
    boundaries.push(0);
    let mut runes = 0;
    for cluster in text.graphemes(true) {
        runes += cluster.chars().count();
        boundaries.push(runes);
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_boundaries() {
        assert_eq!(grapheme_boundaries("abc"), vec![0, 1, 2, 3]);
        assert_eq!(grapheme_boundaries(""), vec![0]);
    }

    #[test]
    fn test_combining_mark_joins_cluster() {
        // "e" + COMBINING ACUTE ACCENT is a single cluster of two runes.
        assert_eq!(grapheme_boundaries("e\u{301}x"), vec![0, 2, 3]);
    }

    #[test]
    fn test_emoji_zwj_sequence_is_one_cluster() {
        // Family emoji: four scalar values joined by ZWJs.
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F466}";
        let runes = family.chars().count();
        assert_eq!(grapheme_boundaries(family), vec![0, runes]);
    }

    #[test]
    fn test_crlf_is_one_cluster() {
        assert_eq!(grapheme_boundaries("a\r\nb"), vec![0, 1, 3, 4]);
    }
}
