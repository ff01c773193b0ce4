//! Editor configuration.
//!
//! The recognized options and their effects; hosts may persist the struct
//! (it serializes) but the core itself never touches disk.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration consumed by the text view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorOptions {
    /// Number of spaces that visually represent a tab; also the soft-tab
    /// unit for indent and dedent.
    pub tab_width: usize,
    /// When `true`, Tab inserts `tab_width` spaces; otherwise a literal
    /// `'\t'`.
    pub soft_tab: bool,
    /// When `true`, lines soft-wrap at the viewport width; otherwise long
    /// lines extend horizontally.
    pub wrap_line: bool,
    /// Multiplier applied to the shaper's reported line height.
    pub line_height_scale: f32,
    /// Opening-to-closing rune pairs used by the bracket matcher and
    /// auto-indent.
    pub bracket_pairs: HashMap<char, char>,
    /// Pairs (brackets plus quotes) for which typing the opener inserts the
    /// closer and leaves the caret between them.
    pub auto_complete_pairs: HashMap<char, char>,
    /// When `true`, all mutating entry points no-op.
    pub read_only: bool,
}

impl EditorOptions {
    /// One level of indentation as text, honoring [`EditorOptions::soft_tab`].
    pub fn indentation(&self) -> String {
        if self.soft_tab {
            " ".repeat(self.tab_width)
        } else {
            "\t".to_string()
        }
    }
}

impl Default for EditorOptions {
    fn default() -> Self {
        let bracket_pairs: HashMap<char, char> =
            [('(', ')'), ('{', '}'), ('[', ']')].into_iter().collect();
        let mut auto_complete_pairs = bracket_pairs.clone();
        for quote in ['\'', '"', '`'] {
            auto_complete_pairs.insert(quote, quote);
        }
        Self {
            tab_width: 4,
            soft_tab: false,
            wrap_line: true,
            line_height_scale: 1.0,
            bracket_pairs,
            auto_complete_pairs,
            read_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EditorOptions::default();
        assert_eq!(options.tab_width, 4);
        assert!(!options.soft_tab);
        assert_eq!(options.bracket_pairs.get(&'{'), Some(&'}'));
        assert_eq!(options.auto_complete_pairs.get(&'"'), Some(&'"'));
        assert_eq!(options.indentation(), "\t");
    }

    #[test]
    fn test_soft_tab_indentation() {
        let options = EditorOptions {
            soft_tab: true,
            tab_width: 2,
            ..EditorOptions::default()
        };
        assert_eq!(options.indentation(), "  ");
    }
}
