//! Auto-indentation.
//!
//! Breaking a line carries the previous line's leading indent over to the
//! new one, and breaking between a configured bracket pair opens an extra
//! indented line with the caret on it. Multi-line indent and dedent shift
//! every selected non-empty line by one tab (soft or hard).

use crate::text_view::TextView;

/// Leading-whitespace depth of `line`: tabs count as one level, each full
/// run of `tab_width` spaces counts as one level.
fn indent_levels(line: &str, tab_width: usize) -> usize {
    let mut levels = 0;
    let mut spaces = 0;
    for r in line.chars() {
        if r == '\t' {
            levels += 1;
        } else if r == ' ' {
            spaces += 1;
            if spaces == tab_width {
                levels += 1;
                spaces = 0;
            }
        } else {
            break;
        }
    }
    levels
}

impl TextView {
    /// Insert a line break at the caret, indenting the new line to the
    /// current line's level. When the caret sits between a configured
    /// bracket pair, one extra line with an additional indent level is
    /// opened between the brackets and the caret is placed on it. Returns
    /// the number of runes inserted.
    pub fn indent_on_break(&mut self) -> usize {
        if self.options.read_only {
            return 0;
        }
        let (sel_start, sel_end) = self.selection();
        let paragraph = self
            .source
            .line_index()
            .paragraph_of(sel_start.min(sel_end))
            .0;
        let line = self
            .source
            .read_line(paragraph)
            .map(|(text, _)| text)
            .unwrap_or_default();
        let levels = indent_levels(&line, self.options.tab_width);

        let mut inserted = String::from("\n");
        for _ in 0..levels {
            inserted.push_str(&self.options.indentation());
        }
        let changed = self.replace(sel_start, sel_end, &inserted);
        if changed == 0 {
            return 0;
        }
        changed + self.indent_inside_brackets(levels)
    }

    /// When the caret has just been placed after a line break between two
    /// matching brackets, open an indented line between them.
    fn indent_inside_brackets(&mut self, levels: usize) -> usize {
        let (start, end) = self.selection();
        if start == 0 || start != end {
            return 0;
        }

        let indentation = self.options.indentation();
        let indent_runes = indentation.chars().count();
        let moves = levels * indent_runes;
        if start < 2 + moves {
            return 0;
        }

        // The rune before the inserted break, and the rune after the caret.
        let Some(left_rune) = self.source.read_rune_at(start - 2 - moves) else {
            return 0;
        };
        let Some(right_rune) = self.source.read_rune_at(start.min(self.source.len())) else {
            return 0;
        };
        if self.options.bracket_pairs.get(&left_rune) != Some(&right_rune) {
            return 0;
        }

        // Open the extra line before the closing bracket's indent and park
        // the caret at the end of it.
        let insert_at = start - moves;
        let mut extra = String::new();
        for _ in 0..=levels {
            extra.push_str(&indentation);
        }
        extra.push('\n');
        let inserted = self.replace(insert_at, insert_at, &extra);
        let caret = insert_at + (levels + 1) * indent_runes;
        self.set_caret(caret, caret);
        inserted
    }

    /// Indent (or dedent) each non-empty line covered by the selection by
    /// one tab. Returns the total rune delta applied.
    pub fn indent_lines(&mut self, dedent: bool) -> isize {
        if self.options.read_only {
            return 0;
        }
        let (caret_start, caret_end) = self.selection();
        let (_, caret_col) = self.caret_pos();
        let sel_min = caret_start.min(caret_end);
        let sel_max = caret_start.max(caret_end);

        let line_index = self.source.line_index();
        let (first_para, lines_start) = line_index.paragraph_of(sel_min);
        let (last_para, last_start) = line_index.paragraph_of(sel_max);
        let last_len = line_index
            .entries()
            .get(last_para)
            .map_or(0, |e| e.rune_len);
        let lines_end = last_start + last_len;

        let indentation = self.options.indentation();
        let indent_runes = indentation.chars().count() as isize;

        let mut rebuilt = String::new();
        let mut moves: isize = 0;
        let mut caret_moves: isize = 0;
        for para in first_para..=last_para {
            let Some((line, _)) = self.source.read_line(para) else {
                continue;
            };
            if line.is_empty() {
                continue;
            }
            // An empty line carrying only its break is left alone.
            if line.chars().count() <= 1 && line.ends_with('\n') {
                rebuilt.push_str(&line);
                continue;
            }
            if dedent {
                let new_line = dedent_line(&line, self.options.tab_width);
                let delta = new_line.chars().count() as isize - line.chars().count() as isize;
                rebuilt.push_str(&new_line);
                moves += delta;
                caret_moves = if caret_end > caret_start {
                    delta.max(-(caret_col as isize))
                } else {
                    delta
                };
            } else {
                rebuilt.push_str(&indentation);
                rebuilt.push_str(&line);
                moves += indent_runes;
            }
        }

        self.replace(lines_start, lines_end, &rebuilt);

        if moves != 0 {
            let shift = |pos: usize, delta: isize| (pos as isize + delta).max(0) as usize;
            if dedent {
                if caret_end < caret_start {
                    let (s, e) = (shift(caret_start, moves), shift(caret_end, caret_moves));
                    self.set_caret(s, e);
                } else {
                    let (s, e) = (shift(caret_start, caret_moves), shift(caret_end, moves));
                    self.set_caret(s, e);
                }
            } else if caret_end > caret_start {
                self.set_caret(caret_start, shift(caret_end, moves));
            } else {
                self.set_caret(shift(caret_start, moves), shift(caret_end, moves));
            }
        }
        moves
    }
}

/// Remove one level of leading indentation: a run of left-over spaces
/// first, otherwise one tab just before the text.
pub(crate) fn dedent_line(line: &str, tab_width: usize) -> String {
    let mut levels = 0;
    let mut spaces = 0;
    let mut off = 0;
    for (i, r) in line.chars().enumerate() {
        if r == '\t' {
            spaces = 0;
            off = i;
            levels += 1;
        } else if r == ' ' {
            if spaces == 0 || spaces == tab_width {
                off = i;
                if spaces == tab_width {
                    spaces = 0;
                }
            }
            spaces += 1;
            if spaces == tab_width {
                levels += 1;
                continue;
            }
        } else {
            break;
        }
    }

    let runes: Vec<char> = line.chars().collect();
    if spaces > 0 {
        // Trim the left-over spaces first.
        let mut out: Vec<char> = runes[..off].to_vec();
        out.extend_from_slice(&runes[off + spaces..]);
        out.into_iter().collect()
    } else if levels > 0 {
        // Delete the single tab just before the non-space text.
        let mut out: Vec<char> = runes[..off].to_vec();
        out.extend_from_slice(&runes[off + 1..]);
        out.into_iter().collect()
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_view::TextView;

    fn view_with(text: &str) -> TextView {
        let mut view = TextView::new();
        view.set_text(text);
        view
    }

    #[test]
    fn test_break_copies_indent() {
        let mut view = view_with("\tabc");
        view.set_caret(4, 4);
        view.indent_on_break();
        assert_eq!(view.text(), "\tabc\n\t");
        assert_eq!(view.selection(), (6, 6));
    }

    #[test]
    fn test_break_between_brackets_opens_indented_line() {
        let mut view = view_with("abc{}");
        view.set_caret(4, 4);
        view.indent_on_break();
        assert_eq!(view.text(), "abc{\n\t\n}");
        // The caret rests at the end of the indented middle line.
        assert_eq!(view.selection(), (6, 6));
    }

    #[test]
    fn test_break_between_indented_brackets() {
        let mut view = view_with("\tf{}");
        view.set_caret(3, 3);
        view.indent_on_break();
        assert_eq!(view.text(), "\tf{\n\t\t\n\t}");
        assert_eq!(view.selection(), (6, 6));
    }

    #[test]
    fn test_dedent_line_rules() {
        // A tab goes first when there are no odd spaces.
        assert_eq!(dedent_line("\t\tx", 4), "\tx");
        // A full run of tab_width spaces counts as one level.
        assert_eq!(dedent_line("    x", 4), "x");
        // Left-over spaces are trimmed before any tab.
        assert_eq!(dedent_line("\t  x", 4), "\tx");
        // Nothing to dedent.
        assert_eq!(dedent_line("x", 4), "x");
    }

    #[test]
    fn test_indent_lines() {
        let mut view = view_with("a\nb\nc");
        view.set_caret(0, 5);
        let moves = view.indent_lines(false);
        assert_eq!(moves, 3);
        assert_eq!(view.text(), "\ta\n\tb\n\tc");
    }

    #[test]
    fn test_dedent_lines() {
        let mut view = view_with("\ta\n\tb");
        view.set_caret(0, 5);
        let moves = view.indent_lines(true);
        assert_eq!(moves, -2);
        assert_eq!(view.text(), "a\nb");
    }

    #[test]
    fn test_indent_skips_empty_lines() {
        let mut view = view_with("a\n\nb");
        view.set_caret(0, 4);
        view.indent_lines(false);
        assert_eq!(view.text(), "\ta\n\n\tb");
    }
}
