//! Caret movement over the fake glyph stream (no shaper installed).

use quill_core::{Point, SelectionMode, Size, TextView};
use unicode_segmentation::UnicodeSegmentation;

fn view_with(text: &str) -> TextView {
    let mut view = TextView::new();
    view.set_text(text);
    view
}

/// Rune offsets of every grapheme boundary in `text`.
fn boundaries(text: &str) -> Vec<usize> {
    let mut out = vec![0];
    let mut runes = 0;
    for g in text.graphemes(true) {
        runes += g.chars().count();
        out.push(runes);
    }
    out
}

fn assert_on_boundary(view: &TextView, text: &str) {
    let bounds = boundaries(text);
    let (start, end) = view.selection();
    assert!(bounds.contains(&start), "caret start {} off-boundary", start);
    assert!(bounds.contains(&end), "caret end {} off-boundary", end);
}

#[test]
fn test_every_movement_lands_on_grapheme_boundaries() {
    // Mixed ASCII, combining mark, CJK and a ZWJ emoji across three lines.
    let text = "ab e\u{301}c\n你好 wor\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F466}ld\nlast";
    let mut view = view_with(text);
    view.set_view_size(Size::new(200.0, 40.0));
    view.set_caret(0, 0);

    for _ in 0..text.chars().count() + 2 {
        view.move_caret(1, 1);
        assert_on_boundary(&view, text);
    }
    for _ in 0..4 {
        view.move_caret(-1, -1);
        assert_on_boundary(&view, text);
    }
    view.move_lines(1, SelectionMode::Clear);
    assert_on_boundary(&view, text);
    view.move_lines(-1, SelectionMode::Extend);
    assert_on_boundary(&view, text);
    view.move_pages(1, SelectionMode::Clear);
    assert_on_boundary(&view, text);
    view.move_words(2, SelectionMode::Clear);
    assert_on_boundary(&view, text);
    view.move_words(-1, SelectionMode::Clear);
    assert_on_boundary(&view, text);
    view.move_line_end(SelectionMode::Clear);
    assert_on_boundary(&view, text);
    view.move_line_start(SelectionMode::Clear);
    assert_on_boundary(&view, text);
    view.move_text_end(SelectionMode::Clear);
    assert_on_boundary(&view, text);
    view.move_text_start(SelectionMode::Clear);
    assert_on_boundary(&view, text);
}

#[test]
fn test_vertical_moves_return_to_visual_column() {
    let mut view = view_with("longest line\nab\nanother long one");
    view.set_caret(8, 8);
    let (_, start_col) = view.caret_pos();
    assert_eq!(start_col, 8);

    // Down onto the short line: the column clamps.
    view.move_lines(1, SelectionMode::Clear);
    let (line, col) = view.caret_pos();
    assert_eq!(line, 1);
    assert_eq!(col, 2);

    // Down again: the remembered x intention brings the caret back out.
    view.move_lines(1, SelectionMode::Clear);
    let (line, col) = view.caret_pos();
    assert_eq!(line, 2);
    assert_eq!(col, 8);

    // And back up to the starting column.
    view.move_lines(-2, SelectionMode::Clear);
    let (line, col) = view.caret_pos();
    assert_eq!(line, 0);
    assert_eq!(col, 8);
}

#[test]
fn test_page_movement_uses_viewport_height() {
    let text = (0..20).map(|i| format!("line{}\n", i)).collect::<String>();
    let mut view = view_with(&text);
    // Roughly five fake-metric lines per page.
    view.set_view_size(Size::new(400.0, 5.0 * 16.8));
    view.set_caret(0, 0);

    view.move_pages(1, SelectionMode::Clear);
    let (line, _) = view.caret_pos();
    assert!(line >= 4 && line <= 6, "page-down landed on line {}", line);

    view.move_pages(-1, SelectionMode::Clear);
    let (line, _) = view.caret_pos();
    assert_eq!(line, 0);
}

#[test]
fn test_move_coord_picks_nearest_position() {
    let mut view = view_with("abcd\nefgh");
    view.set_view_size(Size::new(400.0, 400.0));
    let target = {
        view.set_caret(6, 6);
        view.caret_coords()
    };
    view.set_caret(0, 0);
    view.move_coord(Point::new(target.x + 0.25, target.y));
    assert_eq!(view.selection(), (6, 6));
}

#[test]
fn test_selection_extends_across_movements() {
    let mut view = view_with("one two three");
    view.set_caret(0, 0);
    view.move_words(2, SelectionMode::Extend);
    assert_eq!(view.selected_text(), "one two");
    view.move_caret(1, 0);
    assert_eq!(view.selected_text(), "one two ");
    view.move_words(-2, SelectionMode::Clear);
    assert_eq!(view.selection_len(), 0);
}

#[test]
fn test_caret_clamps_at_document_edges() {
    let mut view = view_with("ab");
    view.set_caret(0, 0);
    view.move_caret(-3, -3);
    assert_eq!(view.selection(), (0, 0));
    view.move_caret(10, 10);
    assert_eq!(view.selection(), (2, 2));
    // Vertical movement on a single-line document keeps the column.
    view.move_lines(5, SelectionMode::Clear);
    assert_eq!(view.selection().0, 2);
    view.move_lines(-5, SelectionMode::Clear);
    assert_eq!(view.selection().0, 2);
}

#[test]
fn test_empty_document_movement_is_stable() {
    let mut view = view_with("");
    view.move_caret(1, 1);
    view.move_lines(1, SelectionMode::Clear);
    view.move_words(1, SelectionMode::Clear);
    view.move_text_end(SelectionMode::Clear);
    assert_eq!(view.selection(), (0, 0));
}
