//! The text view: caret, selection, movement and the editing surface.
//!
//! A view owns a [`PieceTable`] and a glyph index and re-shapes lazily: any
//! buffer mutation or layout parameter change clears a `valid` flag, and the
//! next method that needs geometry runs a shaping pass. When no shaper is
//! installed the view falls back to the fake one-glyph-per-rune stream so
//! cursor arithmetic still works (the paint pass then renders nothing).
//!
//! All caret movement snaps to grapheme cluster boundaries. Vertical moves
//! carry a sub-pixel horizontal intention (`xoff`) so repeated line/page
//! movement returns to the same visual column.

use crate::completion::{is_symbol_char, CompletionContext};
use crate::geom::{Point, Rect, Size};
use crate::glyph::{FakeShaper, GlyphShaper, ShaperParams, WrapPolicy};
use crate::glyph_index::{CaretPosition, GlyphIndex, Region, ScreenPos};
use crate::graphemes::grapheme_boundaries;
use crate::options::EditorOptions;
use crate::piece::CaretPos;
use crate::table::PieceTable;

/// What happens to the selection end after a caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Keep the selection end where it is, extending the selection.
    Extend,
    /// Collapse the selection end onto the moved caret.
    Clear,
}

/// Shaped, navigable view over a piece-table document.
pub struct TextView {
    pub(crate) source: PieceTable,
    shaper: Option<Box<dyn GlyphShaper>>,
    params: ShaperParams,
    pub(crate) options: EditorOptions,
    pub(crate) index: GlyphIndex,
    graphemes: Vec<usize>,

    pub(crate) caret_start: usize,
    pub(crate) caret_end: usize,
    caret_xoff: f32,

    scroll_off: Point,
    view_size: Size,
    dims: Size,
    valid: bool,
}

impl TextView {
    /// Create an empty view with default options and no shaper.
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    /// Create an empty view with the given options.
    pub fn with_options(options: EditorOptions) -> Self {
        Self {
            source: PieceTable::empty(),
            shaper: None,
            params: ShaperParams::default(),
            options,
            index: GlyphIndex::new(),
            graphemes: Vec::new(),
            caret_start: 0,
            caret_end: 0,
            caret_xoff: 0.0,
            scroll_off: Point::default(),
            view_size: Size::default(),
            dims: Size::default(),
            valid: false,
        }
    }

    /// Install (or remove) the glyph shaper.
    pub fn set_shaper(&mut self, shaper: Option<Box<dyn GlyphShaper>>) {
        self.shaper = shaper;
        self.invalidate();
    }

    /// Current options.
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Replace the options; layout-affecting fields trigger a re-shape.
    pub fn set_options(&mut self, options: EditorOptions) {
        self.options = options;
        self.invalidate();
    }

    /// Replace the shaping parameters.
    pub fn set_shaper_params(&mut self, params: ShaperParams) {
        if self.params != params {
            self.params = params;
            self.invalidate();
        }
    }

    /// Set the viewport size in pixels.
    pub fn set_view_size(&mut self, size: Size) {
        if self.view_size != size {
            self.view_size = size;
            self.invalidate();
        }
    }

    /// The underlying text source.
    pub fn source(&self) -> &PieceTable {
        &self.source
    }

    /// Mutable access to the text source. The view conservatively re-shapes
    /// afterwards, since the borrow may be used to edit.
    pub fn source_mut(&mut self) -> &mut PieceTable {
        self.invalidate();
        &mut self.source
    }

    /// Replace the entire document, resetting the caret.
    pub fn set_text(&mut self, text: &str) {
        if self.options.read_only {
            return;
        }
        self.source.set_text(text);
        self.caret_start = 0;
        self.caret_end = 0;
        self.caret_xoff = 0.0;
        self.scroll_off = Point::default();
        self.invalidate();
    }

    /// The document text.
    pub fn text(&self) -> String {
        self.source.text()
    }

    /// Document length in runes.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Returns `true` for an empty document.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Report and clear the document's dirty bit.
    pub fn changed(&mut self) -> bool {
        self.source.changed()
    }

    /// Full size of the shaped text.
    pub fn dimensions(&mut self) -> Size {
        self.make_valid();
        self.dims
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    fn effective_params(&self) -> ShaperParams {
        let mut params = self.params;
        params.line_height_scale = self.options.line_height_scale;
        if !self.options.wrap_line {
            params.wrap = WrapPolicy::Off;
            params.max_width = f32::MAX;
        } else if self.view_size.width > 0.0 {
            params.max_width = self.view_size.width;
        }
        params
    }

    pub(crate) fn make_valid(&mut self) {
        if self.valid {
            return;
        }
        self.layout_text();
        self.valid = true;
    }

    fn layout_text(&mut self) {
        let text = self.source.text();
        let params = self.effective_params();
        self.index.reset();

        match &mut self.shaper {
            Some(shaper) => {
                shaper.layout(&params, &text);
                while let Some(glyph) = shaper.next_glyph() {
                    self.index.process(glyph);
                }
            }
            None => {
                // No shaper installed: synthesize one cluster-break glyph
                // per rune so cursor arithmetic keeps working.
                let mut fake = FakeShaper::new();
                fake.layout(&params, &text);
                while let Some(glyph) = fake.next_glyph() {
                    self.index.process(glyph);
                }
            }
        }

        self.graphemes = grapheme_boundaries(&text);

        let mut width = 0f32;
        let mut height = 0f32;
        for line in self.index.screen_lines() {
            width = width.max(line.x_off + line.width);
            height = height.max(line.y_off + line.descent);
        }
        self.dims = Size::new(width, height);
        log::debug!(
            "shaped {} runes into {} screen lines",
            self.source.len(),
            self.index.screen_lines().len()
        );
    }

    pub(crate) fn closest_to_rune(&mut self, rune_idx: usize) -> CaretPosition {
        self.make_valid();
        self.index.closest_to_rune(rune_idx).0
    }

    pub(crate) fn closest_to_line_col(&mut self, line: usize, col: usize) -> CaretPosition {
        self.make_valid();
        self.index.closest_to_line_col(ScreenPos { line, col })
    }

    pub(crate) fn closest_to_xy(&mut self, x: f32, y: f32) -> CaretPosition {
        self.make_valid();
        self.index.closest_to_xy(x, y)
    }

    fn closest_to_xy_graphemes(&mut self, x: f32, y: f32) -> CaretPosition {
        // Find the closest rune position, then pick the nearer of the two
        // grapheme boundaries around it.
        let pos = self.closest_to_xy(x, y);
        let first_option = self.move_by_graphemes(pos.runes, 0);
        let distance = if first_option > pos.runes { -1 } else { 1 };
        let second_option = self.move_by_graphemes(first_option, distance);
        let first = self.closest_to_rune(first_option);
        let second = self.closest_to_rune(second_option);
        if (first.x - x).abs() > (second.x - x).abs() {
            second
        } else {
            first
        }
    }

    /// Rune index reached by moving `graphemes` cluster boundaries from
    /// `start_rune` (zero re-snaps to the nearest boundary).
    pub(crate) fn move_by_graphemes(&mut self, start_rune: usize, graphemes: isize) -> usize {
        self.make_valid();
        if self.graphemes.is_empty() {
            return start_rune;
        }
        let idx = match self.graphemes.binary_search(&start_rune) {
            Ok(i) | Err(i) => i,
        };
        let idx = (idx as isize + graphemes).clamp(0, self.graphemes.len() as isize - 1) as usize;
        let target = self.graphemes[idx];
        self.closest_to_rune(target).runes
    }

    fn clamp_caret_to_graphemes(&mut self) {
        self.caret_start = self.move_by_graphemes(self.caret_start, 0);
        self.caret_end = self.move_by_graphemes(self.caret_end, 0);
    }

    fn update_selection(&mut self, mode: SelectionMode) {
        if mode == SelectionMode::Clear {
            self.caret_end = self.caret_start;
        }
    }

    /// Selection start and end in runes; start may be after end.
    pub fn selection(&self) -> (usize, usize) {
        (self.caret_start, self.caret_end)
    }

    /// Selection length in runes.
    pub fn selection_len(&self) -> usize {
        self.caret_start.abs_diff(self.caret_end)
    }

    /// Move the caret to `start` and the selection end to `end`, snapping
    /// both to grapheme boundaries.
    pub fn set_caret(&mut self, start: usize, end: usize) {
        self.caret_start = self.closest_to_rune(start).runes;
        self.caret_end = self.closest_to_rune(end).runes;
        self.clamp_caret_to_graphemes();
    }

    /// Collapse the selection end onto the caret.
    pub fn clear_selection(&mut self) {
        self.caret_end = self.caret_start;
    }

    /// The currently selected text.
    pub fn selected_text(&self) -> String {
        let start = self.caret_start.min(self.caret_end);
        let end = self.caret_start.max(self.caret_end);
        self.source.text_range(start, end)
    }

    /// Move the caret and selection end by whole grapheme clusters;
    /// positive is forward.
    pub fn move_caret(&mut self, start_delta: isize, end_delta: isize) {
        self.caret_xoff = 0.0;
        self.caret_start = self.move_by_graphemes(self.caret_start, start_delta);
        self.caret_end = self.move_by_graphemes(self.caret_end, end_delta);
    }

    /// Move the caret vertically by `distance` screen lines, preserving the
    /// visual column across calls.
    pub fn move_lines(&mut self, distance: isize, mode: SelectionMode) {
        let caret = self.closest_to_rune(self.caret_start);
        let x = caret.x + self.caret_xoff;
        let target_line = (caret.line_col.line as isize + distance).max(0) as usize;
        let pos = self.closest_to_line_col(target_line, 0);
        let pos = self.closest_to_xy_graphemes(x, pos.y);
        self.caret_start = pos.runes;
        self.caret_xoff = x - pos.x;
        self.update_selection(mode);
    }

    /// Move the caret by viewport-height pages.
    pub fn move_pages(&mut self, pages: isize, mode: SelectionMode) {
        let caret = self.closest_to_rune(self.caret_start);
        let x = caret.x + self.caret_xoff;
        let y = caret.y + pages as f32 * self.view_size.height;
        let pos = self.closest_to_xy_graphemes(x, y);
        self.caret_start = pos.runes;
        self.caret_xoff = x - pos.x;
        self.update_selection(mode);
    }

    fn rune_in_direction(&self, runes: usize, direction: isize) -> Option<char> {
        if direction < 0 {
            self.source.read_rune_before_bytes(self.source.rune_to_byte(runes))
        } else {
            self.source.read_rune_at(runes)
        }
    }

    /// Move the caret to the next word boundary in the given direction;
    /// magnitudes greater than one skip that many words. A word is a
    /// whitespace-delimited run.
    pub fn move_words(&mut self, distance: isize, mode: SelectionMode) {
        let (words, direction) = if distance < 0 {
            ((-distance) as usize, -1isize)
        } else {
            (distance as usize, 1isize)
        };
        let len = self.source.len();
        let mut runes = self.closest_to_rune(self.caret_start).runes;
        let at_end = |runes: usize| runes == 0 || runes == len;

        for _ in 0..words {
            while !at_end(runes)
                && self
                    .rune_in_direction(runes, direction)
                    .is_some_and(|c| c.is_whitespace())
            {
                runes = self.move_by_graphemes(runes, direction);
            }
            runes = self.move_by_graphemes(runes, direction);
            while !at_end(runes)
                && self
                    .rune_in_direction(runes, direction)
                    .is_some_and(|c| !c.is_whitespace())
            {
                runes = self.move_by_graphemes(runes, direction);
            }
        }

        self.caret_start = runes;
        self.caret_xoff = 0.0;
        self.update_selection(mode);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret to the start of its screen line.
    pub fn move_line_start(&mut self, mode: SelectionMode) {
        let caret = self.closest_to_rune(self.caret_start);
        let caret = self.closest_to_line_col(caret.line_col.line, 0);
        self.caret_start = caret.runes;
        self.caret_xoff = -caret.x;
        self.update_selection(mode);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret to the end of its screen line.
    pub fn move_line_end(&mut self, mode: SelectionMode) {
        let caret = self.closest_to_rune(self.caret_start);
        let caret = self.closest_to_line_col(caret.line_col.line, usize::MAX);
        self.caret_start = caret.runes;
        self.caret_xoff = self.line_width_limit() - caret.x;
        self.update_selection(mode);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret to the start of the document.
    pub fn move_text_start(&mut self, mode: SelectionMode) {
        let caret = self.closest_to_rune(self.caret_end);
        self.caret_start = 0;
        self.caret_end = caret.runes;
        self.caret_xoff = -caret.x;
        self.update_selection(mode);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret to the end of the document.
    pub fn move_text_end(&mut self, mode: SelectionMode) {
        let caret = self.closest_to_rune(usize::MAX);
        self.caret_start = caret.runes;
        self.caret_xoff = self.line_width_limit() - caret.x;
        self.update_selection(mode);
        self.clamp_caret_to_graphemes();
    }

    fn line_width_limit(&mut self) -> f32 {
        if self.options.wrap_line && self.view_size.width > 0.0 {
            self.view_size.width
        } else {
            self.make_valid();
            self.dims.width
        }
    }

    /// Move the caret to the position closest to `point` (viewport
    /// coordinates), aligned to a grapheme boundary.
    pub fn move_coord(&mut self, point: Point) {
        let x = point.x + self.scroll_off.x;
        let y = point.y + self.scroll_off.y;
        self.caret_start = self.closest_to_xy_graphemes(x, y).runes;
        self.caret_xoff = 0.0;
    }

    /// Replace `[start, end)` with `text`, rewriting the caret: carets
    /// inside the replaced range collapse to the end of the inserted text,
    /// carets after it shift by the length delta. Returns the number of
    /// runes inserted.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> usize {
        if self.options.read_only {
            return 0;
        }
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let len = self.source.len();
        let start = start.min(len);
        let end = end.min(len);
        let inserted = text.chars().count();
        if !self.source.replace(start, end, text) {
            return 0;
        }
        let new_end = start + inserted;
        let adjust = |pos: usize| -> usize {
            if pos >= start && pos <= end {
                new_end
            } else if pos > end {
                (pos + new_end) - end
            } else {
                pos
            }
        };
        self.caret_start = adjust(self.caret_start);
        self.caret_end = adjust(self.caret_end);
        self.caret_xoff = 0.0;
        self.invalidate();
        inserted
    }

    /// Replace the current selection with `text`.
    pub fn insert(&mut self, text: &str) -> usize {
        let (start, end) = self.selection();
        self.replace(start, end, text)
    }

    /// Handle typed input: a single rune registered in
    /// `auto_complete_pairs` inserts its closer as well and leaves the caret
    /// between the pair.
    pub fn insert_typed(&mut self, text: &str) -> usize {
        if self.options.read_only {
            return 0;
        }
        let mut chars = text.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if let Some(&closing) = self.options.auto_complete_pairs.get(&ch) {
                let (start, end) = self.selection();
                let mut pair = String::new();
                pair.push(ch);
                pair.push(closing);
                let inserted = self.replace(start, end, &pair);
                self.move_caret(-1, -1);
                return inserted;
            }
        }
        self.insert(text)
    }

    /// Insert a tab at the caret, honoring the soft-tab setting.
    pub fn insert_tab(&mut self) -> usize {
        let indent = self.options.indentation();
        self.insert(&indent)
    }

    /// Delete `graphemes` clusters relative to the caret (negative is
    /// backspace), or the selection when one exists.
    pub fn delete_graphemes(&mut self, graphemes: isize) {
        if self.options.read_only || graphemes == 0 {
            return;
        }
        let (start, end) = self.selection();
        if start != end {
            self.replace(start, end, "");
            return;
        }
        let target = self.move_by_graphemes(start, graphemes);
        self.replace(start.min(target), start.max(target), "");
    }

    /// Undo the last edit (or batch), applying the saved caret.
    pub fn undo(&mut self) -> Vec<CaretPos> {
        if self.options.read_only {
            return Vec::new();
        }
        let carets = self.source.undo();
        self.after_history(&carets);
        carets
    }

    /// Redo the last undone edit (or batch), applying the saved caret.
    pub fn redo(&mut self) -> Vec<CaretPos> {
        if self.options.read_only {
            return Vec::new();
        }
        let carets = self.source.redo();
        self.after_history(&carets);
        carets
    }

    fn after_history(&mut self, carets: &[CaretPos]) {
        if let Some(last) = carets.last() {
            self.caret_start = last.start;
            self.caret_end = last.end;
            self.caret_xoff = 0.0;
            self.invalidate();
            self.clamp_caret_to_graphemes();
        }
    }

    /// Begin an atomic edit group on the underlying source.
    pub fn group_op(&mut self) {
        self.source.group_op();
    }

    /// Close an atomic edit group.
    pub fn ungroup_op(&mut self) {
        self.source.ungroup_op();
    }

    /// Screen line and column of the caret.
    pub fn caret_pos(&mut self) -> (usize, usize) {
        let pos = self.closest_to_rune(self.caret_start);
        (pos.line_col.line, pos.line_col.col)
    }

    /// Caret pixel coordinates relative to the viewport.
    pub fn caret_coords(&mut self) -> Point {
        let pos = self.closest_to_rune(self.caret_start);
        Point::new(pos.x - self.scroll_off.x, pos.y - self.scroll_off.y)
    }

    /// Current scroll offset.
    pub fn scroll_off(&self) -> Point {
        self.scroll_off
    }

    /// Scroll by a relative amount, clamped to the content.
    pub fn scroll_rel(&mut self, dx: f32, dy: f32) {
        let (x, y) = (self.scroll_off.x + dx, self.scroll_off.y + dy);
        self.scroll_abs(x, y);
    }

    fn scroll_bounds(&mut self) -> Size {
        let dims = self.dimensions();
        Size::new(
            (dims.width - self.view_size.width).max(0.0),
            (dims.height - self.view_size.height).max(0.0),
        )
    }

    fn scroll_abs(&mut self, x: f32, y: f32) {
        let bounds = self.scroll_bounds();
        self.scroll_off.x = x.clamp(0.0, bounds.width);
        self.scroll_off.y = y.clamp(0.0, bounds.height);
    }

    /// Scroll the minimum distance that brings the caret into view.
    pub fn scroll_to_caret(&mut self) {
        let caret = self.closest_to_rune(self.caret_start);
        let min_y = caret.y - caret.ascent;
        let max_y = caret.y + caret.descent;
        let mut dist = 0.0;
        if min_y - self.scroll_off.y < 0.0 {
            dist = min_y - self.scroll_off.y;
        } else if max_y - (self.scroll_off.y + self.view_size.height) > 0.0 {
            dist = max_y - (self.scroll_off.y + self.view_size.height);
        }
        self.scroll_rel(0.0, dist);
    }

    /// Visible highlight regions covering `[start, end)` in runes.
    pub fn regions(&mut self, start: usize, end: usize) -> Vec<Region> {
        self.make_valid();
        let viewport = Rect::new(
            self.scroll_off,
            Point::new(
                self.scroll_off.x + self.view_size.width,
                self.scroll_off.y + self.view_size.height,
            ),
        );
        self.index.locate(viewport, start, end)
    }

    /// Shaped-geometry index for paint-time consumers.
    pub fn glyph_index(&mut self) -> &GlyphIndex {
        self.make_valid();
        &self.index
    }

    /// Snapshot the caret surroundings for completion. `input` is the text
    /// that was just typed, if any.
    pub fn completion_context(&mut self, input: &str) -> CompletionContext {
        let caret = self.closest_to_rune(self.caret_start);
        let rune_index = caret.runes;

        let mut prefix_start = rune_index;
        while prefix_start > 0 {
            match self.source.read_rune_at(prefix_start - 1) {
                Some(c) if is_symbol_char(c) => prefix_start -= 1,
                _ => break,
            }
        }
        let len = self.source.len();
        let mut suffix_end = rune_index;
        while suffix_end < len {
            match self.source.read_rune_at(suffix_end) {
                Some(c) if is_symbol_char(c) => suffix_end += 1,
                _ => break,
            }
        }

        CompletionContext {
            prefix: self.source.text_range(prefix_start, rune_index),
            suffix: self.source.text_range(rune_index, suffix_end),
            input: input.to_string(),
            line: caret.line_col.line,
            column: caret.line_col.col,
            rune_index,
            prefix_start,
            coords: Point::new(caret.x, caret.y),
        }
    }
}

impl Default for TextView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_with(text: &str) -> TextView {
        let mut view = TextView::new();
        view.set_text(text);
        view
    }

    #[test]
    fn test_insert_moves_caret() {
        let mut view = view_with("");
        view.insert("hi");
        assert_eq!(view.text(), "hi");
        assert_eq!(view.selection(), (2, 2));
    }

    #[test]
    fn test_replace_adjusts_caret_after_range() {
        let mut view = view_with("hello world");
        view.set_caret(11, 11);
        view.replace(0, 5, "hey");
        assert_eq!(view.text(), "hey world");
        assert_eq!(view.selection(), (9, 9));
    }

    #[test]
    fn test_replace_collapses_caret_inside_range() {
        let mut view = view_with("abcdef");
        view.set_caret(3, 3);
        view.replace(1, 5, "X");
        assert_eq!(view.text(), "aXf");
        assert_eq!(view.selection(), (2, 2));
    }

    #[test]
    fn test_move_caret_snaps_to_grapheme() {
        let mut view = view_with("ae\u{301}b");
        view.set_caret(0, 0);
        view.move_caret(1, 1);
        assert_eq!(view.selection(), (1, 1));
        view.move_caret(1, 1);
        // The combining sequence is one cluster: the caret lands after it.
        assert_eq!(view.selection(), (3, 3));
    }

    #[test]
    fn test_move_lines_preserves_column() {
        let mut view = view_with("abcd\nx\nefgh");
        view.set_caret(3, 3);
        view.move_lines(1, SelectionMode::Clear);
        // Line 1 only has one column to land on.
        let (line, col) = view.caret_pos();
        assert_eq!(line, 1);
        assert_eq!(col, 1);
        view.move_lines(1, SelectionMode::Clear);
        let (line, col) = view.caret_pos();
        assert_eq!(line, 2);
        assert_eq!(col, 3);
    }

    #[test]
    fn test_move_words() {
        let mut view = view_with("one two  three");
        view.set_caret(0, 0);
        view.move_words(1, SelectionMode::Clear);
        assert_eq!(view.selection().0, 3);
        view.move_words(1, SelectionMode::Clear);
        assert_eq!(view.selection().0, 7);
        view.move_words(-1, SelectionMode::Clear);
        assert_eq!(view.selection().0, 4);
    }

    #[test]
    fn test_move_line_start_end() {
        let mut view = view_with("ab\ncdef");
        view.set_caret(5, 5);
        view.move_line_start(SelectionMode::Clear);
        assert_eq!(view.selection(), (3, 3));
        view.move_line_end(SelectionMode::Clear);
        assert_eq!(view.selection(), (7, 7));
    }

    #[test]
    fn test_move_text_start_end() {
        let mut view = view_with("ab\ncd");
        view.set_caret(3, 3);
        view.move_text_end(SelectionMode::Clear);
        assert_eq!(view.selection(), (5, 5));
        view.move_text_start(SelectionMode::Clear);
        assert_eq!(view.selection(), (0, 0));
    }

    #[test]
    fn test_selection_extend_and_clear() {
        let mut view = view_with("abcdef");
        view.set_caret(1, 1);
        view.move_caret(2, 0);
        assert_eq!(view.selection(), (3, 1));
        assert_eq!(view.selected_text(), "bc");
        view.move_lines(0, SelectionMode::Clear);
        assert_eq!(view.selection_len(), 0);
    }

    #[test]
    fn test_insert_typed_auto_completes_pair() {
        let mut view = view_with("ab");
        view.set_caret(2, 2);
        view.insert_typed("(");
        assert_eq!(view.text(), "ab()");
        assert_eq!(view.selection(), (3, 3));
        view.insert_typed("x");
        assert_eq!(view.text(), "ab(x)");
    }

    #[test]
    fn test_delete_graphemes_backspace() {
        let mut view = view_with("ae\u{301}b");
        view.set_caret(4, 4);
        view.delete_graphemes(-1);
        assert_eq!(view.text(), "ae\u{301}");
        view.delete_graphemes(-1);
        assert_eq!(view.text(), "a");
    }

    #[test]
    fn test_read_only_blocks_mutation() {
        let mut view = view_with("abc");
        let mut options = EditorOptions::default();
        options.read_only = true;
        view.set_options(options);
        assert_eq!(view.insert("x"), 0);
        assert_eq!(view.insert_typed("("), 0);
        view.delete_graphemes(-1);
        assert_eq!(view.text(), "abc");
        assert!(view.undo().is_empty());
    }

    #[test]
    fn test_undo_restores_caret() {
        let mut view = view_with("abc");
        view.set_caret(3, 3);
        view.insert("d");
        assert_eq!(view.text(), "abcd");
        let carets = view.undo();
        assert_eq!(carets.len(), 1);
        assert_eq!(view.text(), "abc");
        assert_eq!(view.selection(), (3, 3));
    }

    #[test]
    fn test_completion_context() {
        let mut view = view_with("let va_lue = 1");
        view.set_caret(8, 8);
        let ctx = view.completion_context("_");
        assert_eq!(ctx.prefix, "va_l");
        assert_eq!(ctx.suffix, "ue");
        assert_eq!(ctx.rune_index, 8);
        assert_eq!(ctx.prefix_start, 4);
        assert_eq!(ctx.input, "_");
    }

    #[test]
    fn test_scroll_to_caret() {
        let mut view = view_with("a\nb\nc\nd\ne\nf\ng\nh");
        view.set_view_size(Size::new(100.0, 30.0));
        view.set_caret(14, 14);
        view.scroll_to_caret();
        assert!(view.scroll_off().y > 0.0);
        view.set_caret(0, 0);
        view.scroll_to_caret();
        assert_eq!(view.scroll_off().y, 0.0);
    }
}
