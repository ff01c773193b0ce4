//! Cursor-position index over a shaped glyph stream.
//!
//! As glyphs arrive, the index records every valid caret position (one per
//! rune at each cluster boundary, with cluster advances distributed
//! proportionally), per-screen-line metrics, and per-paragraph pixel ranges.
//! Queries map between rune offsets, line/column positions and pixel
//! coordinates, and `locate` produces selection rectangles that split
//! correctly where a line mixes text directions.

use crate::geom::{Point, Rect};
use crate::glyph::{Glyph, GlyphFlags};

/// A caret position in screen line and column coordinates (columns are
/// counted in runes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ScreenPos {
    /// Screen line index.
    pub line: usize,
    /// Column within the line, in runes.
    pub col: usize,
}

/// One valid caret position in the laid-out text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaretPosition {
    /// Rune offset in the document.
    pub runes: usize,
    /// Screen line and column.
    pub line_col: ScreenPos,
    /// Pixel x of the caret.
    pub x: f32,
    /// Baseline y of the caret's screen line.
    pub y: f32,
    /// Ascent above the baseline.
    pub ascent: f32,
    /// Descent below the baseline.
    pub descent: f32,
    /// Index of the shaping run this position belongs to within its line.
    pub run_index: usize,
    /// Whether the run progresses toward the paragraph origin (RTL).
    pub toward_origin: bool,
}

/// Size and position of one laid-out screen line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenLine {
    /// Left edge of the line.
    pub x_off: f32,
    /// Baseline y of the line.
    pub y_off: f32,
    /// Width in pixels.
    pub width: f32,
    /// Ascent shared by the line's glyphs.
    pub ascent: f32,
    /// Descent shared by the line's glyphs.
    pub descent: f32,
    /// Number of glyphs on the line.
    pub glyphs: usize,
}

/// Pixel coordinates of the start and end of one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParagraphRange {
    /// X of the paragraph's first glyph.
    pub start_x: f32,
    /// Baseline y of the paragraph's first glyph.
    pub start_y: f32,
    /// X of the paragraph's last glyph.
    pub end_x: f32,
    /// Baseline y of the paragraph's last glyph.
    pub end_y: f32,
}

impl ParagraphRange {
    fn from_glyph(gl: &Glyph) -> Self {
        Self {
            start_x: gl.x,
            start_y: gl.y,
            end_x: gl.x,
            end_y: gl.y,
        }
    }
}

/// A highlight rectangle covering part of the laid-out text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Bounding box, relative to the viewport passed to `locate`.
    pub bounds: Rect,
    /// Vertical pixels between the baseline and the bottom of `bounds`.
    pub baseline: f32,
}

fn make_region(line: &ScreenLine, y: f32, start: f32, end: f32) -> Region {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Region {
        bounds: Rect::new(
            Point::new(start, y - line.ascent),
            Point::new(end, y + line.descent),
        ),
        baseline: line.descent,
    }
}

/// Index of caret positions, screen lines and paragraph ranges built from a
/// glyph stream.
#[derive(Debug)]
pub struct GlyphIndex {
    glyphs: Vec<Glyph>,
    positions: Vec<CaretPosition>,
    screen_lines: Vec<ScreenLine>,
    paragraph_ranges: Vec<ParagraphRange>,

    current_line_min: f32,
    current_line_max: f32,
    current_line_glyphs: usize,
    pos: CaretPosition,
    cluster_advance: f32,
    truncated: bool,
    mid_cluster: bool,
}

impl GlyphIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        let mut index = Self {
            glyphs: Vec::new(),
            positions: Vec::new(),
            screen_lines: Vec::new(),
            paragraph_ranges: Vec::new(),
            current_line_min: 0.0,
            current_line_max: 0.0,
            current_line_glyphs: 0,
            pos: CaretPosition::default(),
            cluster_advance: 0.0,
            truncated: false,
            mid_cluster: false,
        };
        index.reset();
        index
    }

    /// Prepare the index for a fresh shaping pass.
    pub fn reset(&mut self) {
        self.glyphs.clear();
        self.positions.clear();
        self.screen_lines.clear();
        self.paragraph_ranges.clear();
        self.paragraph_ranges.push(ParagraphRange::default());
        self.current_line_min = 0.0;
        self.current_line_max = 0.0;
        self.current_line_glyphs = 0;
        self.pos = CaretPosition::default();
        self.cluster_advance = 0.0;
        self.truncated = false;
        self.mid_cluster = false;
    }

    /// All glyphs processed so far.
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// All caret positions, sorted by rune offset.
    pub fn positions(&self) -> &[CaretPosition] {
        &self.positions
    }

    /// Per-screen-line metrics.
    pub fn screen_lines(&self) -> &[ScreenLine] {
        &self.screen_lines
    }

    /// Per-paragraph pixel ranges.
    pub fn paragraph_ranges(&self) -> &[ParagraphRange] {
        &self.paragraph_ranges
    }

    /// Whether the shaper truncated the text.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Glyph range `[start, end)` of screen line `line` within
    /// [`GlyphIndex::glyphs`].
    pub fn line_glyph_range(&self, line: usize) -> (usize, usize) {
        let mut start = 0;
        for l in self.screen_lines.iter().take(line) {
            start += l.glyphs;
        }
        let count = self.screen_lines.get(line).map_or(0, |l| l.glyphs);
        (start, start + count)
    }

    fn track_line(&mut self, gl: &Glyph) {
        if self.glyphs.is_empty() {
            self.paragraph_ranges[0] = ParagraphRange::from_glyph(gl);
        }
        if gl.flags.contains(GlyphFlags::PARAGRAPH_START) {
            self.paragraph_ranges.push(ParagraphRange::from_glyph(gl));
        } else {
            let last = self
                .paragraph_ranges
                .last_mut()
                .expect("paragraph range list is never empty");
            last.end_x = gl.x;
            last.end_y = gl.y;
        }
    }

    fn insert_position(&mut self, pos: CaretPosition) {
        if let Some(last) = self.positions.last_mut() {
            if last.runes == pos.runes && (last.y != pos.y || last.x == pos.x) {
                // A consecutive position with the same logical offset
                // overwrites the previous one.
                *last = pos;
                return;
            }
        }
        self.positions.push(pos);
    }

    /// Index one glyph, generating the caret positions it carries.
    pub fn process(&mut self, gl: Glyph) {
        self.track_line(&gl);
        self.glyphs.push(gl);
        self.current_line_glyphs += 1;
        if self.positions.is_empty() {
            self.current_line_min = f32::MAX;
            self.current_line_max = 0.0;
        }
        if gl.x < self.current_line_min {
            self.current_line_min = gl.x;
        }
        if gl.x + gl.advance > self.current_line_max {
            self.current_line_max = gl.x + gl.advance;
        }

        let needs_new_line = gl.flags.contains(GlyphFlags::LINE_BREAK);
        let needs_new_run = gl.flags.contains(GlyphFlags::RUN_BREAK);
        let breaks_paragraph = gl.flags.contains(GlyphFlags::PARAGRAPH_BREAK);
        let breaks_cluster = gl.flags.contains(GlyphFlags::CLUSTER_BREAK);
        // New positions are generated for cluster-terminating glyphs with
        // runes that are not hard paragraph breaks.
        let insert_positions_within = breaks_cluster && !breaks_paragraph && gl.runes > 0;

        self.pos.toward_origin = gl.flags.contains(GlyphFlags::TOWARD_ORIGIN);
        if !self.mid_cluster {
            // The caret position prior to the glyph.
            self.pos.x = gl.x;
            self.pos.y = gl.y;
            self.pos.ascent = gl.ascent;
            self.pos.descent = gl.descent;
            if self.pos.toward_origin {
                self.pos.x += gl.advance;
            }
            let pos = self.pos;
            self.insert_position(pos);
        }

        self.mid_cluster = !breaks_cluster;

        if breaks_paragraph {
            // Paragraph breaks are zero-width; a position on both sides
            // would be visually identical. Count their runes and move on.
            self.cluster_advance = 0.0;
            self.pos.runes += gl.runes;
        }
        self.cluster_advance += gl.advance;

        if insert_positions_within {
            self.pos.y = gl.y;
            self.pos.ascent = gl.ascent;
            self.pos.descent = gl.descent;
            let width = self.cluster_advance;
            let mut position_count = gl.runes;
            let mut runes_per_position = 1;
            if gl.flags.contains(GlyphFlags::TRUNCATOR) {
                // The truncator is a single unit, either selected or not.
                position_count = 1;
                runes_per_position = gl.runes;
                self.truncated = true;
            }
            let mut per_rune = width / position_count as f32;
            let mut adjust = 0.0;
            if self.pos.toward_origin {
                // RTL: step from the far edge of the cluster back toward x.
                adjust = width;
                per_rune = -per_rune;
            }
            for i in 1..=position_count {
                self.pos.x = gl.x + adjust + per_rune * i as f32;
                self.pos.runes += runes_per_position;
                self.pos.line_col.col += runes_per_position;
                let pos = self.pos;
                self.insert_position(pos);
            }
            self.cluster_advance = 0.0;
        }

        if needs_new_run {
            self.pos.run_index += 1;
        }
        if needs_new_line {
            let (ascent, descent) = self
                .positions
                .last()
                .map(|p| (p.ascent, p.descent))
                .unwrap_or((gl.ascent, gl.descent));
            self.screen_lines.push(ScreenLine {
                x_off: self.current_line_min,
                y_off: gl.y,
                width: self.current_line_max - self.current_line_min,
                ascent,
                descent,
                glyphs: self.current_line_glyphs,
            });
            self.pos.line_col.line += 1;
            self.pos.line_col.col = 0;
            self.pos.run_index = 0;
            self.current_line_min = f32::MAX;
            self.current_line_max = 0.0;
            self.current_line_glyphs = 0;
        }
    }

    /// The largest caret position with `runes <= rune_idx` (an exact match
    /// wins), plus its index into the positions array.
    pub fn closest_to_rune(&self, rune_idx: usize) -> (CaretPosition, usize) {
        if self.positions.is_empty() {
            return (CaretPosition::default(), 0);
        }
        let mut i = self.positions.partition_point(|p| p.runes < rune_idx);
        if i > 0 {
            i -= 1;
        }
        let closest = self.positions[i];
        let closest_i = i;
        while i < self.positions.len() && self.positions[i].runes <= rune_idx {
            if self.positions[i].runes == rune_idx {
                return (self.positions[i], i);
            }
            i += 1;
        }
        (closest, closest_i)
    }

    /// The position after `pos` in the index, or `(pos, true)` at the end.
    /// `pos` must be an unmodified position previously returned by one of
    /// the `closest_*` queries.
    fn increment_position(&self, pos: CaretPosition) -> (CaretPosition, bool) {
        let (mut candidate, mut index) = self.closest_to_rune(pos.runes);
        while candidate != pos && index + 1 < self.positions.len() {
            index += 1;
            candidate = self.positions[index];
        }
        if index + 1 < self.positions.len() {
            (self.positions[index + 1], false)
        } else {
            (candidate, true)
        }
    }

    /// The caret position closest to `(line, col)`.
    pub fn closest_to_line_col(&self, line_col: ScreenPos) -> CaretPosition {
        if self.positions.is_empty() {
            return CaretPosition::default();
        }
        let mut i = self.positions.partition_point(|p| p.line_col < line_col);
        if i > 0 {
            i -= 1;
        }
        let prior = self.positions[i];
        if i + 1 >= self.positions.len() {
            return prior;
        }
        let next = self.positions[i + 1];
        if next.line_col != line_col {
            return prior;
        }
        next
    }

    /// The caret position closest to the pixel coordinate `(x, y)`.
    ///
    /// Bidi text makes x non-monotone within a line, so after the vertical
    /// binary search the horizontal scan is linear.
    pub fn closest_to_xy(&self, x: f32, y: f32) -> CaretPosition {
        if self.positions.is_empty() {
            return CaretPosition::default();
        }
        let i = self.positions.partition_point(|p| p.y + p.descent < y);
        if i == self.positions.len() {
            return self.positions[i - 1];
        }
        let first = self.positions[i];
        let mut closest = i;
        let mut closest_dist = (first.x - x).abs();
        let line = first.line_col.line;
        for j in i + 1..self.positions.len() {
            let candidate = self.positions[j];
            if candidate.line_col.line != line {
                break;
            }
            let distance = (candidate.x - x).abs();
            if distance < 0.5 {
                return candidate;
            }
            if distance < closest_dist {
                closest_dist = distance;
                closest = j;
            }
        }
        self.positions[closest]
    }

    /// Highlight regions covering the runes in `[start_rune, end_rune)`,
    /// clipped to `viewport` and reported relative to it. Regions split at
    /// run-direction changes so selections follow bidi text.
    pub fn locate(&self, viewport: Rect, start_rune: usize, end_rune: usize) -> Vec<Region> {
        let (start_rune, end_rune) = if start_rune > end_rune {
            (end_rune, start_rune)
        } else {
            (start_rune, end_rune)
        };
        let mut regions = Vec::new();
        let (caret_start, _) = self.closest_to_rune(start_rune);
        let (caret_end, _) = self.closest_to_rune(end_rune);

        for line_idx in caret_start.line_col.line..self.screen_lines.len() {
            if line_idx > caret_end.line_col.line {
                break;
            }
            let pos = self.closest_to_line_col(ScreenPos {
                line: line_idx,
                col: 0,
            });
            if pos.y + pos.descent < viewport.min.y {
                continue;
            }
            if pos.y - pos.ascent > viewport.max.y {
                break;
            }
            let line = self.screen_lines[line_idx];
            if line_idx > caret_start.line_col.line && line_idx < caret_end.line_col.line {
                // The whole line is selected.
                let start_x = line.x_off;
                let end_x = start_x + line.width;
                regions.push(make_region(&line, pos.y, start_x, end_x));
                continue;
            }
            let mut selection_start = if line_idx != caret_start.line_col.line {
                // This line does not contain the beginning of the selection.
                self.closest_to_line_col(ScreenPos {
                    line: line_idx,
                    col: 0,
                })
            } else {
                caret_start
            };
            let selection_end = if line_idx != caret_end.line_col.line {
                // This line does not contain the end of the selection.
                self.closest_to_line_col(ScreenPos {
                    line: line_idx,
                    col: usize::MAX,
                })
            } else {
                caret_end
            };

            let mut eof = false;
            'line_loop: while !eof {
                let start_x = selection_start.x;
                if selection_start.run_index == selection_end.run_index {
                    regions.push(make_region(&line, pos.y, start_x, selection_end.x));
                    break;
                }
                let current_direction = selection_start.toward_origin;
                let mut previous = selection_start;
                while !eof {
                    // Advance to the next shaping run.
                    let start_run = selection_start.run_index;
                    while selection_start.run_index == start_run {
                        previous = selection_start;
                        let (next, at_end) = self.increment_position(selection_start);
                        selection_start = next;
                        eof = at_end;
                        if eof {
                            regions.push(make_region(&line, pos.y, start_x, selection_start.x));
                            break 'line_loop;
                        }
                    }
                    if selection_start.toward_origin != current_direction {
                        regions.push(make_region(&line, pos.y, start_x, previous.x));
                        break;
                    }
                    if selection_start.run_index == selection_end.run_index {
                        regions.push(make_region(&line, pos.y, start_x, selection_end.x));
                        break 'line_loop;
                    }
                }
            }
        }

        for region in &mut regions {
            region.bounds = region.bounds.translate(-viewport.min.x, -viewport.min.y);
        }
        regions
    }
}

impl Default for GlyphIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{FakeShaper, GlyphShaper, ShaperParams};

    fn index_of(text: &str) -> GlyphIndex {
        let mut index = GlyphIndex::new();
        let mut shaper = FakeShaper::new();
        shaper.layout(&ShaperParams::default(), text);
        while let Some(g) = shaper.next_glyph() {
            index.process(g);
        }
        index
    }

    #[test]
    fn test_positions_cover_every_rune() {
        let index = index_of("abc");
        // Positions 0..=3 exist; position 3 is the line-end caret slot.
        assert_eq!(index.positions().len(), 4);
        for (i, p) in index.positions().iter().enumerate() {
            assert_eq!(p.runes, i);
        }
    }

    #[test]
    fn test_screen_lines_per_paragraph() {
        let index = index_of("ab\ncd");
        assert_eq!(index.screen_lines().len(), 2);
        assert_eq!(index.screen_lines()[0].glyphs, 3);
        assert_eq!(index.screen_lines()[1].glyphs, 2);
    }

    #[test]
    fn test_closest_to_rune() {
        let index = index_of("ab\ncd");
        let (p, _) = index.closest_to_rune(4);
        assert_eq!(p.runes, 4);
        assert_eq!(p.line_col, ScreenPos { line: 1, col: 1 });
        // Past the end clamps to the last position.
        let (p, _) = index.closest_to_rune(99);
        assert_eq!(p.runes, 5);
    }

    #[test]
    fn test_closest_to_line_col() {
        let index = index_of("ab\ncd");
        let p = index.closest_to_line_col(ScreenPos { line: 1, col: 0 });
        assert_eq!(p.runes, 3);
        // A column past the line end clamps to the line's last position.
        let p = index.closest_to_line_col(ScreenPos {
            line: 0,
            col: usize::MAX,
        });
        assert_eq!(p.runes, 2);
    }

    #[test]
    fn test_closest_to_xy() {
        let index = index_of("ab\ncd");
        let first = index.positions()[0];
        let p = index.closest_to_xy(first.x, first.y);
        assert_eq!(p.runes, 0);

        let target = index.closest_to_line_col(ScreenPos { line: 1, col: 1 });
        let p = index.closest_to_xy(target.x, target.y);
        assert_eq!(p.runes, target.runes);
    }

    #[test]
    fn test_empty_final_line_has_a_position() {
        let index = index_of("ab\n");
        assert_eq!(index.screen_lines().len(), 2);
        let p = index.closest_to_line_col(ScreenPos { line: 1, col: 0 });
        assert_eq!(p.runes, 3);
        assert_eq!(p.x, 0.0);
    }

    #[test]
    fn test_locate_single_line_selection() {
        let index = index_of("abcd");
        let viewport = Rect::new(Point::new(0.0, 0.0), Point::new(1000.0, 1000.0));
        let regions = index.locate(viewport, 1, 3);
        assert_eq!(regions.len(), 1);
        let (p1, _) = index.closest_to_rune(1);
        let (p3, _) = index.closest_to_rune(3);
        assert_eq!(regions[0].bounds.min.x, p1.x);
        assert_eq!(regions[0].bounds.max.x, p3.x);
    }

    #[test]
    fn test_locate_multi_line_selection() {
        let index = index_of("ab\ncd\nef");
        let viewport = Rect::new(Point::new(0.0, 0.0), Point::new(1000.0, 1000.0));
        let regions = index.locate(viewport, 1, 7);
        // One region per touched screen line.
        assert_eq!(regions.len(), 3);
    }
}
