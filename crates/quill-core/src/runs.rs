//! Splitting a laid-out line into uniformly-styled glyph runs.
//!
//! The painter draws one run at a time: a contiguous glyph range sharing one
//! style, carrying its pixel offset within the line. The splitter walks the
//! styled intervals intersecting the line in order, emitting an unstyled run
//! for every gap and a styled run for every intersection. Syntax tokens and
//! decorations both lower to [`StyleSpan`]s, so one splitter serves both.

use crate::glyph::Glyph;

/// A styled rune interval, in document offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpan {
    /// Start rune offset.
    pub start: usize,
    /// End rune offset, exclusive.
    pub end: usize,
}

impl StyleSpan {
    /// Create a span covering `[start, end)`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A group of adjacent glyphs sharing one style.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderRun {
    /// First glyph of the run within the line.
    pub start: usize,
    /// One past the last glyph of the run.
    pub end: usize,
    /// Pixel offset of the run from the start of the line.
    pub offset: f32,
    /// Total advance of the run's glyphs.
    pub width: f32,
    /// Index of the span (in the slice passed to `split`) that styled this
    /// run; `None` for gap runs.
    pub span: Option<usize>,
}

impl RenderRun {
    /// Number of glyphs in the run.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` for a glyph-less run.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Reusable line-to-runs splitter.
#[derive(Debug, Default)]
pub struct LineSplitter {
    runs: Vec<RenderRun>,
    current: RenderRun,
    rune_off: usize,
    advance: f32,
    cursor: usize,
}

impl LineSplitter {
    /// Create an idle splitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split one line's glyphs into runs according to `spans`.
    ///
    /// `glyphs` are the line's glyphs in visual order, `line_rune_off` the
    /// rune offset of the line's first glyph, and `spans` the styled
    /// intervals intersecting the line sorted by start (the result of a
    /// token-store or decoration query).
    pub fn split(
        &mut self,
        glyphs: &[Glyph],
        line_rune_off: usize,
        spans: &[StyleSpan],
    ) -> &[RenderRun] {
        self.runs.clear();
        if glyphs.is_empty() {
            return &self.runs;
        }
        if spans.is_empty() {
            self.runs.push(RenderRun {
                start: 0,
                end: glyphs.len(),
                offset: 0.0,
                width: glyphs.iter().map(|g| g.advance).sum(),
                span: None,
            });
            return &self.runs;
        }

        self.current = RenderRun::default();
        self.rune_off = line_rune_off;
        self.advance = 0.0;
        self.cursor = 0;

        for (idx, span) in spans.iter().enumerate() {
            // Glyphs before the span form an unstyled gap run.
            self.read_until(glyphs, span.start);
            self.commit(None);

            self.read_until(glyphs, span.end);
            self.commit(Some(idx));
        }

        // Trailing glyphs after the last span.
        self.read_until(glyphs, usize::MAX);
        self.commit(None);

        &self.runs
    }

    fn read_until(&mut self, glyphs: &[Glyph], rune_off: usize) {
        while self.rune_off < rune_off && self.cursor < glyphs.len() {
            let glyph = glyphs[self.cursor];
            self.cursor += 1;
            self.advance += glyph.advance;
            self.current.end += 1;
            self.rune_off += glyph.runes;
        }
    }

    fn commit(&mut self, span: Option<usize>) {
        if self.current.is_empty() {
            return;
        }
        self.current.span = span;
        self.current.width = self.advance - self.current.offset;
        self.runs.push(self.current);
        self.current = RenderRun {
            start: self.current.end,
            end: self.current.end,
            offset: self.advance,
            width: 0.0,
            span: None,
        };
    }
}
