//! The shaped-glyph interface between the text view and a glyph shaper.
//!
//! The core never shapes text itself: it hands a [`ShaperParams`] record and
//! the document text to a [`GlyphShaper`] and pulls glyphs back one at a
//! time. Each glyph carries pixel metrics plus a flag word describing the
//! breaks it terminates. [`FakeShaper`] synthesizes one cluster-break glyph
//! per rune with monospace cell metrics so cursor arithmetic keeps working
//! when no real shaper is installed.

use unicode_width::UnicodeWidthChar;

/// Bit set describing the breaks a glyph terminates and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphFlags(pub u16);

impl GlyphFlags {
    /// The glyph ends a grapheme cluster.
    pub const CLUSTER_BREAK: GlyphFlags = GlyphFlags(1 << 0);
    /// The glyph ends a shaping run (font, script or direction change).
    pub const RUN_BREAK: GlyphFlags = GlyphFlags(1 << 1);
    /// The glyph ends a screen line.
    pub const LINE_BREAK: GlyphFlags = GlyphFlags(1 << 2);
    /// The glyph starts a paragraph.
    pub const PARAGRAPH_START: GlyphFlags = GlyphFlags(1 << 3);
    /// The glyph is a hard paragraph break.
    pub const PARAGRAPH_BREAK: GlyphFlags = GlyphFlags(1 << 4);
    /// The glyph belongs to a right-to-left run; its advance steps toward
    /// the paragraph origin.
    pub const TOWARD_ORIGIN: GlyphFlags = GlyphFlags(1 << 5);
    /// The glyph replaces truncated text.
    pub const TRUNCATOR: GlyphFlags = GlyphFlags(1 << 6);

    /// Returns `true` when every bit of `mask` is set.
    pub fn contains(self, mask: GlyphFlags) -> bool {
        self.0 & mask.0 == mask.0
    }
}

impl std::ops::BitOr for GlyphFlags {
    type Output = GlyphFlags;

    fn bitor(self, rhs: GlyphFlags) -> GlyphFlags {
        GlyphFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for GlyphFlags {
    fn bitor_assign(&mut self, rhs: GlyphFlags) {
        self.0 |= rhs.0;
    }
}

/// A single shaped glyph positioned in document pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Glyph {
    /// Left edge of the glyph (for right-to-left glyphs, the edge the
    /// advance steps back from).
    pub x: f32,
    /// Baseline of the glyph's screen line.
    pub y: f32,
    /// Horizontal advance.
    pub advance: f32,
    /// Ascent above the baseline.
    pub ascent: f32,
    /// Descent below the baseline.
    pub descent: f32,
    /// Number of runes this glyph covers (zero for synthetic glyphs).
    pub runes: usize,
    /// Break/direction flags.
    pub flags: GlyphFlags,
}

/// Opaque font identity handed through to the shaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontId(pub u32);

/// Horizontal alignment of shaped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Align to the leading edge.
    #[default]
    Start,
    /// Center each line.
    Middle,
    /// Align to the trailing edge.
    End,
}

/// Line wrapping policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapPolicy {
    /// Never soft-wrap; long lines extend horizontally.
    Off,
    /// Wrap at word boundaries when possible.
    #[default]
    Words,
    /// Wrap between any two grapheme clusters.
    Graphemes,
}

/// Layout parameters passed to the shaper for each shaping pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaperParams {
    /// Font to shape with.
    pub font: FontId,
    /// Em size in pixels.
    pub em_size: f32,
    /// Maximum line width in pixels before wrapping applies.
    pub max_width: f32,
    /// Minimum line width in pixels.
    pub min_width: f32,
    /// Horizontal alignment.
    pub alignment: Alignment,
    /// Wrapping policy.
    pub wrap: WrapPolicy,
    /// Multiplier applied to the shaper's natural line height.
    pub line_height_scale: f32,
}

impl Default for ShaperParams {
    fn default() -> Self {
        Self {
            font: FontId::default(),
            em_size: 16.0,
            max_width: f32::MAX,
            min_width: 0.0,
            alignment: Alignment::Start,
            wrap: WrapPolicy::default(),
            line_height_scale: 1.0,
        }
    }
}

/// A glyph shaper the text view can pull shaped glyphs from.
pub trait GlyphShaper {
    /// Shape `text` with `params`, preparing the glyph stream.
    fn layout(&mut self, params: &ShaperParams, text: &str);

    /// Pull the next glyph, or `None` at the end of the stream.
    fn next_glyph(&mut self) -> Option<Glyph>;
}

/// Shaper substitute producing one cluster-break glyph per rune.
///
/// Metrics are monospace cells derived from the em size, with UAX #11 wide
/// characters taking two cells. The stream carries the same break flags a
/// real shaper would, including the trailing zero-rune line-break glyph that
/// lets the caret sit on an empty final line.
#[derive(Debug, Default)]
pub struct FakeShaper {
    glyphs: Vec<Glyph>,
    cursor: usize,
}

impl FakeShaper {
    /// Create an idle fake shaper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell width for one rune at this em size.
    pub fn cell_width(params: &ShaperParams, ch: char) -> f32 {
        let cells = UnicodeWidthChar::width(ch).unwrap_or(1).max(1) as f32;
        params.em_size * 0.5 * cells
    }

    /// Line height derived from the fake metrics.
    pub fn line_height(params: &ShaperParams) -> f32 {
        let scale = if params.line_height_scale > 0.0 {
            params.line_height_scale
        } else {
            1.0
        };
        (params.em_size * 0.8 + params.em_size * 0.25) * scale
    }
}

impl GlyphShaper for FakeShaper {
    fn layout(&mut self, params: &ShaperParams, text: &str) {
        self.glyphs.clear();
        self.cursor = 0;

        let ascent = params.em_size * 0.8;
        let descent = params.em_size * 0.25;
        let line_height = Self::line_height(params);
        let wrap = params.wrap != WrapPolicy::Off && params.max_width < f32::MAX;

        let mut x = 0.0f32;
        let mut baseline = ascent;
        let mut paragraph_start = false;

        for ch in text.chars() {
            if ch == '\n' {
                self.glyphs.push(Glyph {
                    x,
                    y: baseline,
                    advance: 0.0,
                    ascent,
                    descent,
                    runes: 1,
                    flags: GlyphFlags::CLUSTER_BREAK
                        | GlyphFlags::LINE_BREAK
                        | GlyphFlags::PARAGRAPH_BREAK,
                });
                x = 0.0;
                baseline += line_height;
                paragraph_start = true;
                continue;
            }

            let advance = Self::cell_width(params, ch);
            if wrap && x > 0.0 && x + advance > params.max_width {
                if let Some(last) = self.glyphs.last_mut() {
                    last.flags |= GlyphFlags::LINE_BREAK;
                }
                x = 0.0;
                baseline += line_height;
            }

            let mut flags = GlyphFlags::CLUSTER_BREAK;
            if paragraph_start {
                flags |= GlyphFlags::PARAGRAPH_START;
                paragraph_start = false;
            }
            self.glyphs.push(Glyph {
                x,
                y: baseline,
                advance,
                ascent,
                descent,
                runes: 1,
                flags,
            });
            x += advance;
        }

        if text.is_empty() || text.ends_with('\n') {
            // Synthetic glyph carrying the empty final line.
            let mut flags = GlyphFlags::CLUSTER_BREAK | GlyphFlags::LINE_BREAK;
            if paragraph_start {
                flags |= GlyphFlags::PARAGRAPH_START;
            }
            self.glyphs.push(Glyph {
                x: 0.0,
                y: baseline,
                advance: 0.0,
                ascent,
                descent,
                runes: 0,
                flags,
            });
        } else if let Some(last) = self.glyphs.last_mut() {
            last.flags |= GlyphFlags::LINE_BREAK;
        }
    }

    fn next_glyph(&mut self) -> Option<Glyph> {
        let glyph = self.glyphs.get(self.cursor).copied();
        self.cursor += 1;
        glyph
    }
}
