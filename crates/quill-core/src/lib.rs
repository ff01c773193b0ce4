#![warn(missing_docs)]
//! Quill Core - Piece-Table Text Editing Kernel
//!
//! # Overview
//!
//! `quill-core` is the editable text storage core of an interactive code
//! editor: a piece-table buffer with structural-sharing undo/redo, grouped
//! (atomic) edits, position-stable markers and an incrementally maintained
//! paragraph index, plus a text view coordinating shaped-glyph layout,
//! grapheme-aligned caret movement, bracket matching and auto-indentation.
//! Rendering, fonts, the clipboard and the event loop are the host's job:
//! the core consumes a glyph stream and exposes a text source, a caret, and
//! style/decoration queries.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextView (caret, movement, indent, match)  │  ← Editing surface
//! ├─────────────────────────────────────────────┤
//! │  GlyphIndex (positions, lines, regions)     │  ← Layout queries
//! ├─────────────────────────────────────────────┤
//! │  Decorations & Syntax Tokens                │  ← Paint-time styles
//! ├─────────────────────────────────────────────┤
//! │  Reader facade (bytes, runes, paragraphs)   │  ← Read access
//! ├─────────────────────────────────────────────┤
//! │  PieceTable (edits, undo/redo, markers)     │  ← Text storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use quill_core::{SelectionMode, TextView};
//!
//! let mut view = TextView::new();
//! view.set_text("fn main() {}\n");
//!
//! // Edit through the view; the caret follows the edit.
//! view.set_caret(11, 11);
//! view.indent_on_break();
//! assert_eq!(view.text(), "fn main() {\n\t\n}\n");
//!
//! // One undo reverts the whole auto-indent edit.
//! view.source_mut().undo();
//! view.source_mut().undo();
//! assert_eq!(view.text(), "fn main() {}\n");
//!
//! view.move_text_end(SelectionMode::Clear);
//! assert_eq!(view.selection(), (13, 13));
//! ```
//!
//! # Markers and decorations
//!
//! ```rust
//! use quill_core::{Decoration, DecorationTree, MarkerBias, PieceTable};
//!
//! let mut table = PieceTable::new("hello world");
//! let marker = table.create_marker(6, MarkerBias::Forward);
//!
//! table.replace(0, 0, ">> ");
//! assert_eq!(table.marker_offset(marker), Some(9));
//!
//! let mut decorations = DecorationTree::new();
//! decorations
//!     .insert(Decoration::new("search", 9, 14), &mut table)
//!     .unwrap();
//! table.replace(0, 3, "");
//! decorations.refresh(&mut table);
//! assert_eq!(decorations.query_point(6).len(), 1);
//! ```
//!
//! # Module Description
//!
//! - [`table`] - piece-table storage, undo/redo, grouping, markers
//! - [`line_index`] - incremental paragraph index with its own undo
//! - [`reader`] - byte/rune/paragraph read access
//! - [`glyph`] - shaper interface and the fake glyph stream
//! - [`glyph_index`] - caret positions, screen lines, selection regions
//! - [`text_view`] - caret state, movement, editing surface
//! - [`bracket`] - nearest-bracket matching
//! - [`indent`] - auto-indent and multi-line indent/dedent
//! - [`decoration`] - marker-anchored ranged styles
//! - [`syntax`] - packed token styles and the token store
//! - [`runs`] - paint-time line-to-runs splitting
//!
//! # Unicode Support
//!
//! - UTF-8 internal encoding; all public offsets are rune (scalar value)
//!   counts unless a method name says bytes
//! - Caret movement and placement snap to grapheme cluster boundaries
//! - The fake glyph stream follows UAX #11 cell widths, so CJK text gets
//!   plausible geometry even without a shaper

pub mod bracket;
pub mod buffer;
pub mod completion;
pub mod decoration;
pub mod geom;
pub mod glyph;
pub mod glyph_index;
mod graphemes;
pub mod indent;
pub mod line_index;
pub mod marker;
pub mod options;
mod piece;
pub mod reader;
pub mod runs;
pub mod syntax;
pub mod table;
pub mod text_view;

pub use completion::{is_symbol_char, CompletionContext};
pub use decoration::{Decoration, DecorationError, DecorationTree};
pub use geom::{Point, Rect, Size};
pub use glyph::{
    Alignment, FakeShaper, FontId, Glyph, GlyphFlags, GlyphShaper, ShaperParams, WrapPolicy,
};
pub use glyph_index::{CaretPosition, GlyphIndex, ParagraphRange, Region, ScreenLine, ScreenPos};
pub use line_index::{LineEntry, LineIndex};
pub use marker::{MarkerBias, MarkerId};
pub use options::EditorOptions;
pub use piece::{BufferKind, CaretPos};
pub use runs::{LineSplitter, RenderRun, StyleSpan};
pub use syntax::{Color, ColorScheme, TextStyle, Token, TokenStore, TokenStyle};
pub use table::PieceTable;
pub use text_view::{SelectionMode, TextView};
