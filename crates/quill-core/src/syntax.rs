//! Syntax token storage and the packed style word.
//!
//! Tokens arrive from an external tokenizer as rune ranges with a 32-bit
//! packed style (like Monaco's token metadata): language, token type,
//! foreground/background color ids and text-style flags all fit one word,
//! keeping the token array cache-friendly. Colors and token types are
//! interned into a scheme that hands out the ids.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A non-premultiplied RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Fully transparent black; the scheme's "unset" color.
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// A color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Text style flag bits carried in the low bits of a [`TokenStyle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStyle(pub u8);

impl TextStyle {
    /// Bold text.
    pub const BOLD: TextStyle = TextStyle(1 << 0);
    /// Italic text.
    pub const ITALIC: TextStyle = TextStyle(1 << 1);
    /// Underlined text.
    pub const UNDERLINE: TextStyle = TextStyle(1 << 2);
    /// Struck-through text.
    pub const STRIKETHROUGH: TextStyle = TextStyle(1 << 3);
    /// Bordered text.
    pub const BORDER: TextStyle = TextStyle(1 << 4);

    /// Returns `true` when every bit of `mask` is set.
    pub fn has_style(self, mask: TextStyle) -> bool {
        self.0 & mask.0 == mask.0 && mask.0 != 0
    }
}

impl std::ops::BitOr for TextStyle {
    type Output = TextStyle;

    fn bitor(self, rhs: TextStyle) -> TextStyle {
        TextStyle(self.0 | rhs.0)
    }
}

const TEXT_STYLE_OFFSET: u32 = 0;
const BACKGROUND_OFFSET: u32 = 5;
const FOREGROUND_OFFSET: u32 = 13;
const TOKEN_TYPE_OFFSET: u32 = 21;
const LANGUAGE_ID_OFFSET: u32 = 28;

const LANGUAGE_ID_MASK: u32 = 0b1111_0000_0000_0000_0000_0000_0000_0000;
const TOKEN_TYPE_MASK: u32 = 0b0000_1111_1110_0000_0000_0000_0000_0000;
const FOREGROUND_MASK: u32 = 0b0000_0000_0001_1111_1110_0000_0000_0000;
const BACKGROUND_MASK: u32 = 0b0000_0000_0000_0000_0001_1111_1110_0000;
const TEXT_STYLE_MASK: u32 = 0b0000_0000_0000_0000_0000_0000_0001_1111;

/// Bit-packed token metadata.
///
/// Layout, from the high bits down:
///
/// ```text
/// [language:4][token_type:7][fg_id:8][bg_id:8][text_style:5] = 32
/// ```
///
/// Color ids index the owning scheme's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenStyle(pub u32);

impl TokenStyle {
    /// Pack the fields into a style word.
    pub fn pack(
        language_id: u32,
        token_type: u32,
        fg: u32,
        bg: u32,
        text_style: TextStyle,
    ) -> Self {
        let mut word = 0u32;
        word |= (language_id << LANGUAGE_ID_OFFSET) & LANGUAGE_ID_MASK;
        word |= (token_type << TOKEN_TYPE_OFFSET) & TOKEN_TYPE_MASK;
        word |= (fg << FOREGROUND_OFFSET) & FOREGROUND_MASK;
        word |= (bg << BACKGROUND_OFFSET) & BACKGROUND_MASK;
        word |= (u32::from(text_style.0) << TEXT_STYLE_OFFSET) & TEXT_STYLE_MASK;
        TokenStyle(word)
    }

    /// Language id (0–15).
    pub fn language_id(self) -> u32 {
        (self.0 & LANGUAGE_ID_MASK) >> LANGUAGE_ID_OFFSET
    }

    /// Token type id (0–127).
    pub fn token_type(self) -> u32 {
        (self.0 & TOKEN_TYPE_MASK) >> TOKEN_TYPE_OFFSET
    }

    /// Foreground color id (0–255).
    pub fn foreground(self) -> u32 {
        (self.0 & FOREGROUND_MASK) >> FOREGROUND_OFFSET
    }

    /// Background color id (0–255).
    pub fn background(self) -> u32 {
        (self.0 & BACKGROUND_MASK) >> BACKGROUND_OFFSET
    }

    /// Text style flags.
    pub fn font_style(self) -> TextStyle {
        TextStyle(((self.0 & TEXT_STYLE_MASK) >> TEXT_STYLE_OFFSET) as u8)
    }
}

impl std::fmt::Display for TokenStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Lang={} Type={} FG={} BG={} Style={:05b}",
            self.language_id(),
            self.token_type(),
            self.foreground(),
            self.background(),
            self.font_style().0
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct RawTokenStyle {
    text_style: TextStyle,
    fg: u32,
    bg: u32,
}

/// Token types and their styles for one color scheme.
///
/// Token type names can be mapped to Tree-sitter captures or any other
/// tokenizer's categories; the scheme interns names and colors and hands
/// back packed [`TokenStyle`] words.
#[derive(Debug, Default)]
pub struct ColorScheme {
    /// Scheme name, for host-side bookkeeping.
    pub name: String,
    colors: Vec<Color>,
    token_types: Vec<String>,
    styles: HashMap<usize, RawTokenStyle>,
}

impl ColorScheme {
    /// Create an empty scheme.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn add_color(&mut self, color: Color) -> u32 {
        if let Some(idx) = self.colors.iter().position(|c| *c == color) {
            return idx as u32;
        }
        self.colors.push(color);
        (self.colors.len() - 1) as u32
    }

    fn add_token_type(&mut self, token_type: &str) -> usize {
        if let Some(idx) = self.token_types.iter().position(|t| t == token_type) {
            return idx;
        }
        self.token_types.push(token_type.to_string());
        self.token_types.len() - 1
    }

    /// Register a token type with its style, interning the colors.
    pub fn register(&mut self, token_type: &str, text_style: TextStyle, fg: Color, bg: Color) {
        let type_id = self.add_token_type(token_type);
        let fg_id = self.add_color(fg);
        let bg_id = self.add_color(bg);
        self.styles.insert(
            type_id,
            RawTokenStyle {
                text_style,
                fg: fg_id,
                bg: bg_id,
            },
        );
    }

    /// Color for a palette id; out-of-range ids are transparent.
    pub fn color(&self, id: u32) -> Color {
        self.colors
            .get(id as usize)
            .copied()
            .unwrap_or(Color::TRANSPARENT)
    }

    /// Packed style for a registered token type name; unknown names pack to
    /// the zero style.
    pub fn token_style(&self, token_type: &str) -> TokenStyle {
        let Some(type_id) = self.token_types.iter().position(|t| t == token_type) else {
            return TokenStyle(0);
        };
        self.token_style_by_id(type_id)
    }

    /// Packed style for an interned token type id.
    pub fn token_style_by_id(&self, type_id: usize) -> TokenStyle {
        let Some(raw) = self.styles.get(&type_id) else {
            return TokenStyle(0);
        };
        TokenStyle::pack(0, type_id as u32, raw.fg, raw.bg, raw.text_style)
    }
}

/// One syntax token: a rune range with a packed style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Start rune offset in the document.
    pub start: usize,
    /// End rune offset, exclusive.
    pub end: usize,
    /// Packed style word.
    pub style: TokenStyle,
}

/// Flat token storage sorted by start offset.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: Vec<Token>,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tokens wholesale; the store keeps them sorted by start.
    pub fn set(&mut self, mut tokens: Vec<Token>) {
        tokens.sort_by_key(|t| (t.start, t.end));
        self.tokens = tokens;
    }

    /// Drop all tokens, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// All stored tokens.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Tokens overlapping `[start, end)` in document order.
    ///
    /// Assumes tokenizer output: non-overlapping tokens ascending in both
    /// start and end.
    pub fn query_range(&self, start: usize, end: usize) -> &[Token] {
        if self.tokens.is_empty() || start >= end {
            return &[];
        }

        // Tokens ending at or before `start` cannot overlap.
        let first = self.tokens.partition_point(|t| t.end <= start);
        if first == self.tokens.len() {
            return &[];
        }
        let mut last = first;
        while last < self.tokens.len() && self.tokens[last].start < end {
            last += 1;
        }
        &self.tokens[first..last]
    }
}
