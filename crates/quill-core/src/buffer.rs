//! Append-only byte stores backing the piece table.
//!
//! The document is assembled from two buffers: the original buffer holds the
//! initial text and is frozen after construction, the modify buffer collects
//! every inserted byte. Neither buffer ever shrinks or mutates in place, so a
//! `(byte offset, byte length)` pair handed out by [`AppendBuffer::append`]
//! stays valid for the lifetime of the table.

/// An append-only byte sequence with rune/byte coordinate conversion.
///
/// A rune-start table is maintained alongside the bytes; because the buffer
/// only ever grows at the end, entries in that table are never invalidated
/// and offset conversions are O(1).
#[derive(Debug, Default)]
pub struct AppendBuffer {
    data: Vec<u8>,
    /// Byte start offset of every rune stored so far.
    rune_starts: Vec<usize>,
}

impl AppendBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text`, returning `(rune_offset, byte_offset, rune_count)` of
    /// the appended run within this buffer.
    pub fn append(&mut self, text: &str) -> (usize, usize, usize) {
        let rune_off = self.rune_starts.len();
        let byte_off = self.data.len();
        for (i, _) in text.char_indices() {
            self.rune_starts.push(byte_off + i);
        }
        self.data.extend_from_slice(text.as_bytes());
        (rune_off, byte_off, self.rune_starts.len() - rune_off)
    }

    /// Total bytes stored.
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Total runes stored.
    pub fn len_runes(&self) -> usize {
        self.rune_starts.len()
    }

    /// Borrow `byte_len` bytes starting at `byte_off`.
    pub fn slice(&self, byte_off: usize, byte_len: usize) -> &[u8] {
        &self.data[byte_off..byte_off + byte_len]
    }

    /// Byte offset of the rune at `rune_off`; one past the last byte when
    /// `rune_off` equals the rune count.
    pub fn byte_offset_for_rune(&self, rune_off: usize) -> usize {
        if rune_off >= self.rune_starts.len() {
            self.data.len()
        } else {
            self.rune_starts[rune_off]
        }
    }

    /// Number of bytes spanned by `rune_count` runes starting at `rune_off`.
    pub fn bytes_for_rune_range(&self, rune_off: usize, rune_count: usize) -> usize {
        self.byte_offset_for_rune(rune_off + rune_count) - self.byte_offset_for_rune(rune_off)
    }
}
