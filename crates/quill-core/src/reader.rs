//! Read-side facade of the piece table.
//!
//! Byte and rune random access, a sequential read cursor for streaming
//! consumers (the shaper and the grapheme segmenter pull text through it),
//! and per-paragraph reads. Reads past the end of the document are short
//! reads with an end-of-data flag; nothing here panics on out-of-range
//! coordinates.

use crate::table::PieceTable;
use std::io::SeekFrom;

impl PieceTable {
    /// Copy bytes starting at `byte_off` into `buf`, returning the number of
    /// bytes read and whether the end of the document was reached.
    pub fn read_at(&self, buf: &mut [u8], mut offset: usize) -> (usize, bool) {
        if buf.is_empty() {
            return (0, false);
        }
        if offset >= self.size() {
            return (0, true);
        }

        let mut total = 0;
        let mut bytes = 0;
        let chain = self.chain();
        let mut n = chain.first();
        while n != chain.tail() {
            let p = chain.piece(n);
            bytes += p.byte_len;
            if bytes > offset {
                let fragment = self
                    .buf(p.source)
                    .slice(p.byte_off + p.byte_len - (bytes - offset), bytes - offset);
                let take = fragment.len().min(buf.len() - total);
                buf[total..total + take].copy_from_slice(&fragment[..take]);
                total += take;
                offset += take;
                if total >= buf.len() {
                    break;
                }
            }
            n = chain.piece(n).next;
        }

        (total, total < buf.len())
    }

    /// Position the sequential read cursor.
    pub fn seek(&mut self, pos: SeekFrom) -> usize {
        self.seek_cursor = match pos {
            SeekFrom::Start(offset) => offset as usize,
            SeekFrom::Current(delta) => (self.seek_cursor as i64 + delta).max(0) as usize,
            SeekFrom::End(delta) => (self.size() as i64 + delta).max(0) as usize,
        };
        self.seek_cursor
    }

    /// Read from the sequential cursor, advancing it.
    pub fn read(&mut self, buf: &mut [u8]) -> (usize, bool) {
        let (n, eof) = self.read_at(buf, self.seek_cursor);
        self.seek_cursor += n;
        (n, eof)
    }

    /// Materialize the whole document.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.size());
        let chain = self.chain();
        let mut n = chain.first();
        while n != chain.tail() {
            let p = chain.piece(n);
            let slice = self.buf(p.source).slice(p.byte_off, p.byte_len);
            out.push_str(std::str::from_utf8(slice).expect("piece not UTF-8 aligned"));
            n = chain.piece(n).next;
        }
        out
    }

    /// Byte offset of the rune at `rune_idx`, clamped to the document size.
    pub fn rune_to_byte(&self, rune_idx: usize) -> usize {
        if rune_idx >= self.len() {
            return self.size();
        }

        let mut bytes = 0;
        let mut runes = 0;
        let chain = self.chain();
        let mut n = chain.first();
        while n != chain.tail() {
            let p = chain.piece(n);
            if runes + p.rune_len > rune_idx {
                return bytes + self.buf(p.source).bytes_for_rune_range(p.rune_off, rune_idx - runes);
            }
            bytes += p.byte_len;
            runes += p.rune_len;
            n = chain.piece(n).next;
        }
        bytes
    }

    /// Text of the rune range `[start_rune, end_rune)`.
    pub fn text_range(&self, start_rune: usize, end_rune: usize) -> String {
        let (start_rune, end_rune) = if start_rune <= end_rune {
            (start_rune, end_rune)
        } else {
            (end_rune, start_rune)
        };
        let byte_start = self.rune_to_byte(start_rune);
        let byte_end = self.rune_to_byte(end_rune);
        let mut bytes = vec![0u8; byte_end.saturating_sub(byte_start)];
        let (n, _) = self.read_at(&mut bytes, byte_start);
        bytes.truncate(n);
        String::from_utf8(bytes).expect("range not UTF-8 aligned")
    }

    /// Decode the rune starting at `byte_off`, if any.
    pub fn read_rune_at_bytes(&self, byte_off: usize) -> Option<char> {
        let mut buf = [0u8; 4];
        let (n, _) = self.read_at(&mut buf, byte_off);
        decode_first_rune(&buf[..n])
    }

    /// Decode the rune ending just before `byte_off`, if any.
    pub fn read_rune_before_bytes(&self, byte_off: usize) -> Option<char> {
        let mut buf = [0u8; 4];
        let start = byte_off.saturating_sub(4);
        let want = byte_off - start;
        let (n, _) = self.read_at(&mut buf[..want], start);
        decode_last_rune(&buf[..n])
    }

    /// Decode the rune at rune offset `rune_off`, if any.
    pub fn read_rune_at(&self, rune_off: usize) -> Option<char> {
        if rune_off >= self.len() {
            return None;
        }
        self.read_rune_at_bytes(self.rune_to_byte(rune_off))
    }

    /// Read paragraph `index`, returning its text (trailing line break
    /// included) and whether it is the final paragraph.
    pub fn read_line(&self, index: usize) -> Option<(String, bool)> {
        let count = self.line_index().paragraph_count();
        if index >= count {
            return None;
        }
        let is_final = index + 1 == count;
        let entries = self.line_index().entries();
        if index >= entries.len() {
            // The implicit empty paragraph after a trailing line break.
            return Some((String::new(), is_final));
        }

        let start = self.line_index().paragraph_start(index);
        let rune_len = entries[index].rune_len;
        let byte_start = self.rune_to_byte(start);
        let byte_end = self.rune_to_byte(start + rune_len);
        let mut bytes = vec![0u8; byte_end - byte_start];
        let (n, _) = self.read_at(&mut bytes, byte_start);
        bytes.truncate(n);
        let text = String::from_utf8(bytes).expect("paragraph not UTF-8 aligned");
        Some((text, is_final))
    }
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

fn decode_first_rune(bytes: &[u8]) -> Option<char> {
    if bytes.is_empty() {
        return None;
    }
    let len = utf8_len(bytes[0]).min(bytes.len());
    std::str::from_utf8(&bytes[..len]).ok()?.chars().next()
}

fn decode_last_rune(bytes: &[u8]) -> Option<char> {
    for start in (0..bytes.len()).rev() {
        if bytes[start] & 0b1100_0000 != 0b1000_0000 {
            return std::str::from_utf8(&bytes[start..]).ok()?.chars().next();
        }
    }
    None
}
