//! The piece table: the document's edit API.
//!
//! All mutation funnels through [`PieceTable::replace`]. An edit splits the
//! affected pieces, splices a freshly built sub-chain into the piece list and
//! pushes the displaced sub-chain onto the undo stack; undo and redo move
//! those saved ranges back with a single splice. Marker repair and the
//! line-index delta happen before any edit method returns, so every
//! subsequent query observes a consistent view.

use crate::buffer::AppendBuffer;
use crate::line_index::LineIndex;
use crate::marker::{Marker, MarkerBias, MarkerId};
use crate::piece::{BufferKind, CaretPos, PieceChain, PieceId, PieceNode, PieceRange, NO_PIECE};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastAction {
    None,
    Insert,
}

/// Piece-table backed text document with undo/redo, grouped edits, markers
/// and an incrementally maintained paragraph index.
pub struct PieceTable {
    original: AppendBuffer,
    modify: AppendBuffer,
    chain: PieceChain,

    /// Document length in runes.
    seq_runes: usize,
    /// Document size in bytes.
    seq_bytes: usize,

    undo: Vec<PieceRange>,
    redo: Vec<PieceRange>,

    line_index: LineIndex,

    markers: BTreeMap<MarkerId, Marker>,
    next_marker_id: u64,

    /// Open `group_op` nesting depth and the batch id shared by the group.
    group_depth: usize,
    current_batch: Option<u64>,
    next_batch_id: u64,

    /// State driving the keyed-typing append fast path.
    last_action: LastAction,
    last_action_end: usize,
    last_insert_piece: Option<PieceId>,

    /// Dirty bit returned (and cleared) by [`PieceTable::changed`].
    changed: bool,

    /// Sequential read cursor in bytes.
    pub(crate) seek_cursor: usize,
}

impl PieceTable {
    /// Create a table over `text`.
    pub fn new(text: &str) -> Self {
        let mut table = Self {
            original: AppendBuffer::new(),
            modify: AppendBuffer::new(),
            chain: PieceChain::new(),
            seq_runes: 0,
            seq_bytes: 0,
            undo: Vec::new(),
            redo: Vec::new(),
            line_index: LineIndex::new(),
            markers: BTreeMap::new(),
            next_marker_id: 0,
            group_depth: 0,
            current_batch: None,
            next_batch_id: 0,
            last_action: LastAction::None,
            last_action_end: 0,
            last_insert_piece: None,
            changed: false,
            seek_cursor: 0,
        };
        table.init(text);
        table
    }

    /// Create an empty table.
    pub fn empty() -> Self {
        Self::new("")
    }

    fn init(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let (_, _, rune_count) = self.original.append(text);
        let piece = self.chain.alloc(PieceNode {
            source: BufferKind::Original,
            rune_off: 0,
            rune_len: rune_count,
            byte_off: 0,
            byte_len: text.len(),
            prev: NO_PIECE,
            next: NO_PIECE,
        });
        let tail = self.chain.tail();
        self.chain.insert_before(tail, piece);
        self.seq_runes = rune_count;
        self.seq_bytes = text.len();
        self.line_index = LineIndex::from_text(text);
    }

    pub(crate) fn buf(&self, source: BufferKind) -> &AppendBuffer {
        match source {
            BufferKind::Original => &self.original,
            BufferKind::Modify => &self.modify,
        }
    }

    pub(crate) fn chain(&self) -> &PieceChain {
        &self.chain
    }

    pub(crate) fn chain_mut(&mut self) -> &mut PieceChain {
        &mut self.chain
    }

    pub(crate) fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Document length in runes.
    pub fn len(&self) -> usize {
        self.seq_runes
    }

    /// Returns `true` for an empty document.
    pub fn is_empty(&self) -> bool {
        self.seq_runes == 0
    }

    /// Document size in bytes.
    pub fn size(&self) -> usize {
        self.seq_bytes
    }

    /// Number of paragraphs.
    pub fn lines(&self) -> usize {
        self.line_index.paragraph_count()
    }

    /// Number of content pieces in the chain.
    pub fn piece_count(&self) -> usize {
        self.chain.len()
    }

    /// Monotonic revision counter; bumped by every structural mutation.
    pub fn revision(&self) -> u64 {
        self.chain.revision()
    }

    /// Undo stack depth.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Redo stack depth.
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Report and clear the "modified since last call" bit.
    pub fn changed(&mut self) -> bool {
        let changed = self.changed;
        self.changed = false;
        changed
    }

    /// Replace `[start, end)` (rune offsets, order-normalized, clamped to the
    /// document) with `text`. Returns `false` when the edit is a no-op.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> bool {
        let (mut start, mut end) = if start <= end { (start, end) } else { (end, start) };
        start = start.min(self.seq_runes);
        end = end.min(self.seq_runes);
        if start == end && text.is_empty() {
            return false;
        }

        if self.group_depth == 0 {
            self.clear_redo();
        }

        if self.try_append_to_last_piece(start, end, text) {
            return true;
        }

        let inserted_runes = text.chars().count();
        let replaced = end - start;
        let caret = CaretPos { start, end };

        let (start_piece, in_off, _) = self.chain.find_by_rune(start);

        let mut old = PieceRange::new();
        old.caret = caret;
        old.batch_id = self.current_batch;
        old.op_start = start;
        old.op_replaced = replaced;
        old.op_inserted = inserted_runes;
        old.line_ops =
            u32::from(replaced > 0) + u32::from(!text.is_empty());

        let mut new_range = PieceRange::new();

        // Left remainder of the start piece.
        if in_off > 0 {
            let sp = self.chain.piece(start_piece).clone();
            let left_bytes = self.buf(sp.source).bytes_for_rune_range(sp.rune_off, in_off);
            let left = self.chain.alloc(PieceNode {
                source: sp.source,
                rune_off: sp.rune_off,
                rune_len: in_off,
                byte_off: sp.byte_off,
                byte_len: left_bytes,
                prev: NO_PIECE,
                next: NO_PIECE,
            });
            new_range.append(&mut self.chain, left);
        }

        // The inserted text, referencing the bytes just appended to the
        // modify buffer.
        if !text.is_empty() {
            let (rune_off, byte_off, rune_count) = self.modify.append(text);
            let inserted = self.chain.alloc(PieceNode {
                source: BufferKind::Modify,
                rune_off,
                rune_len: rune_count,
                byte_off,
                byte_len: text.len(),
                prev: NO_PIECE,
                next: NO_PIECE,
            });
            new_range.append(&mut self.chain, inserted);
            self.last_insert_piece = Some(inserted);
        }

        let pure_boundary_insert = replaced == 0 && in_off == 0;
        let mut bytes_erased = 0;

        if pure_boundary_insert {
            old.as_boundary(&self.chain, start_piece);
        } else {
            // Capture every affected piece and build the right remainder of
            // the final one. Byte accounting recomputes each erased span from
            // the source buffer, so partial pieces cannot under-count.
            old.append(&mut self.chain, start_piece);
            let mut offset = start - in_off;
            let mut n = start_piece;
            loop {
                let (n_rune_off, n_rune_len, n_source) = {
                    let p = self.chain.piece(n);
                    (p.rune_off, p.rune_len, p.source)
                };
                let piece_end = offset + n_rune_len;
                let erase_from = start.max(offset);
                let erase_to = end.min(piece_end);
                if erase_to > erase_from {
                    bytes_erased += self.buf(n_source).bytes_for_rune_range(
                        n_rune_off + (erase_from - offset),
                        erase_to - erase_from,
                    );
                }
                if piece_end >= end {
                    let end_in_off = end - offset;
                    if end_in_off < n_rune_len {
                        let r_rune_off = n_rune_off + end_in_off;
                        let r_rune_len = n_rune_len - end_in_off;
                        let r_byte_off = self.buf(n_source).byte_offset_for_rune(r_rune_off);
                        let r_byte_len = self
                            .buf(n_source)
                            .bytes_for_rune_range(r_rune_off, r_rune_len);
                        let right = self.chain.alloc(PieceNode {
                            source: n_source,
                            rune_off: r_rune_off,
                            rune_len: r_rune_len,
                            byte_off: r_byte_off,
                            byte_len: r_byte_len,
                            prev: NO_PIECE,
                            next: NO_PIECE,
                        });
                        new_range.append(&mut self.chain, right);
                    }
                    break;
                }
                offset = piece_end;
                n = self.chain.piece(n).next;
                if n == self.chain.tail() {
                    break;
                }
                old.append(&mut self.chain, n);
            }
        }

        if new_range.first == NO_PIECE {
            // Pure delete that consumed whole pieces: swap in an empty slot.
            new_range.boundary = true;
        }

        old.swap(&mut self.chain, &new_range);
        self.undo.push(old);
        self.chain.invalidate_cache();

        self.seq_runes = self.seq_runes + inserted_runes - replaced;
        self.seq_bytes = self.seq_bytes + text.len() - bytes_erased;

        if replaced > 0 {
            self.line_index.update_on_delete(start, replaced);
        }
        if !text.is_empty() {
            self.line_index.update_on_insert(start, text);
        }
        self.repair_markers(start, replaced, inserted_runes);

        if replaced == 0 && !text.is_empty() {
            self.last_action = LastAction::Insert;
            self.last_action_end = start + inserted_runes;
        } else {
            self.last_action = LastAction::None;
            self.last_insert_piece = None;
        }
        self.changed = true;
        log::debug!(
            "replace {}..{} (+{} runes) rev {}",
            start,
            end,
            inserted_runes,
            self.chain.revision()
        );
        true
    }

    /// Erase `[start, end)`.
    pub fn erase(&mut self, start: usize, end: usize) -> bool {
        self.replace(start, end, "")
    }

    /// Keyed-typing coalescing: a single-rune insertion continuing the
    /// previous insert extends the last piece in place and lengthens the
    /// most recent undo entry instead of pushing a new one.
    fn try_append_to_last_piece(&mut self, start: usize, end: usize, text: &str) -> bool {
        if start != end
            || self.last_action != LastAction::Insert
            || start != self.last_action_end
            || text.chars().count() != 1
        {
            return false;
        }
        let Some(piece) = self.last_insert_piece else {
            return false;
        };
        {
            let p = self.chain.piece(piece);
            // The piece must still be the append target: a modify-buffer view
            // ending exactly at the buffer's current end.
            if p.source != BufferKind::Modify
                || p.byte_off + p.byte_len != self.modify.len_bytes()
            {
                return false;
            }
        }
        let Some(top) = self.undo.last_mut() else {
            return false;
        };
        if top.batch_id != self.current_batch {
            return false;
        }
        top.op_inserted += 1;
        top.line_ops += 1;

        self.modify.append(text);
        {
            let p = self.chain.piece_mut(piece);
            p.rune_len += 1;
            p.byte_len += text.len();
        }
        self.chain.invalidate_cache();

        self.seq_runes += 1;
        self.seq_bytes += text.len();
        self.line_index.update_on_insert(start, text);
        self.repair_markers(start, 0, 1);
        self.last_action_end = start + 1;
        self.changed = true;
        true
    }

    /// Reset the buffers and the chain, replacing the whole document.
    ///
    /// Both undo stacks and the line index are cleared and every registered
    /// marker becomes stale.
    pub fn set_text(&mut self, text: &str) {
        self.original = AppendBuffer::new();
        self.modify = AppendBuffer::new();
        self.chain.reset();
        self.undo.clear();
        self.redo.clear();
        self.line_index = LineIndex::new();
        self.seq_runes = 0;
        self.seq_bytes = 0;
        self.last_action = LastAction::None;
        self.last_insert_piece = None;
        self.seek_cursor = 0;
        for marker in self.markers.values_mut() {
            marker.stale = true;
        }
        self.init(text);
        self.changed = true;
    }

    /// Undo the most recent edit (or the whole batch it belongs to),
    /// returning the caret position saved with each reverted entry.
    pub fn undo(&mut self) -> Vec<CaretPos> {
        let mut carets = Vec::new();
        let Some(mut range) = self.undo.pop() else {
            return carets;
        };
        let batch = range.batch_id;
        loop {
            self.restore_range(&mut range, true);
            carets.push(range.caret);
            self.redo.push(range);

            let continue_batch = match (batch, self.undo.last()) {
                (Some(b), Some(next)) => next.batch_id == Some(b),
                _ => false,
            };
            if !continue_batch {
                break;
            }
            range = self.undo.pop().expect("undo entry vanished");
        }
        carets
    }

    /// Re-apply the most recently undone edit (or its whole batch).
    pub fn redo(&mut self) -> Vec<CaretPos> {
        let mut carets = Vec::new();
        let Some(mut range) = self.redo.pop() else {
            return carets;
        };
        let batch = range.batch_id;
        loop {
            self.restore_range(&mut range, false);
            carets.push(range.caret);
            self.undo.push(range);

            let continue_batch = match (batch, self.redo.last()) {
                (Some(b), Some(next)) => next.batch_id == Some(b),
                _ => false,
            };
            if !continue_batch {
                break;
            }
            range = self.redo.pop().expect("redo entry vanished");
        }
        carets
    }

    fn restore_range(&mut self, range: &mut PieceRange, is_undo: bool) {
        let (in_runes, in_bytes) = range.size(&self.chain);
        range.restore(&mut self.chain);
        let (out_runes, out_bytes) = range.size(&self.chain);

        self.seq_runes = self.seq_runes + in_runes - out_runes;
        self.seq_bytes = self.seq_bytes + in_bytes - out_bytes;
        self.chain.invalidate_cache();

        for _ in 0..range.line_ops {
            if is_undo {
                self.line_index.undo();
            } else {
                self.line_index.redo();
            }
        }
        // Re-bias markers with the edit shape (inverted when undoing).
        if is_undo {
            self.repair_markers(range.op_start, range.op_inserted, range.op_replaced);
        } else {
            self.repair_markers(range.op_start, range.op_replaced, range.op_inserted);
        }

        self.last_action = LastAction::None;
        self.last_insert_piece = None;
        self.changed = true;
    }

    fn clear_redo(&mut self) {
        while let Some(range) = self.redo.pop() {
            // Pieces held by dropped redo entries are unreachable from the
            // chain and from every other saved range; reclaim them.
            for id in range.pieces(&self.chain) {
                self.chain.release(id);
            }
        }
        self.line_index.clear_redo();
    }

    /// Begin a group of edits undone and redone as one unit. Nested calls
    /// join the same group.
    pub fn group_op(&mut self) {
        if self.group_depth == 0 {
            self.clear_redo();
            self.current_batch = Some(self.next_batch_id);
            self.next_batch_id += 1;
            self.last_action = LastAction::None;
        }
        self.group_depth += 1;
    }

    /// Close one level of grouping; the group ends when the depth returns to
    /// zero.
    pub fn ungroup_op(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
        if self.group_depth == 0 {
            self.current_batch = None;
            self.last_action = LastAction::None;
        }
    }

    /// Register a marker at `rune_off` with the given bias.
    pub fn create_marker(&mut self, rune_off: usize, bias: MarkerBias) -> MarkerId {
        let doc_off = rune_off.min(self.seq_runes);
        let mut marker = Marker::new(doc_off, bias);
        let (piece, piece_off, _) = self.chain.find_by_rune(doc_off);
        marker.piece = piece;
        marker.piece_off = piece_off;

        let id = MarkerId(self.next_marker_id);
        self.next_marker_id += 1;
        self.markers.insert(id, marker);
        id
    }

    /// Current document offset of a marker; `None` once the marker is stale.
    pub fn marker_offset(&self, id: MarkerId) -> Option<usize> {
        let marker = self.markers.get(&id)?;
        if marker.stale {
            None
        } else {
            Some(marker.doc_off)
        }
    }

    /// Remove a marker from the registry.
    pub fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    /// Number of registered markers (stale ones included).
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn repair_markers(&mut self, start: usize, replaced: usize, inserted: usize) {
        for marker in self.markers.values_mut() {
            if marker.stale {
                continue;
            }
            marker.update(start, replaced, inserted);
        }
        // Re-resolve each marker to its containing piece so later offset
        // queries stay O(1).
        for marker in self.markers.values_mut() {
            if marker.stale {
                continue;
            }
            let (piece, piece_off, _) = self.chain.find_by_rune(marker.doc_off);
            marker.piece = piece;
            marker.piece_off = piece_off;
        }
    }
}

impl Default for PieceTable {
    fn default() -> Self {
        Self::empty()
    }
}
