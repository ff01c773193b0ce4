//! The piece chain: a doubly-linked list of buffer views with sentinel ends.
//!
//! Pieces are stored in an arena owned by [`PieceChain`] and addressed by
//! [`PieceId`]; `prev`/`next` links are ids. Sub-chains detached by an edit
//! keep their outer links pointing at their former neighbours, which is what
//! lets a [`PieceRange`] on the undo stack splice itself back in with a
//! single pointer exchange (see `swap`/`restore`). The layout follows the
//! classic piece-chain design with head/tail sentinels that hold no text and
//! are never removed.

/// Identifies which byte buffer a piece points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// The read-only original buffer, set once from the initial text.
    Original,
    /// The append-only modify buffer receiving all edits.
    Modify,
}

/// Index of a piece node in the chain's arena.
pub(crate) type PieceId = usize;

/// Sentinel id meaning "no piece".
pub(crate) const NO_PIECE: PieceId = usize::MAX;

/// A contiguous view of one of the two byte buffers.
///
/// Invariant: `byte_len` is the UTF-8 byte count of exactly `rune_len` runes
/// starting at `rune_off` in the source buffer.
#[derive(Debug, Clone)]
pub(crate) struct PieceNode {
    pub source: BufferKind,
    /// Rune offset of the view in the source buffer.
    pub rune_off: usize,
    /// Rune length of the view.
    pub rune_len: usize,
    /// Byte offset of the view in the source buffer.
    pub byte_off: usize,
    /// Byte length of the view.
    pub byte_len: usize,
    pub prev: PieceId,
    pub next: PieceId,
}

impl PieceNode {
    fn sentinel() -> Self {
        Self {
            source: BufferKind::Original,
            rune_off: 0,
            rune_len: 0,
            byte_off: 0,
            byte_len: 0,
            prev: NO_PIECE,
            next: NO_PIECE,
        }
    }
}

/// One-slot lookup cache mapping a piece to its document start offsets.
#[derive(Debug, Clone, Copy)]
struct PieceCache {
    piece: PieceId,
    /// Rune offset of the cached piece in the document.
    start_runes: usize,
    /// Byte offset of the cached piece in the document.
    start_bytes: usize,
    rev: u64,
}

/// The doubly-linked piece list plus the arena that owns its nodes.
///
/// `rev` tracks the revision of the chain; every structural mutation bumps
/// it, which invalidates the lookup cache.
#[derive(Debug)]
pub(crate) struct PieceChain {
    nodes: Vec<PieceNode>,
    free: Vec<PieceId>,
    head: PieceId,
    tail: PieceId,
    cache: Option<PieceCache>,
    rev: u64,
}

impl PieceChain {
    pub fn new() -> Self {
        let mut chain = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: 0,
            tail: 0,
            cache: None,
            rev: 0,
        };
        chain.head = chain.alloc(PieceNode::sentinel());
        chain.tail = chain.alloc(PieceNode::sentinel());
        chain.nodes[chain.head].next = chain.tail;
        chain.nodes[chain.tail].prev = chain.head;
        chain
    }

    /// Drop every node and relink empty sentinels. The revision keeps
    /// increasing across the reset so stale caches elsewhere cannot match.
    pub fn reset(&mut self) {
        let rev = self.rev;
        *self = Self::new();
        self.rev = rev + 1;
    }

    pub fn alloc(&mut self, node: PieceNode) -> PieceId {
        if let Some(id) = self.free.pop() {
            self.nodes[id] = node;
            id
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Return a piece to the free list. The caller must guarantee nothing
    /// links to it anymore.
    pub fn release(&mut self, id: PieceId) {
        debug_assert!(id != self.head && id != self.tail);
        self.free.push(id);
    }

    pub fn piece(&self, id: PieceId) -> &PieceNode {
        &self.nodes[id]
    }

    pub fn piece_mut(&mut self, id: PieceId) -> &mut PieceNode {
        &mut self.nodes[id]
    }

    pub fn head(&self) -> PieceId {
        self.head
    }

    pub fn tail(&self) -> PieceId {
        self.tail
    }

    /// First content piece, or the tail sentinel for an empty chain.
    pub fn first(&self) -> PieceId {
        self.nodes[self.head].next
    }

    pub fn is_sentinel(&self, id: PieceId) -> bool {
        id == self.head || id == self.tail
    }

    pub fn revision(&self) -> u64 {
        self.rev
    }

    pub fn invalidate_cache(&mut self) {
        self.rev += 1;
    }

    /// Number of content pieces in the chain.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut n = self.first();
        while n != self.tail {
            count += 1;
            n = self.nodes[n].next;
        }
        count
    }

    pub fn insert_before(&mut self, existing: PieceId, new_piece: PieceId) {
        let prev = self.nodes[existing].prev;
        self.nodes[new_piece].next = existing;
        self.nodes[new_piece].prev = prev;
        self.nodes[prev].next = new_piece;
        self.nodes[existing].prev = new_piece;
    }

    pub fn insert_after(&mut self, existing: PieceId, new_piece: PieceId) {
        let next = self.nodes[existing].next;
        self.nodes[new_piece].prev = existing;
        self.nodes[new_piece].next = next;
        self.nodes[next].prev = new_piece;
        self.nodes[existing].next = new_piece;
    }

    /// Unlink a piece from the chain. Sentinels are refused.
    pub fn remove(&mut self, id: PieceId) {
        if self.is_sentinel(id) {
            return;
        }
        let (prev, next) = (self.nodes[id].prev, self.nodes[id].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    /// Find the piece containing `rune_index`, returning the piece, the rune
    /// offset inside it, and the byte offset of the piece in the document.
    ///
    /// `rune_index <= 0` resolves to the first content piece; an index at or
    /// past the end of the chain resolves to the tail sentinel, which callers
    /// use as the append anchor.
    pub fn find_by_rune(&mut self, rune_index: usize) -> (PieceId, usize, usize) {
        if rune_index == 0 {
            return (self.first(), 0, 0);
        }

        if let Some(cache) = self.cache {
            if cache.rev == self.rev {
                let len = self.nodes[cache.piece].rune_len;
                if rune_index >= cache.start_runes && rune_index < cache.start_runes + len {
                    return (cache.piece, rune_index - cache.start_runes, cache.start_bytes);
                }
            }
        }

        let mut piece_off = 0;
        let mut bytes_off = 0;
        let mut n = self.first();
        while n != self.tail {
            let next_pos = piece_off + self.nodes[n].rune_len;
            if rune_index < next_pos {
                self.cache = Some(PieceCache {
                    piece: n,
                    start_runes: piece_off,
                    start_bytes: bytes_off,
                    rev: self.rev,
                });
                return (n, rune_index - piece_off, bytes_off);
            }
            piece_off = next_pos;
            bytes_off += self.nodes[n].byte_len;
            n = self.nodes[n].next;
        }

        (self.tail, 0, bytes_off)
    }

    /// Find the piece containing `byte_index`, returning the piece and the
    /// byte offset inside it. Mirrors [`PieceChain::find_by_rune`].
    pub fn find_by_byte(&mut self, byte_index: usize) -> (PieceId, usize) {
        if byte_index == 0 {
            return (self.first(), 0);
        }

        if let Some(cache) = self.cache {
            if cache.rev == self.rev {
                let len = self.nodes[cache.piece].byte_len;
                if byte_index >= cache.start_bytes && byte_index < cache.start_bytes + len {
                    return (cache.piece, byte_index - cache.start_bytes);
                }
            }
        }

        let mut bytes_off = 0;
        let mut runes_off = 0;
        let mut n = self.first();
        while n != self.tail {
            let next_pos = bytes_off + self.nodes[n].byte_len;
            if byte_index < next_pos {
                self.cache = Some(PieceCache {
                    piece: n,
                    start_runes: runes_off,
                    start_bytes: bytes_off,
                    rev: self.rev,
                });
                return (n, byte_index - bytes_off);
            }
            bytes_off = next_pos;
            runes_off += self.nodes[n].rune_len;
            n = self.nodes[n].next;
        }

        (self.tail, 0)
    }
}

/// The caret selection captured alongside each undo entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaretPos {
    /// Selection start in runes.
    pub start: usize,
    /// Selection end in runes.
    pub end: usize,
}

/// A contiguous sub-chain of pieces affected by one edit.
///
/// Two flavours exist: a content range whose `first..=last` are real pieces,
/// and a boundary range standing for the empty slot between two adjacent
/// pieces (`first`/`last` then point at the surrounding pieces). The boundary
/// form lets pure inserts and pure deletes share the replace algebra.
#[derive(Debug)]
pub(crate) struct PieceRange {
    pub first: PieceId,
    pub last: PieceId,
    pub boundary: bool,

    /// Caret selection at the time of the edit, reported back by undo/redo.
    pub caret: CaretPos,
    /// Batch id shared by every edit inside one `group_op` pair.
    pub batch_id: Option<u64>,
    /// Edit shape `(start, replaced, inserted)` in runes; restore uses the
    /// inverted shape to re-bias markers.
    pub op_start: usize,
    pub op_replaced: usize,
    pub op_inserted: usize,
    /// Number of line-index ops this edit recorded (replayed on restore).
    pub line_ops: u32,
}

impl PieceRange {
    pub fn new() -> Self {
        Self {
            first: NO_PIECE,
            last: NO_PIECE,
            boundary: false,
            caret: CaretPos::default(),
            batch_id: None,
            op_start: 0,
            op_replaced: 0,
            op_inserted: 0,
            line_ops: 0,
        }
    }

    /// Turn this range into the boundary just before `target`.
    pub fn as_boundary(&mut self, chain: &PieceChain, target: PieceId) {
        self.first = chain.piece(target).prev;
        self.last = target;
        self.boundary = true;
    }

    /// Append a piece, linking it behind the current last piece. Pieces that
    /// are already neighbours in the main chain relink to the same position.
    pub fn append(&mut self, chain: &mut PieceChain, piece: PieceId) {
        if self.first == NO_PIECE {
            self.first = piece;
        } else {
            chain.piece_mut(self.last).next = piece;
            chain.piece_mut(piece).prev = self.last;
        }
        self.last = piece;
        self.boundary = false;
    }

    /// Replace this range's pieces in the chain with those of `dest`.
    ///
    /// After the call this range's pieces are out of the main list but still
    /// point at their former neighbours, ready to be pushed on the undo
    /// stack and restored later.
    pub fn swap(&self, chain: &mut PieceChain, dest: &PieceRange) {
        if self.boundary {
            if !dest.boundary {
                chain.piece_mut(self.first).next = dest.first;
                chain.piece_mut(self.last).prev = dest.last;
                chain.piece_mut(dest.first).prev = self.first;
                chain.piece_mut(dest.last).next = self.last;
            }
        } else if dest.boundary {
            let (prev, next) = {
                let first = chain.piece(self.first);
                let last = chain.piece(self.last);
                (first.prev, last.next)
            };
            chain.piece_mut(prev).next = next;
            chain.piece_mut(next).prev = prev;
        } else {
            let (prev, next) = {
                let first = chain.piece(self.first);
                let last = chain.piece(self.last);
                (first.prev, last.next)
            };
            chain.piece_mut(prev).next = dest.first;
            chain.piece_mut(next).prev = dest.last;
            chain.piece_mut(dest.first).prev = prev;
            chain.piece_mut(dest.last).next = next;
        }
    }

    /// Put this range's saved pieces back into the chain, taking out whatever
    /// occupies their place. The inverse of [`PieceRange::swap`].
    pub fn restore(&mut self, chain: &mut PieceChain) {
        if self.boundary {
            // The saved slot is between two pieces that currently sandwich
            // the swapped-in content: take that content out.
            let in_first = chain.piece(self.first).next;
            let in_last = chain.piece(self.last).prev;

            chain.piece_mut(self.first).next = self.last;
            chain.piece_mut(self.last).prev = self.first;

            self.first = in_first;
            self.last = in_last;
            self.boundary = false;
        } else {
            let anchor_l = chain.piece(self.first).prev;
            let anchor_r = chain.piece(self.last).next;

            if chain.piece(anchor_l).next == anchor_r {
                // The region is currently empty: move the saved pieces back
                // between the two anchors.
                chain.piece_mut(anchor_l).next = self.first;
                chain.piece_mut(anchor_r).prev = self.last;

                self.first = anchor_l;
                self.last = anchor_r;
                self.boundary = true;
            } else {
                // Swap the saved pieces with the range currently in the list.
                let in_first = chain.piece(anchor_l).next;
                let in_last = chain.piece(anchor_r).prev;

                chain.piece_mut(anchor_l).next = self.first;
                chain.piece_mut(anchor_r).prev = self.last;

                self.first = in_first;
                self.last = in_last;
                self.boundary = false;
            }
        }
    }

    /// Runes and bytes contained in the pieces of this range.
    pub fn size(&self, chain: &PieceChain) -> (usize, usize) {
        if self.first == NO_PIECE || self.boundary {
            return (0, 0);
        }
        let (mut runes, mut bytes) = (0, 0);
        let mut n = self.first;
        loop {
            let p = chain.piece(n);
            runes += p.rune_len;
            bytes += p.byte_len;
            if n == self.last {
                break;
            }
            n = p.next;
        }
        (runes, bytes)
    }

    /// Collect the piece ids of a content range.
    pub fn pieces(&self, chain: &PieceChain) -> Vec<PieceId> {
        let mut out = Vec::new();
        if self.first == NO_PIECE || self.boundary {
            return out;
        }
        let mut n = self.first;
        loop {
            out.push(n);
            if n == self.last {
                break;
            }
            n = chain.piece(n).next;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(chain: &mut PieceChain, rune_len: usize) -> PieceId {
        chain.alloc(PieceNode {
            source: BufferKind::Modify,
            rune_off: 0,
            rune_len,
            byte_off: 0,
            byte_len: rune_len,
            prev: NO_PIECE,
            next: NO_PIECE,
        })
    }

    fn chain_ids(chain: &PieceChain) -> Vec<PieceId> {
        let mut out = Vec::new();
        let mut n = chain.first();
        while n != chain.tail() {
            out.push(n);
            n = chain.piece(n).next;
        }
        out
    }

    #[test]
    fn test_sentinel_integrity() {
        let chain = PieceChain::new();
        assert_eq!(chain.piece(chain.head()).prev, NO_PIECE);
        assert_eq!(chain.piece(chain.tail()).next, NO_PIECE);
        assert_eq!(chain.piece(chain.head()).next, chain.tail());
        assert_eq!(chain.piece(chain.tail()).prev, chain.head());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut chain = PieceChain::new();
        let a = content(&mut chain, 1);
        let b = content(&mut chain, 2);
        chain.insert_before(chain.tail(), a);
        chain.insert_after(a, b);
        assert_eq!(chain_ids(&chain), vec![a, b]);

        chain.remove(a);
        assert_eq!(chain_ids(&chain), vec![b]);

        // Sentinels are refused.
        let head = chain.head();
        chain.remove(head);
        assert_eq!(chain.piece(head).next, b);
    }

    #[test]
    fn test_find_by_rune_walks_and_caches() {
        let mut chain = PieceChain::new();
        let a = content(&mut chain, 3);
        let b = content(&mut chain, 4);
        chain.insert_before(chain.tail(), a);
        chain.insert_before(chain.tail(), b);

        assert_eq!(chain.find_by_rune(0), (a, 0, 0));
        assert_eq!(chain.find_by_rune(2), (a, 2, 0));
        assert_eq!(chain.find_by_rune(3), (b, 0, 3));
        // Cache hit for a second query inside the same piece.
        assert_eq!(chain.find_by_rune(5), (b, 2, 3));
        // Past the end resolves to the tail sentinel.
        let (p, off, _) = chain.find_by_rune(7);
        assert_eq!(p, chain.tail());
        assert_eq!(off, 0);
    }

    #[test]
    fn test_find_by_byte() {
        let mut chain = PieceChain::new();
        let a = chain.alloc(PieceNode {
            source: BufferKind::Modify,
            rune_off: 0,
            rune_len: 2,
            byte_off: 0,
            byte_len: 4, // two 2-byte runes
            prev: NO_PIECE,
            next: NO_PIECE,
        });
        let b = content(&mut chain, 3);
        chain.insert_before(chain.tail(), a);
        chain.insert_before(chain.tail(), b);

        assert_eq!(chain.find_by_byte(0), (a, 0));
        assert_eq!(chain.find_by_byte(3), (a, 3));
        assert_eq!(chain.find_by_byte(4), (b, 0));
        assert_eq!(chain.find_by_byte(6), (b, 2));
        assert_eq!(chain.find_by_byte(99), (chain.tail(), 0));
    }

    #[test]
    fn test_swap_boundary_with_content_and_restore() {
        let mut chain = PieceChain::new();
        let a = content(&mut chain, 5);

        let mut old = PieceRange::new();
        old.as_boundary(&chain, chain.tail());

        let mut new_range = PieceRange::new();
        new_range.append(&mut chain, a);

        old.swap(&mut chain, &new_range);
        assert_eq!(chain_ids(&chain), vec![a]);

        old.restore(&mut chain);
        assert_eq!(chain_ids(&chain), Vec::<PieceId>::new());
        assert!(!old.boundary);
        assert_eq!(old.first, a);
        assert_eq!(old.last, a);

        // Restoring again swaps the piece back in.
        old.restore(&mut chain);
        assert_eq!(chain_ids(&chain), vec![a]);
        assert!(old.boundary);
    }

    #[test]
    fn test_swap_content_with_content_and_restore() {
        let mut chain = PieceChain::new();
        let a = content(&mut chain, 1);
        let b = content(&mut chain, 2);
        let c = content(&mut chain, 3);
        for id in [a, b, c] {
            chain.insert_before(chain.tail(), id);
        }

        // Replace b with d+e.
        let d = content(&mut chain, 4);
        let e = content(&mut chain, 5);
        let mut old = PieceRange::new();
        old.append(&mut chain, b);
        let mut dest = PieceRange::new();
        dest.append(&mut chain, d);
        dest.append(&mut chain, e);

        old.swap(&mut chain, &dest);
        assert_eq!(chain_ids(&chain), vec![a, d, e, c]);
        assert_eq!(old.size(&chain), (2, 2));

        old.restore(&mut chain);
        assert_eq!(chain_ids(&chain), vec![a, b, c]);
        assert_eq!(old.pieces(&chain), vec![d, e]);

        old.restore(&mut chain);
        assert_eq!(chain_ids(&chain), vec![a, d, e, c]);
        assert_eq!(old.pieces(&chain), vec![b]);
    }

    #[test]
    fn test_swap_content_with_boundary_and_restore() {
        let mut chain = PieceChain::new();
        let a = content(&mut chain, 1);
        let b = content(&mut chain, 2);
        let c = content(&mut chain, 3);
        for id in [a, b, c] {
            chain.insert_before(chain.tail(), id);
        }

        // Pure delete of b.
        let mut old = PieceRange::new();
        old.append(&mut chain, b);
        let mut dest = PieceRange::new();
        dest.boundary = true;

        old.swap(&mut chain, &dest);
        assert_eq!(chain_ids(&chain), vec![a, c]);

        old.restore(&mut chain);
        assert_eq!(chain_ids(&chain), vec![a, b, c]);
        assert!(old.boundary);

        old.restore(&mut chain);
        assert_eq!(chain_ids(&chain), vec![a, c]);
        assert!(!old.boundary);
        assert_eq!(old.pieces(&chain), vec![b]);
    }
}
