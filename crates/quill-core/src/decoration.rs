//! Ranged text decorations anchored to markers.
//!
//! A decoration styles a rune range without modifying the text: diagnostics
//! squiggles, search-match backgrounds, link underlines. Each inserted
//! decoration anchors its ends to buffer markers (backward bias at the
//! start, forward bias at the end) so the range rides along with edits; the
//! store rebuilds its interval index when any anchor reports drift.
//!
//! The interval index is a start-sorted vector with a prefix-maximum-end
//! table used to prune range queries.

use crate::marker::{MarkerBias, MarkerId};
use crate::syntax::Color;
use crate::table::PieceTable;
use thiserror::Error;

/// Errors surfaced when building decorations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecorationError {
    /// The decoration range is inverted.
    #[error("invalid decoration range {start}..{end}")]
    InvalidRange {
        /// Requested start offset.
        start: usize,
        /// Requested end offset.
        end: usize,
    },
}

/// A ranged style annotation.
#[derive(Debug, Clone, Default)]
pub struct Decoration {
    /// Identifies who produced the decoration, for bulk removal.
    pub source: String,
    /// Painting order; higher priority paints later.
    pub priority: i32,
    /// Start rune offset (kept in sync with the start marker).
    pub start: usize,
    /// End rune offset, exclusive (kept in sync with the end marker).
    pub end: usize,
    /// Background fill.
    pub background: Option<Color>,
    /// Straight underline stroke.
    pub underline: Option<Color>,
    /// Squiggly underline stroke.
    pub squiggle: Option<Color>,
    /// Strikethrough stroke.
    pub strikethrough: Option<Color>,
    /// Border stroke.
    pub border: Option<Color>,
    /// Render the range in italics.
    pub italic: bool,
    /// Render the range in bold.
    pub bold: bool,

    start_marker: Option<MarkerId>,
    end_marker: Option<MarkerId>,
}

impl Decoration {
    /// Create a decoration covering `[start, end)` from `source`.
    pub fn new(source: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            source: source.into(),
            start,
            end,
            ..Self::default()
        }
    }

    /// The marker handles anchoring this decoration, once bound.
    pub fn markers(&self) -> (Option<MarkerId>, Option<MarkerId>) {
        (self.start_marker, self.end_marker)
    }

    fn bind(&mut self, table: &mut PieceTable) -> Result<(), DecorationError> {
        if self.start > self.end {
            return Err(DecorationError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        self.start_marker = Some(table.create_marker(self.start, MarkerBias::Backward));
        self.end_marker = Some(table.create_marker(self.end, MarkerBias::Forward));
        Ok(())
    }

    fn release(&self, table: &mut PieceTable) {
        if let Some(id) = self.start_marker {
            table.remove_marker(id);
        }
        if let Some(id) = self.end_marker {
            table.remove_marker(id);
        }
    }
}

/// Store of overlapping decorations with interval queries.
#[derive(Debug, Default)]
pub struct DecorationTree {
    /// Decorations sorted by `start`.
    items: Vec<Decoration>,
    /// `prefix_max_end[i] = max(items[0..=i].end)`, for query pruning.
    prefix_max_end: Vec<usize>,
}

impl DecorationTree {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored decorations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when no decorations are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        if self.items.is_empty() {
            self.prefix_max_end.clear();
            return;
        }
        if self.prefix_max_end.len() != self.items.len() {
            self.prefix_max_end.resize(self.items.len(), 0);
        }
        let mut max_end = if start_idx == 0 {
            0
        } else {
            self.prefix_max_end[start_idx - 1]
        };
        for (idx, item) in self.items.iter().enumerate().skip(start_idx) {
            max_end = max_end.max(item.end);
            self.prefix_max_end[idx] = max_end;
        }
    }

    /// Insert a decoration, anchoring it to `table` with a backward-bias
    /// start marker and a forward-bias end marker.
    pub fn insert(
        &mut self,
        mut decoration: Decoration,
        table: &mut PieceTable,
    ) -> Result<(), DecorationError> {
        decoration.bind(table)?;
        let pos = self
            .items
            .partition_point(|item| item.start < decoration.start);
        self.items.insert(pos, decoration);
        self.prefix_max_end.insert(pos, 0);
        self.rebuild_prefix_max_end_from(pos);
        Ok(())
    }

    /// All decorations covering `pos`.
    pub fn query_point(&self, pos: usize) -> Vec<&Decoration> {
        self.query_range(pos, pos + 1)
    }

    /// All decorations intersecting `[start, end)`, sorted by
    /// `(priority, start)`.
    pub fn query_range(&self, start: usize, end: usize) -> Vec<&Decoration> {
        if self.items.is_empty() || start >= end {
            return Vec::new();
        }

        // Everything at or past `end` starts too late to overlap.
        let scan_end = self.items.partition_point(|item| item.start < end);
        if scan_end == 0 {
            return Vec::new();
        }

        // Walk back while an earlier decoration may still cross `start`.
        let mut scan_start = self
            .items
            .partition_point(|item| item.start < start)
            .min(scan_end);
        while scan_start > 0 && self.prefix_max_end[scan_start - 1] > start {
            scan_start -= 1;
        }

        let mut result: Vec<&Decoration> = self.items[scan_start..scan_end]
            .iter()
            .filter(|item| item.start < end && item.end > start)
            .collect();
        result.sort_by_key(|item| (item.priority, item.start));
        result
    }

    /// Re-read every anchor; when any position drifted since the last
    /// build, update the cached ranges and rebuild the index. Decorations
    /// whose anchors went stale are dropped and their markers released.
    pub fn refresh(&mut self, table: &mut PieceTable) {
        let mut drifted = false;
        let mut dropped = false;
        for item in &mut self.items {
            let start = item.start_marker.and_then(|id| table.marker_offset(id));
            let end = item.end_marker.and_then(|id| table.marker_offset(id));
            match (start, end) {
                (Some(start), Some(end)) => {
                    if start != item.start || end != item.end {
                        item.start = start;
                        item.end = end;
                        drifted = true;
                    }
                }
                _ => dropped = true,
            }
        }

        if dropped {
            let mut kept = Vec::with_capacity(self.items.len());
            for item in self.items.drain(..) {
                let stale = item
                    .start_marker
                    .map(|id| table.marker_offset(id).is_none())
                    .unwrap_or(true)
                    || item
                        .end_marker
                        .map(|id| table.marker_offset(id).is_none())
                        .unwrap_or(true);
                if stale {
                    item.release(table);
                } else {
                    kept.push(item);
                }
            }
            self.items = kept;
            drifted = true;
        }

        if drifted {
            self.items.sort_by_key(|item| item.start);
            self.prefix_max_end.clear();
            self.rebuild_prefix_max_end_from(0);
        }
    }

    /// Remove every decoration from `source`, releasing their markers.
    /// Returns the number removed.
    pub fn remove_by_source(&mut self, source: &str, table: &mut PieceTable) -> usize {
        let mut removed = 0;
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if item.source == source {
                item.release(table);
                removed += 1;
            } else {
                kept.push(item);
            }
        }
        self.items = kept;
        self.prefix_max_end.clear();
        self.rebuild_prefix_max_end_from(0);
        removed
    }

    /// Remove everything, releasing all markers.
    pub fn remove_all(&mut self, table: &mut PieceTable) {
        for item in self.items.drain(..) {
            item.release(table);
        }
        self.prefix_max_end.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Color;

    fn deco(source: &str, start: usize, end: usize, priority: i32) -> Decoration {
        let mut d = Decoration::new(source, start, end);
        d.priority = priority;
        d.background = Some(Color::rgb(0x30, 0x30, 0x30));
        d
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut table = PieceTable::new("hello");
        let mut tree = DecorationTree::new();
        let err = tree.insert(deco("t", 4, 2, 0), &mut table).unwrap_err();
        assert_eq!(err, DecorationError::InvalidRange { start: 4, end: 2 });
        assert!(tree.is_empty());
        assert_eq!(table.marker_count(), 0);
    }

    #[test]
    fn test_query_range_sorted_by_priority() {
        let mut table = PieceTable::new("hello world");
        let mut tree = DecorationTree::new();
        tree.insert(deco("a", 0, 5, 2), &mut table).unwrap();
        tree.insert(deco("b", 3, 8, 1), &mut table).unwrap();
        tree.insert(deco("c", 9, 11, 0), &mut table).unwrap();

        let hits = tree.query_range(4, 6);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "b");
        assert_eq!(hits[1].source, "a");

        assert_eq!(tree.query_point(9).len(), 1);
        assert!(tree.query_range(8, 9).is_empty());
    }

    #[test]
    fn test_ranges_follow_edits_via_markers() {
        let mut table = PieceTable::new("hello world");
        let mut tree = DecorationTree::new();
        tree.insert(deco("t", 6, 11, 0), &mut table).unwrap();

        table.replace(0, 0, ">> ");
        tree.refresh(&mut table);
        assert_eq!(tree.query_point(9).len(), 1);
        let hit = tree.query_range(9, 14);
        assert_eq!(hit[0].start, 9);
        assert_eq!(hit[0].end, 14);
    }

    #[test]
    fn test_refresh_drops_stale_anchors() {
        let mut table = PieceTable::new("hello");
        let mut tree = DecorationTree::new();
        tree.insert(deco("t", 1, 3, 0), &mut table).unwrap();
        table.set_text("fresh");
        tree.refresh(&mut table);
        assert!(tree.is_empty());
        assert_eq!(table.marker_count(), 0);
    }

    #[test]
    fn test_remove_by_source_releases_markers() {
        let mut table = PieceTable::new("hello");
        let mut tree = DecorationTree::new();
        tree.insert(deco("a", 0, 2, 0), &mut table).unwrap();
        tree.insert(deco("b", 2, 4, 0), &mut table).unwrap();
        assert_eq!(table.marker_count(), 4);

        assert_eq!(tree.remove_by_source("a", &mut table), 1);
        assert_eq!(tree.len(), 1);
        assert_eq!(table.marker_count(), 2);

        tree.remove_all(&mut table);
        assert!(tree.is_empty());
        assert_eq!(table.marker_count(), 0);
    }
}
