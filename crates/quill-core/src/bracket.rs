//! Caret-anchored bracket matching.
//!
//! Starting from the rune under (or immediately left of) the caret, the
//! matcher scans outward keeping a stack of brackets that are not yet
//! matched; the first bracket that would unbalance the stack on each side is
//! the match. The configured pairs come from
//! [`EditorOptions::bracket_pairs`](crate::EditorOptions).

use crate::text_view::TextView;
use std::collections::HashMap;

fn reversed_pairs(pairs: &HashMap<char, char>) -> HashMap<char, char> {
    pairs.iter().map(|(&open, &close)| (close, open)).collect()
}

impl TextView {
    /// Find the nearest matching bracket pair around the caret, returning
    /// the rune offsets of the left and right brackets. A side without a
    /// match is `None`; a non-empty selection matches nothing.
    pub fn nearest_matching_brackets(&mut self) -> (Option<usize>, Option<usize>) {
        let (sel_start, sel_end) = self.selection();
        if sel_start != sel_end {
            return (None, None);
        }

        let pairs = self.options.bracket_pairs.clone();
        let reversed = reversed_pairs(&pairs);
        let len = self.source.len();

        let mut left = None;
        let mut right = None;
        let mut stack: Vec<char> = Vec::new();

        // Prefer the rune under the caret; fall back to the rune to its left.
        let mut start = sel_start.min(len);
        let mut nearest = self.source.read_rune_at(start);
        let on_bracket = nearest
            .map(|r| pairs.contains_key(&r) || reversed.contains_key(&r))
            .unwrap_or(false);
        if !on_bracket && start > 0 {
            start -= 1;
            nearest = self.source.read_rune_at(start);
        }

        if let Some(r) = nearest {
            if pairs.contains_key(&r) {
                left = Some(start);
                stack.push(r);
            } else if reversed.contains_key(&r) {
                right = Some(start);
                stack.push(r);
            }
        }

        let mut offset = start;

        // Scan leftward for the opening half.
        if left.is_none() {
            while offset > 0 {
                offset -= 1;
                let Some(next) = self.source.read_rune_at(offset) else {
                    break;
                };
                if let Some(&close) = pairs.get(&next) {
                    if stack.last() == Some(&close) {
                        stack.pop();
                        if right.is_some() && stack.is_empty() {
                            left = Some(offset);
                            break;
                        }
                    } else {
                        stack.push(next);
                        left = Some(offset);
                        break;
                    }
                } else if reversed.contains_key(&next) {
                    stack.push(next);
                }
            }
        }

        // Scan rightward for the closing half.
        if right.is_none() {
            loop {
                offset += 1;
                if offset >= len {
                    break;
                }
                let Some(next) = self.source.read_rune_at(offset) else {
                    break;
                };
                if pairs.contains_key(&next) {
                    stack.push(next);
                } else if let Some(&open) = reversed.get(&next) {
                    if stack.last() == Some(&open) {
                        stack.pop();
                        if stack.is_empty() {
                            right = Some(offset);
                            break;
                        }
                    }
                    // An unbalanced closing bracket is dropped.
                }
            }
        }

        (left, right)
    }
}
