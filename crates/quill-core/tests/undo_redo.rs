use quill_core::PieceTable;

/// Deterministic xorshift so the churn below is reproducible.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            0
        } else {
            (self.next() % bound as u64) as usize
        }
    }
}

#[test]
fn test_undo_redo_symmetry_over_random_edits() {
    const ALPHABET: [&str; 8] = ["a", "Z", "é", "你", "🙂", "\n", " ", "word "];

    let mut rng = Rng(0x5eed);
    let mut table = PieceTable::new("seed\ntext");

    // states[d] is the document text at undo depth d.
    let mut states = vec![table.text()];

    for _ in 0..300 {
        let len = table.len();
        match rng.below(4) {
            0 | 1 => {
                let at = rng.below(len + 1);
                let what = ALPHABET[rng.below(ALPHABET.len())];
                table.replace(at, at, what);
            }
            2 => {
                let start = rng.below(len + 1);
                let end = (start + rng.below(5)).min(len);
                let what = ALPHABET[rng.below(ALPHABET.len())];
                if start == end && what.is_empty() {
                    continue;
                }
                table.replace(start, end, what);
            }
            _ => {
                if len == 0 {
                    continue;
                }
                let start = rng.below(len);
                let end = (start + 1 + rng.below(6)).min(len);
                table.erase(start, end);
            }
        }

        // Coalesced inserts extend the top entry instead of pushing one.
        states.truncate(table.undo_depth());
        states.push(table.text());

        // Conservation: totals match a reparse of the document.
        let text = table.text();
        assert_eq!(table.len(), text.chars().count());
        assert_eq!(table.size(), text.len());
    }

    while table.undo_depth() > 0 {
        table.undo();
        assert_eq!(table.text(), states[table.undo_depth()]);
    }
    assert_eq!(table.text(), "seed\ntext");

    while table.redo_depth() > 0 {
        table.redo();
        assert_eq!(table.text(), states[table.undo_depth()]);
    }
}

#[test]
fn test_redo_cleared_by_fresh_edit() {
    let mut table = PieceTable::new("abc");
    table.replace(3, 3, "d");
    table.undo();
    assert_eq!(table.redo_depth(), 1);

    table.replace(0, 0, "x");
    assert_eq!(table.redo_depth(), 0);
    assert!(table.redo().is_empty());
    assert_eq!(table.text(), "xabc");
}

#[test]
fn test_undo_returns_caret_positions() {
    let mut table = PieceTable::new("abcdef");
    table.replace(2, 4, "XY");
    let carets = table.undo();
    assert_eq!(carets.len(), 1);
    assert_eq!(carets[0].start, 2);
    assert_eq!(carets[0].end, 4);
}

#[test]
fn test_group_restores_all_edits_in_one_undo() {
    let mut table = PieceTable::new("0123456789");
    table.group_op();
    table.erase(0, 2);
    table.replace(2, 2, "--");
    table.erase(6, 8);
    table.ungroup_op();
    assert_eq!(table.text(), "23--4567");

    let carets = table.undo();
    assert_eq!(carets.len(), 3);
    assert_eq!(table.text(), "0123456789");

    let carets = table.redo();
    assert_eq!(carets.len(), 3);
    assert_eq!(table.text(), "23--4567");
}

#[test]
fn test_adjacent_groups_stay_separate() {
    let mut table = PieceTable::new("");
    table.group_op();
    table.replace(0, 0, "one");
    table.ungroup_op();
    table.group_op();
    table.replace(3, 3, " two");
    table.ungroup_op();

    table.undo();
    assert_eq!(table.text(), "one");
    table.undo();
    assert_eq!(table.text(), "");
}

#[test]
fn test_nested_group_is_one_batch() {
    let mut table = PieceTable::new("x");
    table.group_op();
    table.replace(0, 0, "a");
    table.group_op();
    table.replace(2, 2, "b");
    table.ungroup_op();
    table.replace(3, 3, "c");
    table.ungroup_op();
    assert_eq!(table.text(), "axbc");

    table.undo();
    assert_eq!(table.text(), "x");
    table.redo();
    assert_eq!(table.text(), "axbc");
}

#[test]
fn test_undo_past_empty_stack_is_harmless() {
    let mut table = PieceTable::new("a");
    assert!(table.undo().is_empty());
    table.replace(1, 1, "b");
    table.undo();
    assert!(table.undo().is_empty());
    assert_eq!(table.text(), "a");
}
