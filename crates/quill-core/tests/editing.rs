use quill_core::PieceTable;

#[test]
fn test_keyed_append_coalescing_from_empty() {
    let mut table = PieceTable::empty();
    table.replace(0, 0, "H");
    table.replace(1, 1, "e");
    table.replace(2, 2, "l");
    table.replace(3, 3, "l");
    table.replace(4, 4, "o");

    assert_eq!(table.text(), "Hello");
    assert_eq!(table.piece_count(), 1);
    assert_eq!(table.undo_depth(), 1);

    table.undo();
    assert_eq!(table.text(), "");
    assert_eq!(table.len(), 0);
    assert_eq!(table.size(), 0);
}

#[test]
fn test_replace_within_piece_twice() {
    let mut table = PieceTable::new("Hello, world");
    table.replace(6, 6, " Go");
    assert_eq!(table.text(), "Hello, Go world");
    table.replace(6, 6, " welcome to the");
    assert_eq!(table.text(), "Hello, welcome to the Go world");
}

#[test]
fn test_erase_crossing_pieces() {
    let mut table = PieceTable::empty();
    table.replace(0, 0, "Hello");
    table.replace(5, 5, ",world");
    assert_eq!(table.text(), "Hello,world");

    table.erase(4, 6);
    assert_eq!(table.text(), "Hellworld");
    assert_eq!(table.size(), 9);
    assert_eq!(table.len(), 9);

    table.undo();
    assert_eq!(table.text(), "Hello,world");
    assert_eq!(table.size(), 11);
}

#[test]
fn test_out_of_range_coordinates_are_clamped() {
    let mut table = PieceTable::new("abc");
    assert!(table.replace(100, 200, "!"));
    assert_eq!(table.text(), "abc!");
    assert!(table.erase(2, 999));
    assert_eq!(table.text(), "ab");
    // Reversed ranges are normalized.
    assert!(table.replace(2, 0, "xy"));
    assert_eq!(table.text(), "xy");
}

#[test]
fn test_empty_replace_is_a_no_op() {
    let mut table = PieceTable::new("abc");
    assert!(!table.replace(1, 1, ""));
    assert_eq!(table.undo_depth(), 0);
    assert!(!table.changed());
}

#[test]
fn test_set_text_replaces_document_and_clears_history() {
    let mut table = PieceTable::new("one");
    table.replace(3, 3, " two");
    table.undo();
    assert_eq!(table.redo_depth(), 1);

    table.set_text("fresh\nstart");
    assert_eq!(table.text(), "fresh\nstart");
    assert_eq!(table.lines(), 2);
    assert_eq!(table.undo_depth(), 0);
    assert_eq!(table.redo_depth(), 0);
    assert_eq!(table.piece_count(), 1);
}

#[test]
fn test_multibyte_round_trip() {
    let mut table = PieceTable::new("héllo 世界");
    table.replace(6, 8, "🌍");
    assert_eq!(table.text(), "héllo 🌍");
    table.undo();
    assert_eq!(table.text(), "héllo 世界");
    table.redo();
    assert_eq!(table.text(), "héllo 🌍");
    assert_eq!(table.len(), 7);
    assert_eq!(table.size(), "héllo 🌍".len());
}

#[test]
fn test_revision_and_changed_track_every_mutation() {
    let mut table = PieceTable::new("a");
    assert!(!table.changed());

    let r0 = table.revision();
    table.replace(1, 1, "b");
    assert!(table.revision() > r0);
    assert!(table.changed());
    assert!(!table.changed());

    let r1 = table.revision();
    table.undo();
    assert!(table.revision() > r1);
    assert!(table.changed());
}
