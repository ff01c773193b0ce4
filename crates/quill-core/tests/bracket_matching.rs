use quill_core::TextView;

fn view_with(text: &str) -> TextView {
    let mut view = TextView::new();
    view.set_text(text);
    view
}

fn match_at(text: &str, caret: usize) -> (Option<usize>, Option<usize>) {
    let mut view = view_with(text);
    view.set_caret(caret, caret);
    view.nearest_matching_brackets()
}

#[test]
fn test_inner_pair_from_inside() {
    assert_eq!(match_at("{a[b]c}", 3), (Some(2), Some(4)));
}

#[test]
fn test_outer_pair_before_closing_brace() {
    assert_eq!(match_at("{a[b]c}", 6), (Some(0), Some(6)));
}

#[test]
fn test_matched_mates_for_every_caret_in_balanced_text() {
    let text = "fn f(a: &[u8]) { g(a[0]); }";
    let runes: Vec<char> = text.chars().collect();
    let pairs = [('(', ')'), ('{', '}'), ('[', ']')];

    for caret in 0..=runes.len() {
        let (left, right) = match_at(text, caret);
        let (Some(left), Some(right)) = (left, right) else {
            // Carets not touching a bracket may legitimately match nothing.
            continue;
        };
        assert!(left < right, "caret {}: {} !< {}", caret, left, right);
        let mate = pairs
            .iter()
            .find(|(open, _)| *open == runes[left])
            .map(|(_, close)| *close);
        assert_eq!(
            mate,
            Some(runes[right]),
            "caret {}: {:?} vs {:?}",
            caret,
            runes[left],
            runes[right]
        );
    }
}

#[test]
fn test_unbalanced_sides_return_none() {
    assert_eq!(match_at("(abc", 2), (Some(0), None));
    let (left, right) = match_at("abc)", 1);
    assert_eq!(left, None);
    assert!(right.is_none());
}

#[test]
fn test_no_brackets_at_all() {
    assert_eq!(match_at("plain text", 5), (None, None));
}

#[test]
fn test_caret_at_document_edges() {
    assert_eq!(match_at("(x)", 0), (Some(0), Some(2)));
    assert_eq!(match_at("(x)", 3), (Some(0), Some(2)));
}

#[test]
fn test_selection_suppresses_matching() {
    let mut view = view_with("(x)");
    view.set_caret(0, 3);
    assert_eq!(view.nearest_matching_brackets(), (None, None));
}
