use super::FallbackMap;
use crate::diagnostics::DiagnosticKind;
use crate::test_utils::{lower_ok, messages, token, tokens};

const FOREST: &str = "WORD; LETTER; A; B; C; %fallback WORD LETTER; %fallback LETTER A B; %fallback WORD C;";

#[test]
fn forest_shape() {
    let grammar = lower_ok(FOREST);
    let (map, diagnostics) = FallbackMap::extract(&grammar);
    assert!(diagnostics.is_empty());

    let word = token(&grammar, "WORD");
    let letter = token(&grammar, "LETTER");
    assert_eq!(map.parent(letter), Some(word));
    assert_eq!(map.parent(word), None);
    assert_eq!(
        map.children(word),
        [letter, token(&grammar, "C")]
    );
    assert_eq!(
        map.descendants(word),
        tokens(&grammar, &["LETTER", "A", "B", "C"])
    );
    assert!(map.is_descendant(token(&grammar, "A"), word));
    assert!(!map.is_descendant(word, token(&grammar, "A")));
}

#[test]
fn expand_adds_descendants() {
    let grammar = lower_ok(FOREST);
    let (map, _) = FallbackMap::extract(&grammar);

    let expanded = map.expand(&tokens(&grammar, &["LETTER"]));
    assert_eq!(expanded, tokens(&grammar, &["LETTER", "A", "B"]));
}

#[test]
fn fallback_set_skips_listed_subtrees() {
    let grammar = lower_ok(FOREST);
    let (map, _) = FallbackMap::extract(&grammar);

    let siblings = tokens(&grammar, &["WORD", "LETTER"]);
    let set = map.fallback_set(token(&grammar, "WORD"), &siblings);
    assert_eq!(set, tokens(&grammar, &["C"]));
}

#[test]
fn resolve_choice_prefers_nearest_listed() {
    let grammar = lower_ok(FOREST);
    let (map, _) = FallbackMap::extract(&grammar);

    let options = [
        tokens(&grammar, &["WORD"]),
        tokens(&grammar, &["LETTER"]),
        tokens(&grammar, &["B"]),
    ];
    let resolved = map.resolve_choice(&options);
    assert_eq!(resolved[0], tokens(&grammar, &["WORD", "C"]));
    assert_eq!(resolved[1], tokens(&grammar, &["LETTER", "A"]));
    assert_eq!(resolved[2], tokens(&grammar, &["B"]));
}

#[test]
fn resolve_choice_first_option_wins_duplicates() {
    let grammar = lower_ok(FOREST);
    let (map, _) = FallbackMap::extract(&grammar);

    let options = [tokens(&grammar, &["LETTER"]), tokens(&grammar, &["LETTER", "C"])];
    let resolved = map.resolve_choice(&options);
    assert_eq!(resolved[0], tokens(&grammar, &["LETTER", "A", "B"]));
    assert_eq!(resolved[1], tokens(&grammar, &["C"]));
}

#[test]
fn circular_fallback() {
    let grammar = lower_ok("A; B; C; %fallback A B; %fallback B C; %fallback C A;");
    let (map, diagnostics) = FallbackMap::extract(&grammar);
    assert_eq!(
        messages(&diagnostics),
        ["detected circular fallback: A → B → C → A"]
    );
    // The closing edge is dropped.
    assert_eq!(map.parent(token(&grammar, "A")), None);
}

#[test]
fn self_fallback_is_circular() {
    let grammar = lower_ok("A; %fallback A A;");
    let (_, diagnostics) = FallbackMap::extract(&grammar);
    assert_eq!(
        messages(&diagnostics),
        ["detected circular fallback: A → A"]
    );
}

#[test]
fn second_parent() {
    let grammar = lower_ok("A; B; C; %fallback A C; %fallback B C;");
    let (map, diagnostics) = FallbackMap::extract(&grammar);
    assert!(diagnostics.has_kind(DiagnosticKind::FallbackMultipleParents));
    assert_eq!(
        messages(&diagnostics),
        ["`C` falls back to multiple other types"]
    );
    assert_eq!(map.parent(token(&grammar, "C")), Some(token(&grammar, "A")));
}

#[test]
fn repeated_edge_is_not_a_second_parent() {
    let grammar = lower_ok("A; B; %fallback A B; %fallback A B;");
    let (_, diagnostics) = FallbackMap::extract(&grammar);
    assert!(diagnostics.is_empty());
}

#[test]
fn typed_fallback_must_keep_type() {
    let source = "%type s {char*}; %type n {int}; A:s; B:n; C; %fallback A B C;";
    let grammar = lower_ok(source);
    let (map, diagnostics) = FallbackMap::extract(&grammar);
    assert_eq!(
        messages(&diagnostics),
        ["fallback changes the token type: `B` has type `n` but `A` has type `s`"]
    );
    // Untyped tokens may fall back to typed ones.
    assert_eq!(map.parent(token(&grammar, "C")), Some(token(&grammar, "A")));
}
