use crate::diagnostics::DiagnosticKind;
use crate::test_utils::{analyze_source, messages, pipeline_messages};

fn conflicts(source: &str) -> Vec<String> {
    let (_, _, _, diagnostics) = analyze_source(source);
    messages(&diagnostics)
}

#[test]
fn ll1_grammar_is_clean() {
    let source = "NUM; PLUS; MINUS; EOF; sum = term *((PLUS | MINUS) term) EOF; term = NUM;";
    assert!(conflicts(source).is_empty());
}

#[test]
fn optional_then_same_token() {
    assert_eq!(
        conflicts("A; a = [A] A;"),
        ["FIRST/FOLLOW conflict on `A` in `a`"]
    );
}

#[test]
fn alternatives_start_the_same_way() {
    assert_eq!(
        conflicts("A; B; a = A B | A;"),
        ["FIRST/FIRST conflict on `A` in `a`"]
    );
}

#[test]
fn alternatives_through_references() {
    let (_, _, _, diagnostics) = analyze_source("A; B; a = b | c; b = A; c = [B] A;");
    assert!(diagnostics.has_kind(DiagnosticKind::FirstFirstConflict));
    assert_eq!(
        messages(&diagnostics),
        ["FIRST/FIRST conflict on `A` in `a`"]
    );
}

#[test]
fn two_empty_alternatives() {
    assert_eq!(
        conflicts("A; B; a = [A] | [B];"),
        ["FIRST/FIRST conflict on empty input in `a`"]
    );
}

#[test]
fn mandatory_element_clears_pending() {
    assert!(conflicts("A; B; a = [A] B A;").is_empty());
}

#[test]
fn nullable_group_decides_locally() {
    assert_eq!(
        conflicts("A; B; a = (A | [B]) B;"),
        ["FIRST/FOLLOW conflict on `B` in `a`"]
    );
}

#[test]
fn loop_cannot_tell_iteration_from_exit() {
    let (_, _, _, diagnostics) = analyze_source("A; a = *(A *A);");
    assert!(diagnostics.has_kind(DiagnosticKind::LoopConflict));
    assert_eq!(
        messages(&diagnostics),
        ["repeat cannot decide whether to continue on `A` in `a`"]
    );
}

#[test]
fn bounded_loop_at_max_is_fine() {
    assert!(conflicts("A; B; a = 2*2 A B;").is_empty());
}

#[test]
fn fallback_decided_by_local_choice() {
    // The optional sees `KW` as its follow and leaves it there.
    assert!(conflicts("ID; KW; %fallback ID KW; a = [ID] KW;").is_empty());
}

#[test]
fn fallback_decided_inside_callee() {
    // `b` decides on its own and would take `KW` as an `ID`.
    assert_eq!(
        conflicts("ID; KW; %fallback ID KW; a = b KW; b = [ID];"),
        ["FIRST/FOLLOW conflict on `KW` in `a`"]
    );
}

#[test]
fn explicit_overlap_ignores_fallbacks() {
    assert_eq!(
        conflicts("ID; KW; %fallback ID KW; a = [ID] ID;"),
        ["FIRST/FOLLOW conflict on `ID` in `a`"]
    );
}

#[test]
fn required_repeat_hides_earlier_optional() {
    // `1*X` always consumes, so the optional `Y` is no longer pending.
    assert!(conflicts("X; Y; a = [Y] 1*X Y;").is_empty());
    assert_eq!(
        conflicts("X; Y; a = [Y] *X Y;"),
        ["FIRST/FOLLOW conflict on `Y` in `a`"]
    );
}

#[test]
fn fallback_tokens_need_the_directive() {
    assert!(pipeline_messages("WORD; %fallback LETTER A B C; asdf = WORD LETTER A B C;").is_empty());

    let errors = pipeline_messages("WORD; asdf = WORD LETTER A B C;");
    assert_eq!(
        errors,
        [
            "`LETTER` is not defined",
            "`A` is not defined",
            "`B` is not defined",
            "`C` is not defined",
        ]
    );
}
