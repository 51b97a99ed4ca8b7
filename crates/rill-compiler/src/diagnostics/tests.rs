use rowan::TextRange;

use super::*;

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn severity_display() {
    insta::assert_snapshot!(format!("{}", Severity::Error), @"error");
    insta::assert_snapshot!(format!("{}", Severity::Warning), @"warning");
}

#[test]
fn report_with_default_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::EmptyRepeat, range(0, 5))
        .emit();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_errors());
    let msg = diagnostics.iter().next().unwrap();
    assert_eq!(msg.message(), "repeated expression may match nothing");
}

#[test]
fn report_with_custom_message() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::DuplicateDefinition, range(0, 3))
        .message("sum")
        .emit();

    let msg = diagnostics.iter().next().unwrap();
    assert_eq!(msg.message(), "`sum` is already defined");
}

#[test]
fn warnings_are_counted_separately() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnusedToken, range(0, 3))
        .message("DOT")
        .emit();

    assert!(!diagnostics.has_errors());
    assert!(diagnostics.has_warnings());
    assert_eq!(diagnostics.warning_count(), 1);
    assert_eq!(diagnostics.error_count(), 0);
}

#[test]
fn compact_rendering() {
    let source = "a = X;\nb = [X] X;\n";
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::FirstFollowConflict, range(15, 16))
        .message("`X` in `b`")
        .related_to("optional part starts here", range(11, 14))
        .emit();

    let out = diagnostics.printer().source(source).path("g.rill").compact(true).render();
    insta::assert_snapshot!(out, @r"
    g.rill:2:9: error: FIRST/FOLLOW conflict on `X` in `b`
      g.rill:2:5: note: optional part starts here
    ");
}

#[test]
fn compact_rendering_includes_default_hint() {
    let source = "a = *[X];";
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::EmptyRepeat, range(4, 8))
        .emit();

    let out = diagnostics.printer().source(source).compact(true).render();
    insta::assert_snapshot!(out, @r"
    1:5: error: repeated expression may match nothing
      help: the repeated part must consume at least one token
    ");
}

#[test]
fn plain_rendering_without_source() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UndefinedReference, range(4, 7))
        .message("FOO")
        .emit();

    let out = diagnostics.printer().render();
    insta::assert_snapshot!(out, @"error at 4..7: `FOO` is not defined");
}

#[test]
fn annotated_rendering_mentions_message_and_line() {
    let source = "a = FOO;";
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UndefinedReference, range(4, 7))
        .message("FOO")
        .emit();

    let out = diagnostics.printer().source(source).render();
    assert!(out.starts_with("error: `FOO` is not defined"));
    assert!(out.contains("1 | a = FOO;"));
    assert!(out.contains("^^^"));
}

#[test]
fn filtered_drops_lower_priority_at_same_start() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::LoopConflict, range(2, 4))
        .emit();
    diagnostics
        .report(DiagnosticKind::UnexpectedToken, range(2, 3))
        .emit();
    diagnostics
        .report(DiagnosticKind::UnexpectedToken, range(2, 3))
        .emit();

    let filtered = diagnostics.filtered();
    assert_eq!(filtered.len(), 1);
    assert!(filtered.has_kind(DiagnosticKind::UnexpectedToken));
}

#[test]
fn line_index_columns_count_chars() {
    let source = "ab\n→x\n";
    let index = LineIndex::new(source);

    assert_eq!(index.line_col(source, 0.into()), (1, 1));
    assert_eq!(index.line_col(source, 3.into()), (2, 1));
    // `→` is three bytes wide.
    assert_eq!(index.line_col(source, 6.into()), (2, 2));
    assert_eq!(index.line(7.into()), 2);
    assert_eq!(index.line(8.into()), 3);
}
