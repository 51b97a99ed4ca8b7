use super::cst::SyntaxKind;
use super::lexer::{code_body, lex, token_text};

fn kinds(source: &str) -> Vec<(SyntaxKind, &str)> {
    lex(source)
        .iter()
        .filter(|t| !t.kind.is_trivia())
        .map(|t| (t.kind, token_text(source, t)))
        .collect()
}

#[test]
fn punctuation_and_names() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("sum:str = 2*3 x | [y] <z ? {e}>;"),
        vec![
            (Text, "sum"),
            (Colon, ":"),
            (Text, "str"),
            (Equals, "="),
            (Num, "2"),
            (Star, "*"),
            (Num, "3"),
            (Text, "x"),
            (Pipe, "|"),
            (BracketOpen, "["),
            (Text, "y"),
            (BracketClose, "]"),
            (AngleOpen, "<"),
            (Text, "z"),
            (Question, "?"),
            (Code, "{e}"),
            (AngleClose, ">"),
            (Semicolon, ";"),
        ]
    );
}

#[test]
fn comments_and_newlines_are_trivia() {
    let tokens = lex("a; # trailing words\nb;");
    let trivia: Vec<_> = tokens.iter().filter(|t| t.kind.is_trivia()).map(|t| t.kind).collect();
    assert_eq!(
        trivia,
        vec![SyntaxKind::Whitespace, SyntaxKind::Comment, SyntaxKind::Newline]
    );
}

#[test]
fn single_brace_code_is_balanced() {
    assert_eq!(
        kinds("{ if (x) { y(); } } ;"),
        vec![
            (SyntaxKind::Code, "{ if (x) { y(); } }"),
            (SyntaxKind::Semicolon, ";")
        ]
    );
}

#[test]
fn multi_brace_code_ends_at_closing_run() {
    assert_eq!(
        kinds("{{ a } b }} c"),
        vec![(SyntaxKind::Code, "{{ a } b }}"), (SyntaxKind::Text, "c")]
    );
}

#[test]
fn unterminated_code_runs_to_end() {
    assert_eq!(kinds("{ a { b }"), vec![(SyntaxKind::Code, "{ a { b }")]);
}

#[test]
fn garbage_is_coalesced() {
    assert_eq!(
        kinds("a @@& b"),
        vec![
            (SyntaxKind::Text, "a"),
            (SyntaxKind::Garbage, "@@&"),
            (SyntaxKind::Text, "b")
        ]
    );
}

#[test]
fn code_body_strips_braces() {
    assert_eq!(code_body("{ x }"), Some(" x "));
    assert_eq!(code_body("{{ } }}"), Some(" } "));
    assert_eq!(code_body("{}"), Some(""));
    assert_eq!(code_body("{ x"), None);
    assert_eq!(code_body("{{ x }"), None);
}
