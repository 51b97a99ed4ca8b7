use super::{Item, SeqItem, SyntaxToken, Term, parse};

fn items(source: &str) -> Vec<Item> {
    let (parse, diagnostics) = parse(source).unwrap();
    assert!(diagnostics.is_empty());
    parse.root().unwrap().items().collect()
}

#[test]
fn token_and_expression_definitions() {
    let items = items("STR:str; e:str = STR;");
    let [Item::Def(token), Item::Def(expr)] = items.as_slice() else {
        panic!("expected two definitions");
    };

    assert!(token.is_token());
    assert_eq!(token.name().unwrap().text(), "STR");
    assert_eq!(token.type_tag().unwrap().name().unwrap().text(), "str");
    assert!(token.body().is_none());

    assert!(!expr.is_token());
    assert_eq!(expr.body().unwrap().seqs().count(), 1);
}

#[test]
fn directive_parts() {
    let items = items("%type:c str {char *} {free($$);};");
    let [Item::Directive(d)] = items.as_slice() else {
        panic!("expected a directive");
    };

    assert_eq!(d.keyword().unwrap().text(), "type");
    assert_eq!(d.tag().unwrap().name().unwrap().text(), "c");
    let args: Vec<_> = d.args().iter().map(|t| t.text().to_string()).collect();
    assert_eq!(args, vec!["str", "{char *}", "{free($$);}"]);
}

#[test]
fn repeat_bounds() {
    let items = items("W; a = 2*5 W *3 W 4* W *W;");
    let [_, Item::Def(def)] = items.as_slice() else {
        panic!("expected two definitions");
    };
    let seq = def.body().unwrap().seqs().next().unwrap();
    let bounds: Vec<_> = seq
        .items()
        .map(|item| {
            let SeqItem::Term(Term::Repeat(r)) = item else {
                panic!("expected a repeat");
            };
            let text = |t: Option<SyntaxToken>| t.map(|t| t.text().to_string());
            (text(r.min()), text(r.max()))
        })
        .collect();

    assert_eq!(
        bounds,
        vec![
            (Some("2".into()), Some("5".into())),
            (None, Some("3".into())),
            (Some("4".into()), None),
            (None, None),
        ]
    );
}

#[test]
fn snippet_body_and_bind() {
    let items = items("A; a = A {{ x }}:v;");
    let [_, Item::Def(def)] = items.as_slice() else {
        panic!("expected two definitions");
    };
    let seq = def.body().unwrap().seqs().next().unwrap();
    let snippet = seq
        .items()
        .find_map(|item| match item {
            SeqItem::Snippet(s) => Some(s),
            SeqItem::Term(_) => None,
        })
        .unwrap();

    assert_eq!(snippet.body().unwrap(), " x ");
    assert_eq!(snippet.bind().unwrap().name().unwrap().text(), "v");
}

#[test]
fn recovery_handlers() {
    let items = items("X; S; s = <X ? {a} {b}> S;");
    let [_, _, Item::Def(def)] = items.as_slice() else {
        panic!("expected three definitions");
    };
    let seq = def.body().unwrap().seqs().next().unwrap();
    let Some(SeqItem::Term(Term::Recovery(rec))) = seq.items().next() else {
        panic!("expected a recovery block");
    };

    let handlers: Vec<_> = rec.handlers().map(|h| h.body().unwrap()).collect();
    assert_eq!(handlers, vec!["a", "b"]);
    assert_eq!(rec.body().unwrap().seqs().count(), 1);
}
