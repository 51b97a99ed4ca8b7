use rill_core::Colors;

use crate::{
    FnId, FnPlan, ParserPlan, RootEntry, SlotId, SlotInfo, SnippetId, SnippetInfo, StateId, Step,
    TokenId, TokenInfo, TokenSet, TypeId, TypeInfo, dump,
};

fn slot(name: &str) -> SlotInfo {
    SlotInfo {
        name: name.to_string(),
        ty: Some(TypeId(0)),
    }
}

fn snippet(code: &str, bind: Option<&str>) -> SnippetInfo {
    SnippetInfo {
        code: code.to_string(),
        bind: bind.map(str::to_string),
        recovery: false,
        line: 1,
    }
}

/// `diff:str = STR:a (MINUS STR:b {a-b}:a)* {a};`
pub(crate) fn diff_plan() -> ParserPlan {
    let minus = TokenSet::single(TokenId(0));
    let str_ = TokenSet::single(TokenId(1));
    ParserPlan {
        tokens: vec![
            TokenInfo {
                name: "MINUS".into(),
                ty: None,
            },
            TokenInfo {
                name: "STR".into(),
                ty: Some(TypeId(0)),
            },
        ],
        types: vec![TypeInfo {
            name: "str".into(),
            spec: "char*".into(),
            destructor: Some("free($$);".into()),
        }],
        functions: vec![FnPlan {
            name: "diff".into(),
            ty: Some(TypeId(0)),
            slots: vec![slot("$$"), slot("a"), slot("b")],
            counters: 0,
            states: vec![
                Step::Match {
                    accept: str_.clone(),
                    bind: Some(SlotId(1)),
                    next: StateId(1),
                },
                Step::LoopTest {
                    counter: None,
                    min: 0,
                    max: None,
                    iterate: minus.clone(),
                    body: StateId(2),
                    exit: StateId(5),
                },
                Step::Match {
                    accept: minus,
                    bind: None,
                    next: StateId(3),
                },
                Step::Match {
                    accept: str_,
                    bind: Some(SlotId(2)),
                    next: StateId(4),
                },
                Step::Action {
                    snippet: SnippetId(0),
                    values: vec![SlotId(1), SlotId(2)],
                    locations: vec![],
                    output: Some(SlotId(1)),
                    next: StateId(1),
                },
                Step::Action {
                    snippet: SnippetId(1),
                    values: vec![SlotId(1)],
                    locations: vec![],
                    output: Some(SlotId::OUTPUT),
                    next: StateId(6),
                },
                Step::Return,
            ],
        }],
        snippets: vec![snippet("a-b", Some("a")), snippet("a", None)],
        roots: vec![RootEntry {
            name: "diff".into(),
            function: FnId(0),
        }],
        recoveries: vec![],
        end_token: None,
    }
}

#[test]
fn dump_diff_plan() {
    let out = dump(&diff_plan(), Colors::OFF);
    insta::assert_snapshot!(out, @r"
    [tokens]
    T0 MINUS
    T1 STR  ; str

    [types]
    Y0 str = {char*}  ; drop {free($$);}

    [roots]
    diff → F0

    [F0 diff]  ; str
      slots: $$ a b
      0  consume-token   {STR} $a → 1
      1  loop-test       0.. {MINUS} body 2 exit 5
      2  consume-token   {MINUS} → 3
      3  consume-token   {STR} $b → 4
      4  run-snippet     A0 in($a $b) out($a) → 1
      5  run-snippet     A1 in($a) out($$) → 6
      6  return
    ");
}

#[test]
fn dump_colored_wraps_headers() {
    let out = dump(&diff_plan(), Colors::ON);
    assert!(out.starts_with("\x1b[34m[tokens]\x1b[0m\n"));
}

#[test]
fn plan_serializes_to_json() {
    let json = serde_json::to_value(diff_plan()).unwrap();

    assert_eq!(json["roots"][0]["name"], "diff");
    assert_eq!(json["functions"][0]["states"][0]["op"], "match");
    assert_eq!(json["functions"][0]["states"][0]["accept"][0], 1);
    assert_eq!(json["functions"][0]["states"][6]["op"], "return");
}

#[test]
fn step_kinds_and_expected() {
    let plan = diff_plan();
    let f = plan.function(FnId(0));

    assert_eq!(f.state(StateId(1)).kind().as_str(), "loop-test");
    assert!(f.state(StateId(1)).needs_lookahead());
    assert!(!f.state(StateId(4)).needs_lookahead());
    assert_eq!(
        f.state(StateId(0)).expected(),
        Some(TokenSet::single(TokenId(1)))
    );
    assert_eq!(f.state(StateId(1)).expected(), None);
    assert_eq!(f.state(StateId(1)).successors(), [StateId(2), StateId(5)]);
}
