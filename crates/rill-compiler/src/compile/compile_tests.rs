use indoc::indoc;
use rill_core::Colors;
use rill_plan::{
    Arm, CounterId, FnId, RecoveryInfo, SlotId, SnippetId, StateId, Step, TokenId, TokenSet,
    dump,
};

use crate::test_utils::plan_ok;

fn set(ids: &[u16]) -> TokenSet {
    ids.iter().map(|&i| TokenId(i)).collect()
}

#[test]
fn arithmetic() {
    let plan = plan_ok(indoc! {"
        %type str {char*} {free($$);};
        STR:str; PLUS; MINUS; EOF;
        sum:str = diff:a *(PLUS diff:b {$$ = cat($a, $b);}:a) EOF {$$ = $a;};
        diff:str = STR:a *(MINUS STR:b {$$ = cat($a, $b);}:a) {$$ = $a;};
    "});

    insta::assert_snapshot!(dump(&plan, Colors::OFF), @r"
    [tokens]
    T0 STR  ; str
    T1 PLUS
    T2 MINUS
    T3 EOF

    [types]
    Y0 str = {char*}  ; drop {free($$);}

    [roots]
    sum → F0

    [F0 sum]  ; str
      slots: $$ a b
      0  recurse         F1 diff → 1
      1  recurse         $a → 2
      2  loop-test       0.. {PLUS} body 3 exit 7
      3  consume-token   {PLUS} → 4
      4  recurse         F1 diff → 5
      5  recurse         $b → 6
      6  run-snippet     A0 in($a $b) out($a) → 2
      7  consume-token   {EOF} → 8
      8  run-snippet     A1 in($a) out($$) → 9
      9  return

    [F1 diff]  ; str
      slots: $$ a b
      0  consume-token   {STR} $a → 1
      1  loop-test       0.. {MINUS} body 2 exit 5
      2  consume-token   {MINUS} → 3
      3  consume-token   {STR} $b → 4
      4  run-snippet     A2 in($a $b) out($a) → 1
      5  run-snippet     A3 in($a) out($$) → 6
      6  return
    ");
    assert_eq!(plan.end_token, Some(TokenId(3)));
    assert_eq!(plan.snippets[0].code, "$$ = cat($a, $b);");
    assert_eq!(plan.snippets[0].bind.as_deref(), Some("a"));
    assert_eq!(plan.snippets[0].line, 3);
}

#[test]
fn dispatch_and_optional() {
    let plan = plan_ok("A; B; C; a = A | B [C] | *C;");

    insta::assert_snapshot!(dump(&plan, Colors::OFF), @r"
    [tokens]
    T0 A
    T1 B
    T2 C

    [roots]
    a → F0

    [F0 a]
      slots: $$
      0  branch-dispatch {A} 1 | {B} 2 | _ 5
      1  consume-token   {A} → 7
      2  consume-token   {B} → 3
      3  branch-dispatch {C} 4 | _ 7
      4  consume-token   {C} → 7
      5  loop-test       0.. {C} body 6 exit 7
      6  consume-token   {C} → 5
      7  return
    ");
}

#[test]
fn recovery_block() {
    let plan = plan_ok(indoc! {"
        %type n {int};
        NUM:n; SEMI; EOF;
        a:n = <NUM:x ? {$$ = fix($error);} {-1}:x> SEMI {$$ = $x;} EOF;
    "});

    insta::assert_snapshot!(dump(&plan, Colors::OFF), @r"
    [tokens]
    T0 NUM  ; n
    T1 SEMI
    T2 EOF

    [types]
    Y0 n = {int}

    [roots]
    a → F0

    [F0 a]  ; n
      slots: $$ x
      0  recovery-enter  R0 → 1
      1  consume-token   {NUM} $x → 2
      2  recovery-exit   R0 → 6
      3  run-snippet     A0 out($$) → 4
      4  run-snippet     A1 out($x) → 5
      5  await-token     R0 {SEMI} → 6
      6  consume-token   {SEMI} → 7
      7  run-snippet     A2 in($x) out($$) → 8
      8  consume-token   {EOF} → 9
      9  return
    ");
    assert_eq!(
        plan.recoveries,
        [RecoveryInfo {
            function: FnId(0),
            handler: StateId(3),
            sentinel: set(&[1]),
            scoped_slots: vec![SlotId(1)],
        }]
    );
    assert!(plan.snippets[0].recovery);
    assert!(!plan.snippets[2].recovery);
}

#[test]
fn recovery_releases_output_written_inside() {
    let plan = plan_ok(indoc! {"
        %type n {int};
        NUM:n; SEMI;
        a:n = <NUM:x {$$ = $x;} ? {$$ = 0;}> SEMI;
    "});
    assert_eq!(plan.recoveries[0].scoped_slots, [SlotId::OUTPUT, SlotId(1)]);
}

#[test]
fn counted_repeat() {
    let plan = plan_ok("WORD; DOT; short = *4 WORD DOT;");
    let f = plan.function(FnId(0));

    assert_eq!(f.counters, 1);
    assert_eq!(
        f.states[..2],
        [
            Step::LoopHead {
                counter: CounterId(0),
                next: StateId(1),
            },
            Step::LoopTest {
                counter: Some(CounterId(0)),
                min: 0,
                max: Some(4),
                iterate: set(&[0]),
                body: StateId(2),
                exit: StateId(3),
            },
        ]
    );
    assert_eq!(
        f.states[2],
        Step::Match {
            accept: set(&[0]),
            bind: None,
            next: StateId(1),
        }
    );
}

#[test]
fn nested_loops_get_their_own_counters() {
    let plan = plan_ok("A; B; a = 2*(A 3*3 B);");
    let f = plan.function(FnId(0));

    assert_eq!(f.counters, 2);
    let tests: Vec<(Option<CounterId>, u32, Option<u32>)> = f
        .states
        .iter()
        .filter_map(|s| match s {
            Step::LoopTest {
                counter, min, max, ..
            } => Some((*counter, *min, *max)),
            _ => None,
        })
        .collect();
    assert_eq!(
        tests,
        [(Some(CounterId(0)), 2, None), (Some(CounterId(1)), 3, Some(3))]
    );
}

#[test]
fn fallback_tokens_stay_with_the_follow() {
    let plan = plan_ok("LETTER; A; %fallback LETTER A; x = [LETTER] A;");
    let f = plan.function(FnId(0));

    assert_eq!(
        f.states[0],
        Step::Dispatch {
            arms: vec![Arm {
                accept: set(&[0]),
                target: StateId(1),
            }],
            default: Some(StateId(2)),
        }
    );
    // A plain match accepts every fallback of the expected token.
    assert_eq!(
        f.states[1],
        Step::Match {
            accept: set(&[0, 1]),
            bind: None,
            next: StateId(2),
        }
    );
}

#[test]
fn snippet_inputs() {
    let plan = plan_ok("%type n {int}; NUM:n; a:n = NUM:x {$$ = $x + $x; at(@x, @$, @x);};");
    let f = plan.function(FnId(0));

    assert_eq!(
        f.states[1],
        Step::Action {
            snippet: SnippetId(0),
            values: vec![SlotId(1)],
            locations: vec![SlotId(1), SlotId::OUTPUT],
            output: Some(SlotId::OUTPUT),
            next: StateId(2),
        }
    );
}

#[test]
fn declared_roots_in_order() {
    let plan = plan_ok("A; a = A; b = A; %root b; %root a;");
    let roots: Vec<(&str, FnId)> = plan
        .roots
        .iter()
        .map(|r| (r.name.as_str(), r.function))
        .collect();
    assert_eq!(roots, [("b", FnId(1)), ("a", FnId(0))]);
}

#[test]
fn plans_verify() {
    let plan = plan_ok("A; B; C; a = b *(C b); b = A [B] | B;");
    assert!(plan.verify().is_ok());
}
