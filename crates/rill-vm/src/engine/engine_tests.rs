use indoc::indoc;
use rill_core::Colors;
use rill_plan::{FnId, TokenId};

use super::test_semantics::{TestSemantics, feed, plan, span, take};
use super::{Parser, ParserBuilder, PrintTracer, RuntimeError, Status};

const CALC: &str = indoc! {"
    %type str {char*} {free($$);};
    STR:str; PLUS; MINUS; EOF;
    sum:str = diff:a *(PLUS diff:b {$$ = cat($a, $b);}:a) EOF {$$ = $a;};
    diff:str = STR:a *(MINUS STR:b {$$ = cat($a, $b);}:a) {$$ = $a;};
"};

const RECOVER: &str = indoc! {"
    %type n {int};
    NUM:n; SEMI; JUNK:n; EOF;
    a:n = <NUM:x ? {$$ = fix($error);} {-1}:x> SEMI {$$ = $x;} EOF;
"};

/// Like `CALC`, with the operators carried as values.
const ARITH: &str = indoc! {"
    %type str {char*} {free($$);};
    STR:str; PLUS:str; MINUS:str; EOF;
    sum:str = diff:a *(PLUS:o diff:b {$$ = cat($a, $o, $b);}:a) EOF {$$ = $a;};
    diff:str = STR:a *(MINUS:o STR:b {$$ = cat($a, $o, $b);}:a) {$$ = $a;};
"};

#[test]
fn arithmetic() {
    let plan = plan(ARITH);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    let status = feed(
        &mut parser,
        "STR=QWER PLUS=+ STR=ASDF PLUS=+ STR=ZXVC MINUS=- STR=qwer MINUS=- STR=asdf MINUS=- STR=zxvc EOF",
    );

    assert_eq!(status, Ok(Status::Done));
    assert_eq!(
        take(&mut parser).as_deref(),
        Some("QWER+ASDF+ZXVC-qwer-asdf-zxvc")
    );
    assert_eq!(log.borrow().live, 0);
    assert!(log.borrow().errors.is_empty());
}

#[test]
fn untagged_operators_are_released() {
    let plan = plan(CALC);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    let status = feed(&mut parser, "STR=QWER PLUS STR=ASDF MINUS STR=qwer EOF");

    assert_eq!(status, Ok(Status::Done));
    assert_eq!(take(&mut parser).as_deref(), Some("QWERASDFqwer"));
    assert_eq!(log.borrow().live, 0);
}

#[test]
fn suspends_between_tokens() {
    let plan = plan(CALC);
    let mut parser = Parser::builder(&plan, FnId(0)).build(TestSemantics::new());

    assert_eq!(feed(&mut parser, "STR=a PLUS"), Ok(Status::Ok));
    assert!(!parser.is_finished());
    assert_eq!(feed(&mut parser, "STR=b EOF"), Ok(Status::Done));
    assert_eq!(take(&mut parser).as_deref(), Some("ab"));
}

#[test]
fn expected_tokens_include_follow() {
    let plan = plan(CALC);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "STR=a STR=b"), Ok(Status::SyntaxError));
    assert_eq!(log.borrow().errors, ["STR expected PLUS MINUS EOF"]);
    assert_eq!(log.borrow().live, 0);
    assert!(parser.is_finished());
    assert_eq!(take(&mut parser), None);
}

#[test]
fn counted_repeat_bounds() {
    let plan = plan("WORD; DOT; short = *4 WORD DOT;");
    let run = |input: &str| {
        let semantics = TestSemantics::new();
        let log = semantics.log.clone();
        let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);
        let status = feed(&mut parser, input);
        let errors = log.borrow().errors.clone();
        (status, errors)
    };

    assert_eq!(run("DOT"), (Ok(Status::Done), vec![]));
    assert_eq!(run("WORD WORD WORD WORD DOT"), (Ok(Status::Done), vec![]));
    assert_eq!(
        run("WORD WORD WORD WORD WORD"),
        (Ok(Status::SyntaxError), vec!["WORD expected DOT".to_string()])
    );
}

#[test]
fn fixed_repeat_requires_every_iteration() {
    let plan = plan("WORD; DOT; five = 5*5 WORD DOT;");
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "WORD WORD WORD WORD DOT"), Ok(Status::SyntaxError));
    assert_eq!(log.borrow().errors, ["DOT expected WORD"]);

    let mut parser = Parser::builder(&plan, FnId(0)).build(TestSemantics::new());
    assert_eq!(feed(&mut parser, "WORD WORD WORD WORD WORD DOT"), Ok(Status::Done));

    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);
    assert_eq!(
        feed(&mut parser, "WORD WORD WORD WORD WORD WORD"),
        Ok(Status::SyntaxError)
    );
    assert_eq!(log.borrow().errors, ["WORD expected DOT"]);
}

#[test]
fn fallback_token_is_accepted() {
    let plan = plan("ID; KW; EOF; %fallback ID KW; a = ID KW EOF;");

    let semantics = TestSemantics::new();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);
    assert_eq!(feed(&mut parser, "KW KW EOF"), Ok(Status::Done));

    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);
    assert_eq!(feed(&mut parser, "ID ID"), Ok(Status::SyntaxError));
    assert_eq!(log.borrow().errors, ["ID expected KW"]);
}

#[test]
fn fallback_subsumes_children() {
    let plan = plan("WORD; LETTER; A; B; C; %fallback LETTER A B C; asdf = WORD LETTER A B C;");
    let mut parser = Parser::builder(&plan, FnId(0)).build(TestSemantics::new());

    assert_eq!(feed(&mut parser, "WORD C A B C"), Ok(Status::Done));
}

#[test]
fn fallback_directive_declares_its_tokens() {
    let plan = plan("WORD; %fallback LETTER A B C; asdf = WORD LETTER A B C;");
    let mut parser = Parser::builder(&plan, FnId(0)).build(TestSemantics::new());

    assert_eq!(feed(&mut parser, "WORD A A B C"), Ok(Status::Done));
}

#[test]
fn without_fallback_children_are_rejected() {
    let plan = plan("WORD; LETTER; A; B; C; asdf = WORD LETTER A B C;");
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "WORD C"), Ok(Status::SyntaxError));
    assert_eq!(log.borrow().errors, ["C expected LETTER"]);
}

#[test]
fn recovery_discards_until_sentinel() {
    let plan = plan(RECOVER);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "JUNK=j JUNK=k"), Ok(Status::Ok));
    assert_eq!(feed(&mut parser, "SEMI EOF"), Ok(Status::Done));

    assert_eq!(take(&mut parser).as_deref(), Some("-1"));
    let log = log.borrow();
    assert_eq!(log.errors, ["JUNK expected NUM"]);
    assert_eq!(log.destroyed, ["j", "k", "fix:2"]);
    assert_eq!(log.live, 0);
}

#[test]
fn recovery_not_taken_on_valid_input() {
    let plan = plan(RECOVER);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "NUM=7 SEMI EOF"), Ok(Status::Done));
    assert_eq!(take(&mut parser).as_deref(), Some("7"));
    assert!(log.borrow().errors.is_empty());
}

#[test]
fn end_token_while_resynchronizing_is_fatal() {
    let plan = plan(RECOVER);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "JUNK=j EOF"), Ok(Status::SyntaxError));

    let log = log.borrow();
    assert_eq!(log.errors, ["JUNK expected NUM", "EOF expected SEMI"]);
    assert_eq!(log.destroyed, ["j", "-1", "fix:2"]);
    assert_eq!(log.live, 0);
}

#[test]
fn semantic_error_halts() {
    let plan = plan("A; B; a = A {fail} B;");
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "A"), Ok(Status::SemanticError));
    assert_eq!(
        parser.last_semantic_error().map(|e| e.message.as_str()),
        Some("fail")
    );
    assert_eq!(feed(&mut parser, "B=late"), Err(RuntimeError::ParserFinished));
    assert_eq!(log.borrow().destroyed, ["late"]);
    assert_eq!(log.borrow().live, 0);
}

#[test]
fn locations() {
    let plan = plan("A; B; a = A:x B {use(@x, @$);};");
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "A B"), Ok(Status::Done));
    assert_eq!(
        log.borrow().locs,
        [("$".to_string(), span(0, 2)), ("x".to_string(), span(0, 1))]
    );
    assert_eq!(parser.output_loc(), Some(&span(0, 2)));
}

#[test]
fn snippet_values_sit_after_the_last_token() {
    let plan = plan("A; B; a = A {tag}:y B {use(@y);};");
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "A B"), Ok(Status::Done));
    assert_eq!(log.borrow().locs, [("y".to_string(), span(1, 1))]);
    assert_eq!(log.borrow().live, 0);
}

#[test]
fn reset_releases_partial_parse() {
    let plan = plan(CALC);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "STR=a PLUS STR=b"), Ok(Status::Ok));
    assert_eq!(log.borrow().live, 2);
    parser.reset();
    assert_eq!(log.borrow().live, 0);

    assert_eq!(feed(&mut parser, "STR=c EOF"), Ok(Status::Done));
    assert_eq!(take(&mut parser).as_deref(), Some("c"));
}

#[test]
fn reset_releases_unclaimed_output() {
    let plan = plan("%type n {int}; NUM:n; a:n = NUM:x {$$ = $x;};");
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);

    assert_eq!(feed(&mut parser, "NUM=5"), Ok(Status::Done));
    assert_eq!(feed(&mut parser, "NUM=6"), Err(RuntimeError::ParserFinished));
    parser.reset();

    assert_eq!(log.borrow().destroyed, ["6", "5"]);
    assert_eq!(log.borrow().live, 0);
    assert_eq!(parser.take_output(), None);
}

#[test]
fn drop_releases_everything() {
    let plan = plan(CALC);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    {
        let mut parser = Parser::builder(&plan, FnId(0)).build(semantics);
        assert_eq!(feed(&mut parser, "STR=a MINUS STR=b"), Ok(Status::Ok));
    }
    assert_eq!(log.borrow().live, 0);
    assert_eq!(log.borrow().destroyed, ["ab"]);
}

#[test]
fn stack_overflow() {
    let plan = plan("A; B; a = A a | B;");

    let mut parser = Parser::builder(&plan, FnId(0)).build(TestSemantics::new());
    assert_eq!(feed(&mut parser, "A A B"), Ok(Status::Done));

    let mut parser = Parser::builder(&plan, FnId(0))
        .stack_depth(3)
        .build(TestSemantics::new());
    assert_eq!(feed(&mut parser, "A A A"), Err(RuntimeError::StackOverflow));
    assert!(parser.is_finished());
    assert_eq!(feed(&mut parser, "B"), Err(RuntimeError::ParserFinished));
}

#[test]
fn unknown_token_leaves_parser_untouched() {
    let plan = plan("A; B; a = A a | B;");
    let mut parser = Parser::builder(&plan, FnId(0)).build(TestSemantics::new());

    assert_eq!(
        parser.feed(TokenId(99), None, span(0, 1)),
        Err(RuntimeError::UnknownToken(TokenId(99)))
    );
    assert!(!parser.is_finished());
    assert_eq!(feed(&mut parser, "B"), Ok(Status::Done));
}

#[test]
fn exec_fuel() {
    let plan = plan(CALC);
    let semantics = TestSemantics::new();
    let log = semantics.log.clone();
    let mut parser = Parser::builder(&plan, FnId(0))
        .exec_fuel(2)
        .build(semantics);

    assert_eq!(feed(&mut parser, "STR=a"), Err(RuntimeError::ExecFuelExhausted));
    assert_eq!(log.borrow().live, 0);
}

#[test]
fn named_roots() {
    let plan = plan("A; B; a = A; b = B; %root a; %root b;");
    let mut parser = ParserBuilder::for_root(&plan, "b")
        .unwrap()
        .build(TestSemantics::new());

    assert_eq!(feed(&mut parser, "B"), Ok(Status::Done));
    assert!(ParserBuilder::for_root(&plan, "c").is_none());
}

#[test]
fn print_tracer() {
    let plan = plan("A; B; a = A B;");
    let tracer = PrintTracer::new(&plan, Colors::OFF);
    let mut parser = Parser::builder(&plan, FnId(0)).build_traced(TestSemantics::new(), tracer);

    assert_eq!(feed(&mut parser, "A B"), Ok(Status::Done));
    assert_eq!(
        parser.tracer().lines(),
        [
            "<< A",
            "  a 0 consume-token",
            "      = A",
            "  a 1 consume-token",
            "<< B",
            "  a 1 consume-token",
            "      = B",
            "  a 2 return",
            "      <- a",
        ]
    );
}
