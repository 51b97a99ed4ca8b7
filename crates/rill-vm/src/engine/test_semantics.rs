//! String-valued semantics and token-stream helpers for interpreter tests.
//!
//! Snippets are not executed as code. A snippet fails when its code
//! contains `fail`, returns `fix:<TOKEN>` when it mentions `$error`,
//! returns its own code when it takes no inputs, and otherwise returns its
//! inputs concatenated in slot order.

use std::cell::RefCell;
use std::rc::Rc;

use rill_compiler::Pipeline;
use rill_plan::{ParserPlan, TokenId, TypeId};

use super::error::{RuntimeError, SemanticError};
use super::parser::{Parser, Status};
use super::semantics::{ActionContext, Semantics, SyntaxErrorReport};
use super::trace::Tracer;

/// Half-open offsets into the token stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

pub fn span(start: usize, end: usize) -> Span {
    Span { start, end }
}

#[derive(Debug, Default)]
pub struct Log {
    /// Values currently owned by the parser or the test.
    pub live: i64,
    pub destroyed: Vec<String>,
    /// `TOKEN expected A B` per reported syntax error.
    pub errors: Vec<String>,
    pub locs: Vec<(String, Span)>,
}

#[derive(Clone, Default)]
pub struct TestSemantics {
    pub log: Rc<RefCell<Log>>,
}

impl TestSemantics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Semantics for TestSemantics {
    type Value = String;
    type Loc = Span;

    fn run(&mut self, mut action: ActionContext<'_, String, Span>) -> Result<Option<String>, SemanticError> {
        let code = action.code().trim();
        let inputs = action.take_all();
        let mut log = self.log.borrow_mut();
        log.live -= inputs.len() as i64;

        if code.contains('@') {
            let own = action.loc("$").copied();
            log.locs.extend(own.map(|loc| ("$".to_string(), loc)));
            for slot in action.function.slots.iter().skip(1) {
                if let Some(loc) = action.loc(&slot.name) {
                    log.locs.push((slot.name.clone(), *loc));
                }
            }
        }
        if code.contains("fail") {
            return Err(SemanticError::new(code));
        }

        let value = if code.contains("$error") {
            let token = action.error().map(|t| t.0).unwrap_or(u16::MAX);
            format!("fix:{token}")
        } else if inputs.is_empty() {
            code.to_string()
        } else {
            inputs.concat()
        };
        log.live += 1;
        Ok(Some(value))
    }

    fn destroy(&mut self, _ty: Option<TypeId>, value: String) {
        let mut log = self.log.borrow_mut();
        log.live -= 1;
        log.destroyed.push(value);
    }

    fn span(&mut self, first: &Span, last: &Span) -> Span {
        span(first.start, last.end)
    }

    fn zero_loc(&mut self, previous: Option<&Span>) -> Span {
        previous.map_or(Span::default(), |p| span(p.end, p.end))
    }

    fn syntax_error(&mut self, report: SyntaxErrorReport<'_, String, Span>) {
        let line = format!(
            "{} expected {}",
            report.token_name(),
            report.expected_names().join(" ")
        );
        self.log.borrow_mut().errors.push(line);
    }
}

/// Compiles `source`, which must be a valid grammar.
pub fn plan(source: &str) -> ParserPlan {
    let analyzed = Pipeline::new(source).parse().unwrap().analyze();
    assert!(
        analyzed.is_valid(),
        "unexpected diagnostics:\n{}",
        analyzed.diagnostics().printer().source(source).render()
    );
    analyzed.plan().unwrap()
}

/// Feeds whitespace-separated tokens, `NAME` or `NAME=value`. Token `i`
/// is located at `i..i+1`. Stops at the first status other than
/// [`Status::Ok`] or at the first error.
pub fn feed<T: Tracer>(parser: &mut Parser<'_, TestSemantics, T>, input: &str) -> Result<Status, RuntimeError> {
    feed_from(parser, input, 0)
}

/// Like [`feed`], with locations starting at `offset`.
pub fn feed_from<T: Tracer>(
    parser: &mut Parser<'_, TestSemantics, T>,
    input: &str,
    offset: usize,
) -> Result<Status, RuntimeError> {
    let plan = parser.plan();
    let mut status = Status::Ok;
    for (i, word) in input.split_whitespace().enumerate() {
        let (name, value) = match word.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (word, None),
        };
        let kind = plan
            .token_id(name)
            .unwrap_or_else(|| panic!("unknown token `{name}`"));
        if value.is_some() {
            parser.semantics().log.borrow_mut().live += 1;
        }
        let at = offset + i;
        status = parser.feed(kind, value, span(at, at + 1))?;
        if status != Status::Ok {
            break;
        }
    }
    Ok(status)
}

/// Takes the parse result, keeping the live count balanced.
pub fn take(parser: &mut Parser<'_, TestSemantics, impl Tracer>) -> Option<String> {
    let value = parser.take_output();
    if value.is_some() {
        parser.semantics().log.borrow_mut().live -= 1;
    }
    value
}

pub fn token(plan: &ParserPlan, name: &str) -> TokenId {
    plan.token_id(name).unwrap()
}
