//! Step tracing for the interpreter.
//!
//! The parser is generic over its [`Tracer`]; with [`NoopTracer`] every call
//! is an empty inline function and disappears. [`PrintTracer`] collects
//! one line per event for `rill`'s debugging output and for tests.

use rill_core::Colors;
use rill_core::utils::width_for_count;
use rill_plan::{FnId, ParserPlan, RecoveryId, SnippetId, StateId, Step, TokenId, TokenSet};

use super::error::SemanticError;

/// Instrumentation points of the interpreter. All methods receive ids;
/// name resolution is up to the implementation.
pub trait Tracer {
    /// A token was fed.
    fn trace_token(&mut self, token: TokenId);

    /// Before executing `state` of `function`.
    fn trace_step(&mut self, function: FnId, state: StateId, step: &Step);

    /// The lookahead was consumed.
    fn trace_consume(&mut self, token: TokenId);

    fn trace_call(&mut self, callee: FnId);

    fn trace_return(&mut self, function: FnId);

    fn trace_action(&mut self, snippet: SnippetId);

    fn trace_syntax_error(&mut self, token: TokenId, expected: &TokenSet);

    fn trace_semantic_error(&mut self, error: &SemanticError);

    /// Unwound to `recovery`; parsing continues at its handler.
    fn trace_recover(&mut self, recovery: RecoveryId);

    /// A token was dropped while resynchronizing.
    fn trace_discard(&mut self, token: TokenId);
}

/// Tracer that compiles to nothing.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_token(&mut self, _token: TokenId) {}

    #[inline(always)]
    fn trace_step(&mut self, _function: FnId, _state: StateId, _step: &Step) {}

    #[inline(always)]
    fn trace_consume(&mut self, _token: TokenId) {}

    #[inline(always)]
    fn trace_call(&mut self, _callee: FnId) {}

    #[inline(always)]
    fn trace_return(&mut self, _function: FnId) {}

    #[inline(always)]
    fn trace_action(&mut self, _snippet: SnippetId) {}

    #[inline(always)]
    fn trace_syntax_error(&mut self, _token: TokenId, _expected: &TokenSet) {}

    #[inline(always)]
    fn trace_semantic_error(&mut self, _error: &SemanticError) {}

    #[inline(always)]
    fn trace_recover(&mut self, _recovery: RecoveryId) {}

    #[inline(always)]
    fn trace_discard(&mut self, _token: TokenId) {}
}

/// Tracer that collects human-readable lines.
pub struct PrintTracer<'p> {
    plan: &'p ParserPlan,
    colors: Colors,
    lines: Vec<String>,
    /// State-number width per function.
    widths: Vec<usize>,
}

impl<'p> PrintTracer<'p> {
    pub fn new(plan: &'p ParserPlan, colors: Colors) -> Self {
        let widths = plan
            .functions
            .iter()
            .map(|f| width_for_count(f.states.len()))
            .collect();
        Self {
            plan,
            colors,
            lines: Vec::new(),
            widths,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }

    fn token(&self, token: TokenId) -> String {
        let c = &self.colors;
        format!("{}{}{}", c.green, self.plan.token_name(token), c.reset)
    }

    fn function(&self, function: FnId) -> String {
        let c = &self.colors;
        let name = self
            .plan
            .functions
            .get(function.index())
            .map_or("?", |f| f.name.as_str());
        format!("{}{name}{}", c.blue, c.reset)
    }

    fn sub(&mut self, text: String) {
        self.lines.push(format!("      {text}"));
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_token(&mut self, token: TokenId) {
        let line = format!("<< {}", self.token(token));
        self.lines.push(line);
    }

    fn trace_step(&mut self, function: FnId, state: StateId, step: &Step) {
        let c = self.colors;
        let w = self.widths.get(function.index()).copied().unwrap_or(1);
        let line = format!(
            "  {} {}{:0w$}{} {}",
            self.function(function),
            c.dim,
            state.0,
            c.reset,
            step.kind().as_str()
        );
        self.lines.push(line);
    }

    fn trace_consume(&mut self, token: TokenId) {
        let text = format!("= {}", self.token(token));
        self.sub(text);
    }

    fn trace_call(&mut self, callee: FnId) {
        let text = format!("-> {}", self.function(callee));
        self.sub(text);
    }

    fn trace_return(&mut self, function: FnId) {
        let text = format!("<- {}", self.function(function));
        self.sub(text);
    }

    fn trace_action(&mut self, snippet: SnippetId) {
        let c = self.colors;
        let line = self
            .plan
            .snippets
            .get(snippet.index())
            .map_or(0, |s| s.line);
        self.sub(format!("{snippet} {}(line {line}){}", c.dim, c.reset));
    }

    fn trace_syntax_error(&mut self, token: TokenId, expected: &TokenSet) {
        let c = self.colors;
        let text = format!(
            "{}!{} unexpected {}, expected {{{}}}",
            c.red,
            c.reset,
            self.token(token),
            self.plan.token_names(expected).join(" ")
        );
        self.sub(text);
    }

    fn trace_semantic_error(&mut self, error: &SemanticError) {
        let c = self.colors;
        self.sub(format!("{}!{} {error}", c.red, c.reset));
    }

    fn trace_recover(&mut self, recovery: RecoveryId) {
        let text = match self.plan.recoveries.get(recovery.index()) {
            Some(info) => format!(
                "~ {recovery} {} → {}",
                self.function(info.function),
                info.handler
            ),
            None => format!("~ {recovery}"),
        };
        self.sub(text);
    }

    fn trace_discard(&mut self, token: TokenId) {
        let text = format!("- {}", self.token(token));
        self.sub(text);
    }
}
