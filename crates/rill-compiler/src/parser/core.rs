//! Parser state machine and low-level operations.

use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};

use super::cst::{KindSet, SyntaxKind};
use super::lexer::{Token, token_text};
use crate::Error;
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// An opened `(`, `[` or `<` waiting for its closer.
#[derive(Debug, Clone, Copy)]
struct OpenDelim {
    kind: SyntaxKind,
    span: TextRange,
}

/// Exec fuel is spent per consumed token; recursion fuel bounds nesting.
#[derive(Debug, Default)]
struct Fuel {
    exec: Option<u32>,
    recursion: Option<u32>,
    depth: u32,
}

/// Recursive-descent driver over a token vector.
///
/// Trivia between tokens is held back and attached to the tree right before
/// the next node or token, so a node never starts with whitespace.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    pending_trivia: Vec<Token>,
    builder: GreenNodeBuilder<'static>,
    pub(super) diagnostics: Diagnostics,
    /// Start of the last reported range; one diagnostic per position.
    last_report: Option<TextSize>,
    open_delims: Vec<OpenDelim>,
    fuel: Fuel,
    fatal: Option<Error>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            pending_trivia: Vec::new(),
            builder: GreenNodeBuilder::new(),
            diagnostics: Diagnostics::new(),
            last_report: None,
            open_delims: Vec::new(),
            fuel: Fuel::default(),
            fatal: None,
        }
    }

    pub fn with_exec_fuel(mut self, limit: Option<u32>) -> Self {
        self.fuel.exec = limit;
        self
    }

    pub fn with_recursion_fuel(mut self, limit: Option<u32>) -> Self {
        self.fuel.recursion = limit;
        self
    }

    pub(super) fn finish(mut self) -> Result<(GreenNode, Diagnostics), Error> {
        self.flush_trivia();
        match self.fatal {
            Some(error) => Err(error),
            None => Ok((self.builder.finish(), self.diagnostics)),
        }
    }

    pub(super) fn has_fatal_error(&self) -> bool {
        self.fatal.is_some()
    }

    fn set_fatal(&mut self, error: Error) {
        self.fatal.get_or_insert(error);
    }

    /// Next non-trivia token, moving any trivia before it into the buffer.
    fn peek(&mut self) -> Option<Token> {
        while let Some(&token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                return Some(token);
            }
            self.pending_trivia.push(token);
            self.pos += 1;
        }
        None
    }

    /// Current token kind; `Error` at end of input.
    pub(super) fn current(&mut self) -> SyntaxKind {
        self.peek().map_or(SyntaxKind::Error, |t| t.kind)
    }

    pub(super) fn current_text(&mut self) -> &'src str {
        let source = self.source;
        self.peek().map_or("", |t| token_text(source, &t))
    }

    /// Span of the current token; empty at the end of the source past EOF.
    pub(super) fn current_span(&mut self) -> TextRange {
        let end = TextSize::from(self.source.len() as u32);
        self.peek().map_or(TextRange::empty(end), |t| t.span)
    }

    pub(super) fn should_stop(&mut self) -> bool {
        self.peek().is_none() || self.has_fatal_error()
    }

    pub(super) fn currently_is(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(super) fn currently_is_one_of(&mut self, set: KindSet) -> bool {
        set.contains(self.current())
    }

    fn flush_trivia(&mut self) {
        let source = self.source;
        for token in self.pending_trivia.drain(..) {
            self.builder.token(token.kind.into(), token_text(source, &token));
        }
    }

    /// Attaches trailing trivia to the node being built.
    pub(super) fn eat_trivia(&mut self) {
        self.peek();
        self.flush_trivia();
    }

    pub(super) fn start_node(&mut self, kind: SyntaxKind) {
        self.eat_trivia();
        self.builder.start_node(kind.into());
    }

    pub(super) fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    /// Adds the current token to the tree. No-op at end of input.
    pub(super) fn bump(&mut self) {
        let Some(token) = self.peek() else {
            return;
        };
        match self.fuel.exec.as_mut() {
            Some(0) => self.set_fatal(Error::ExecFuelExhausted),
            Some(left) => *left -= 1,
            None => {}
        }
        self.flush_trivia();
        self.builder
            .token(token.kind.into(), token_text(self.source, &token));
        self.pos += 1;
    }

    pub(super) fn eat_token(&mut self, kind: SyntaxKind) -> bool {
        let matched = self.currently_is(kind);
        if matched {
            self.bump();
        }
        matched
    }

    /// Reports `what` as expected when the token does not match; nothing is
    /// consumed then.
    pub(super) fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        self.eat_token(kind) || {
            self.error_msg(DiagnosticKind::ExpectedToken, what);
            false
        }
    }

    /// Claims `range` for a report unless one already starts there.
    fn claim(&mut self, range: TextRange) -> bool {
        let fresh = self.last_report != Some(range.start());
        self.last_report = Some(range.start());
        fresh
    }

    pub(super) fn error_at(
        &mut self,
        kind: DiagnosticKind,
        range: TextRange,
        message: impl Into<String>,
    ) {
        if self.claim(range) {
            self.diagnostics.report(kind, range).message(message).emit();
        }
    }

    pub(super) fn error_msg(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let range = self.current_span();
        self.error_at(kind, range, message);
    }

    /// Reports, then wraps the offending token in an `Error` node.
    pub(super) fn error_and_bump_msg(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.error_msg(kind, message);
        if self.peek().is_some() {
            self.start_node(SyntaxKind::Error);
            self.bump();
            self.finish_node();
        }
    }

    /// Moves every token up to the next one in `stop` into an `Error` node.
    pub(super) fn skip_until(&mut self, stop: KindSet) {
        if self.currently_is_one_of(stop) || self.should_stop() {
            return;
        }
        self.start_node(SyntaxKind::Error);
        while !self.currently_is_one_of(stop) && !self.should_stop() {
            self.bump();
        }
        self.finish_node();
    }

    pub(super) fn enter_recursion(&mut self) -> bool {
        if self.fuel.recursion.is_some_and(|limit| self.fuel.depth >= limit) {
            self.set_fatal(Error::RecursionLimitExceeded);
            return false;
        }
        self.fuel.depth += 1;
        true
    }

    pub(super) fn exit_recursion(&mut self) {
        self.fuel.depth = self.fuel.depth.saturating_sub(1);
    }

    pub(super) fn push_delimiter(&mut self, kind: SyntaxKind) {
        let span = self.current_span();
        self.open_delims.push(OpenDelim { kind, span });
    }

    /// Consumes `close` for the innermost open delimiter. A missing closer
    /// is reported with a pointer back at the opener.
    pub(super) fn expect_closer(&mut self, close: SyntaxKind, text: &str) {
        let open = self.open_delims.pop();
        if self.eat_token(close) {
            return;
        }
        let here = self.current_span();
        if !self.claim(here) {
            return;
        }
        let report = self
            .diagnostics
            .report(DiagnosticKind::UnclosedDelimiter, here)
            .message(text);
        match open {
            Some(open) => report
                .related_to(format!("`{}` opened here", opener_text(open.kind)), open.span)
                .emit(),
            None => report.emit(),
        }
    }
}

fn opener_text(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::ParenOpen => "(",
        SyntaxKind::BracketOpen => "[",
        SyntaxKind::AngleOpen => "<",
        _ => "delimiter",
    }
}
