//! Grammar productions for the DSL.
//!
//! Statement-level productions live here; branches, sequences and terms are
//! in [`terms`].

mod terms;

use rowan::TextRange;

use super::core::Parser;
use super::cst::SyntaxKind;
use super::cst::kind_sets::{DIRECTIVE_ARGS, STMT_RECOVERY};
use super::lexer::code_body;
use crate::diagnostics::DiagnosticKind;

impl Parser<'_> {
    pub fn parse_root(&mut self) {
        self.start_node(SyntaxKind::Root);

        let mut seen_stmt = false;
        let mut pending_code: Vec<TextRange> = Vec::new();

        while !self.should_stop() {
            match self.current() {
                SyntaxKind::Code => {
                    let span = self.current_span();
                    self.parse_snippet();
                    if seen_stmt {
                        pending_code.push(span);
                    }
                }
                kind @ (SyntaxKind::Percent | SyntaxKind::Text) => {
                    // Code followed by another statement sits between statements.
                    for span in pending_code.drain(..) {
                        self.diagnostics
                            .report(DiagnosticKind::StrayCode, span)
                            .emit();
                    }
                    if kind == SyntaxKind::Percent {
                        self.parse_directive();
                    } else {
                        self.parse_def();
                    }
                    seen_stmt = true;
                }
                _ => {
                    self.error_and_bump_msg(
                        DiagnosticKind::ExpectedToken,
                        "a definition or a directive",
                    );
                }
            }
        }

        if !seen_stmt && !self.has_fatal_error() {
            self.error_msg(DiagnosticKind::ExpectedToken, "a definition or a directive");
        }

        self.eat_trivia();
        self.finish_node();
    }

    /// `% keyword [: tag] args... ;`
    fn parse_directive(&mut self) {
        self.start_node(SyntaxKind::Directive);
        self.bump();

        if !self.eat_token(SyntaxKind::Text) {
            self.error_msg(DiagnosticKind::ExpectedToken, "a directive name after `%`");
        }
        if self.currently_is(SyntaxKind::Colon) {
            self.parse_tag();
        }
        while self.currently_is_one_of(DIRECTIVE_ARGS) {
            if self.currently_is(SyntaxKind::Code) {
                self.bump_code();
            } else {
                self.bump();
            }
        }
        self.expect_semicolon();

        self.finish_node();
    }

    /// `name [: type] ;` declares a token, `name [: type] = branches ;` an
    /// expression.
    fn parse_def(&mut self) {
        self.start_node(SyntaxKind::Def);
        self.bump();

        if self.currently_is(SyntaxKind::Colon) {
            self.parse_tag();
        }

        match self.current() {
            SyntaxKind::Semicolon => self.bump(),
            SyntaxKind::Equals => {
                self.bump();
                self.parse_branches();
                self.expect_semicolon();
            }
            _ => {
                self.error_msg(DiagnosticKind::ExpectedToken, "`=` or `;` after the name");
                self.skip_until(STMT_RECOVERY);
                self.eat_token(SyntaxKind::Semicolon);
            }
        }

        self.finish_node();
    }

    fn expect_semicolon(&mut self) {
        if self.eat_token(SyntaxKind::Semicolon) {
            return;
        }
        self.error_msg(DiagnosticKind::ExpectedToken, "`;`");
        self.skip_until(STMT_RECOVERY);
        self.eat_token(SyntaxKind::Semicolon);
    }

    /// `: name`
    pub(super) fn parse_tag(&mut self) {
        self.start_node(SyntaxKind::Tag);
        self.bump();
        if !self.eat_token(SyntaxKind::Text) {
            self.error_msg(DiagnosticKind::ExpectedToken, "a name after `:`");
        }
        self.finish_node();
    }

    /// `CODE [: tag]`
    pub(super) fn parse_snippet(&mut self) {
        self.start_node(SyntaxKind::Snippet);
        self.bump_code();
        if self.currently_is(SyntaxKind::Colon) {
            self.parse_tag();
        }
        self.finish_node();
    }

    fn bump_code(&mut self) {
        let text = self.current_text();
        if code_body(text).is_none() {
            let braces = "}".repeat(text.chars().take_while(|&c| c == '{').count());
            let span = self.current_span();
            let start = TextRange::at(span.start(), (braces.len() as u32).into());
            self.error_at(DiagnosticKind::UnclosedDelimiter, start, braces);
        }
        self.bump();
    }
}
