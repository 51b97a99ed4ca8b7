use super::super::core::Parser;
use super::super::cst::SyntaxKind;
use super::super::cst::kind_sets::TERM_FIRST;
use crate::diagnostics::DiagnosticKind;

impl Parser<'_> {
    /// `seq ("|" seq)*`, or `"|" seq ("|" seq)+` with a leading bar.
    pub(crate) fn parse_branches(&mut self) {
        self.start_node(SyntaxKind::Branches);
        let leading = self
            .currently_is(SyntaxKind::Pipe)
            .then(|| self.current_span());
        self.eat_token(SyntaxKind::Pipe);
        self.parse_seq();
        let mut alternatives = 1;
        while self.eat_token(SyntaxKind::Pipe) {
            self.parse_seq();
            alternatives += 1;
        }
        if let Some(bar) = leading
            && alternatives == 1
        {
            self.error_at(
                DiagnosticKind::UnexpectedToken,
                bar,
                "`|` before a single alternative",
            );
        }
        self.finish_node();
    }

    /// Terms and snippets up to the next separator or closer. At least one
    /// term is required.
    fn parse_seq(&mut self) {
        self.start_node(SyntaxKind::Seq);

        let mut terms = 0;
        while !self.should_stop() {
            let kind = self.current();
            if kind == SyntaxKind::Code {
                self.parse_snippet();
            } else if TERM_FIRST.contains(kind) {
                self.parse_term();
                terms += 1;
            } else {
                break;
            }
        }

        if terms == 0 {
            self.error_msg(DiagnosticKind::ExpectedToken, "an expression");
        }

        self.finish_node();
    }

    fn parse_term(&mut self) {
        if !self.enter_recursion() {
            self.start_node(SyntaxKind::Error);
            while !self.should_stop() {
                self.bump();
            }
            self.finish_node();
            return;
        }

        match self.current() {
            SyntaxKind::Num | SyntaxKind::Star => self.parse_repeat(),
            SyntaxKind::Text => self.parse_ref(true),
            SyntaxKind::ParenOpen => self.parse_group(),
            SyntaxKind::BracketOpen => self.parse_optional(),
            SyntaxKind::AngleOpen => self.parse_recovery(),
            _ => self.error_and_bump_msg(DiagnosticKind::ExpectedToken, "an expression"),
        }

        self.exit_recursion();
    }

    /// `name [: bind]`
    fn parse_ref(&mut self, allow_bind: bool) {
        self.start_node(SyntaxKind::Ref);
        self.bump();
        if allow_bind && self.currently_is(SyntaxKind::Colon) {
            self.parse_tag();
        }
        self.finish_node();
    }

    /// `[NUM] * [NUM] (name | "(" branches ")")`
    fn parse_repeat(&mut self) {
        self.start_node(SyntaxKind::Repeat);

        self.eat_token(SyntaxKind::Num);
        if self.expect(SyntaxKind::Star, "`*` after a repeat count") {
            self.eat_token(SyntaxKind::Num);
        }

        match self.current() {
            SyntaxKind::Text => self.parse_ref(false),
            SyntaxKind::ParenOpen => self.parse_group(),
            _ => self.error_msg(DiagnosticKind::ExpectedToken, "a name or `(` after `*`"),
        }

        self.finish_node();
    }

    fn parse_group(&mut self) {
        self.start_node(SyntaxKind::Group);
        self.push_delimiter(SyntaxKind::ParenOpen);
        self.bump();
        self.parse_branches();
        self.expect_closer(SyntaxKind::ParenClose, ")");
        self.finish_node();
    }

    fn parse_optional(&mut self) {
        self.start_node(SyntaxKind::Optional);
        self.push_delimiter(SyntaxKind::BracketOpen);
        self.bump();
        self.parse_branches();
        self.expect_closer(SyntaxKind::BracketClose, "]");
        self.finish_node();
    }

    /// `< branches ? code* >`
    fn parse_recovery(&mut self) {
        self.start_node(SyntaxKind::Recovery);
        self.push_delimiter(SyntaxKind::AngleOpen);
        self.bump();
        self.parse_branches();
        if self.expect(SyntaxKind::Question, "`?` before the recovery code") {
            while self.currently_is(SyntaxKind::Code) {
                self.parse_snippet();
            }
        }
        self.expect_closer(SyntaxKind::AngleClose, ">");
        self.finish_node();
    }
}
