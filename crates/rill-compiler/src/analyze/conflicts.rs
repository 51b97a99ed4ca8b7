//! LL(1) conflict checks.
//!
//! Three checks over the FIRST and disallowed-after sets:
//! alternatives of one branches node must start differently, an element of
//! a sequence must not start with a token its predecessors may continue
//! with, and a repeat must be able to tell another iteration from its exit.

use rill_core::Symbol;
use rill_plan::TokenSet;
use rowan::TextRange;

use super::fallback::FallbackMap;
use super::Analysis;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::visit::{Visitor, walk_branches, walk_multiplier, walk_sequence};
use crate::ir::{Branches, Element, Grammar, Multiplier, Sequence, Term};

pub(super) fn check(grammar: &Grammar, analysis: &Analysis, fallbacks: &FallbackMap) -> Diagnostics {
    let mut checker = ConflictChecker {
        grammar,
        analysis,
        fallbacks,
        expr: None,
        diagnostics: Diagnostics::new(),
    };
    for expr in grammar.expressions.values() {
        checker.expr = Some(expr.name);
        checker.visit_branches(&expr.body);
    }
    checker.diagnostics
}

/// Tokens that may continue an earlier element of the sequence.
struct Pending {
    tokens: TokenSet,
    /// Contributed by a choice point of this sequence, which sees what
    /// follows it and can leave fallback tokens to the following element.
    direct: bool,
    range: TextRange,
}

struct ConflictChecker<'a> {
    grammar: &'a Grammar,
    analysis: &'a Analysis,
    fallbacks: &'a FallbackMap,
    expr: Option<Symbol>,
    diagnostics: Diagnostics,
}

impl ConflictChecker<'_> {
    fn expr_name(&self) -> &str {
        self.expr.map_or("", |e| self.grammar.name(e))
    }

    fn on(&self, tokens: &TokenSet) -> String {
        format!("{} in `{}`", self.grammar.describe_tokens(tokens), self.expr_name())
    }

    fn check_alternatives(&mut self, branches: &Branches) {
        let mut seen: Vec<(TokenSet, TextRange)> = Vec::new();
        let mut nullable: Option<TextRange> = None;

        for seq in &branches.alternatives {
            let first = self.analysis.first_of_elements(&seq.elements);

            let mut overlap = TokenSet::new();
            let mut earlier = None;
            for (tokens, range) in &seen {
                let common = first.tokens.intersection(tokens);
                if !common.is_empty() {
                    overlap.union_with(&common);
                    earlier.get_or_insert(*range);
                }
            }
            if let Some(earlier) = earlier {
                let detail = self.on(&overlap);
                self.diagnostics
                    .report(DiagnosticKind::FirstFirstConflict, seq.range)
                    .message(detail)
                    .related_to("an earlier alternative starts the same way", earlier)
                    .emit();
            }

            if first.epsilon {
                match nullable {
                    Some(earlier) => {
                        let detail = format!("empty input in `{}`", self.expr_name());
                        self.diagnostics
                            .report(DiagnosticKind::FirstFirstConflict, seq.range)
                            .message(detail)
                            .related_to("an earlier alternative may also match nothing", earlier)
                            .emit();
                    }
                    None => nullable = Some(seq.range),
                }
            }

            seen.push((first.tokens, seq.range));
        }
    }

    fn check_sequence(&mut self, seq: &Sequence) {
        let mut pending: Vec<Pending> = Vec::new();

        for element in &seq.elements {
            let Element::Term(term) = element else {
                continue;
            };
            let first = self.analysis.first_of_term(term);

            let mut conflict = TokenSet::new();
            let mut origin = None;
            for p in &pending {
                let mut clash = first.tokens.intersection(&p.tokens);
                if !p.direct {
                    for token in p.tokens.iter() {
                        clash.union_with(&first.tokens.intersection(&self.fallbacks.descendants(token)));
                    }
                }
                if !clash.is_empty() {
                    conflict.union_with(&clash);
                    origin.get_or_insert(p.range);
                }
            }
            if let Some(origin) = origin {
                let detail = self.on(&conflict);
                self.diagnostics
                    .report(DiagnosticKind::FirstFollowConflict, term.range())
                    .message(detail)
                    .related_to("the part before may continue with the same token", origin)
                    .emit();
            }

            let da = self.analysis.disallowed_of_term(term);
            if !da.epsilon {
                pending.clear();
            }
            pending.extend(self.contributions(term, &da.tokens));
        }
    }

    /// Splits `da(term)` into what a choice point of `term` itself decides
    /// and what is decided further down.
    fn contributions(&self, term: &Term, da: &TokenSet) -> Vec<Pending> {
        let range = term.range();
        let pending = |tokens: TokenSet, direct: bool| Pending {
            tokens,
            direct,
            range,
        };
        match term {
            Term::Multiplier(m) if m.max != Some(m.min) => vec![
                pending(self.analysis.disallowed_of_branches(&m.inner).tokens, false),
                pending(self.analysis.first_of_branches(&m.inner).tokens, true),
            ],
            Term::Group(g)
                if g.inner.alternatives.len() > 1
                    && g.inner
                        .alternatives
                        .iter()
                        .any(|alt| self.analysis.first_of_elements(&alt.elements).epsilon) =>
            {
                let mut nested = TokenSet::new();
                for alt in &g.inner.alternatives {
                    nested.union_with(&self.analysis.disallowed_of_elements(&alt.elements).tokens);
                }
                vec![
                    pending(nested, false),
                    pending(self.analysis.first_of_branches(&g.inner).tokens, true),
                ]
            }
            _ => vec![pending(da.clone(), false)],
        }
    }
}

impl Visitor for ConflictChecker<'_> {
    fn visit_branches(&mut self, branches: &Branches) {
        self.check_alternatives(branches);
        walk_branches(self, branches);
    }

    fn visit_sequence(&mut self, seq: &Sequence) {
        self.check_sequence(seq);
        walk_sequence(self, seq);
    }

    fn visit_multiplier(&mut self, multiplier: &Multiplier) {
        if multiplier.can_iterate_again() {
            let first = self.analysis.first_of_branches(&multiplier.inner);
            let da = self.analysis.disallowed_of_branches(&multiplier.inner);
            let overlap = first.tokens.intersection(&da.tokens);
            if !overlap.is_empty() {
                let detail = self.on(&overlap);
                self.diagnostics
                    .report(DiagnosticKind::LoopConflict, multiplier.range)
                    .message(detail)
                    .emit();
            }
        }
        walk_multiplier(self, multiplier);
    }
}
