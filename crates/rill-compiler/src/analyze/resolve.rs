//! Name resolution and declaration checks.

use indexmap::IndexSet;
use rill_core::Symbol;
use rowan::TextRange;

use crate::config::Config;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::visit::{Visitor, walk_sequence};
use crate::ir::{Definition, Element, Grammar, Reference, Sequence, Term};

/// Checks that every name, type tag and root is declared, that recovery
/// blocks are followed by a token, and warns about unused tokens.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve(grammar: &Grammar, config: &Config) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    if grammar.expressions.is_empty() {
        diagnostics
            .report(DiagnosticKind::NoExpressions, TextRange::default())
            .emit();
    }

    check_types(grammar, &mut diagnostics);
    check_roots(grammar, &mut diagnostics);

    let mut resolver = Resolver {
        grammar,
        used: IndexSet::new(),
        diagnostics: &mut diagnostics,
    };
    for expr in grammar.expressions.values() {
        resolver.visit_branches(&expr.body);
    }
    let used = resolver.used;

    check_unused(grammar, config, &used, &mut diagnostics);
    diagnostics
}

fn check_types(grammar: &Grammar, diagnostics: &mut Diagnostics) {
    let declared = grammar
        .tokens
        .values()
        .map(|t| (t.ty, t.range))
        .chain(grammar.expressions.values().map(|e| (e.ty, e.range)));
    for (ty, range) in declared {
        if let Some(ty) = ty
            && !grammar.types.contains_key(&ty)
        {
            diagnostics
                .report(DiagnosticKind::UnknownType, range)
                .message(grammar.name(ty))
                .emit();
        }
    }
}

fn check_roots(grammar: &Grammar, diagnostics: &mut Diagnostics) {
    let mut root_type: Option<(Option<Symbol>, TextRange)> = None;
    for root in &grammar.roots {
        let Some(expr) = grammar.expression(root.name) else {
            diagnostics
                .report(DiagnosticKind::UnknownRoot, root.range)
                .message(grammar.name(root.name))
                .emit();
            continue;
        };
        match root_type {
            None => root_type = Some((expr.ty, root.range)),
            Some((ty, first)) if ty != expr.ty => {
                diagnostics
                    .report(DiagnosticKind::RootTypeMismatch, root.range)
                    .message(grammar.name(root.name))
                    .related_to("first root declared here", first)
                    .emit();
            }
            Some(_) => {}
        }
    }
}

fn check_unused(grammar: &Grammar, config: &Config, used: &IndexSet<Symbol>, diagnostics: &mut Diagnostics) {
    let in_fallback = |name: Symbol| {
        grammar
            .fallbacks
            .iter()
            .any(|f| f.to == name || f.from.contains(&name))
    };
    for (index, token) in grammar.tokens.values().enumerate() {
        let is_eof = config.eof_token.is_some_and(|t| t.index() == index);
        if token.implicit || is_eof || used.contains(&token.name) || in_fallback(token.name) {
            continue;
        }
        diagnostics
            .report(DiagnosticKind::UnusedToken, token.range)
            .message(grammar.name(token.name))
            .emit();
    }
}

struct Resolver<'a> {
    grammar: &'a Grammar,
    used: IndexSet<Symbol>,
    diagnostics: &'a mut Diagnostics,
}

impl Resolver<'_> {
    fn is_token(&self, reference: &Reference) -> bool {
        matches!(
            self.grammar.lookup(reference.name),
            Some(Definition::Token(..))
        )
    }

    /// A recovery block resumes at the first token reference after it;
    /// only snippets may sit in between.
    fn check_sentinels(&mut self, seq: &Sequence) {
        for (i, element) in seq.elements.iter().enumerate() {
            let Element::Term(Term::Recovery(recovery)) = element else {
                continue;
            };
            let next = seq.elements[i + 1..].iter().find_map(|e| match e {
                Element::Term(t) => Some(t),
                Element::Snippet(_) => None,
            });
            let ok = matches!(next, Some(Term::Reference(r)) if self.is_token(r));
            if !ok {
                self.diagnostics
                    .report(DiagnosticKind::RecoveryWithoutSentinel, recovery.range)
                    .emit();
            }
        }
    }
}

impl Visitor for Resolver<'_> {
    fn visit_sequence(&mut self, seq: &Sequence) {
        self.check_sentinels(seq);
        walk_sequence(self, seq);
    }

    fn visit_reference(&mut self, reference: &Reference) {
        self.used.insert(reference.name);
        if self.grammar.lookup(reference.name).is_none() {
            self.diagnostics
                .report(DiagnosticKind::UndefinedReference, reference.range)
                .message(self.grammar.name(reference.name))
                .emit();
        }
    }
}
