//! Grammar analysis passes.
//!
//! - `resolve` - declared names, types, roots and recovery sentinels
//! - `fallback` - the token fallback forest and choice resolution
//! - `first` / `disallowed` - FIRST and disallowed-after sets
//! - `bindings` - bind-tag scoping and slot layouts
//! - `conflicts` - LL(1) conflict checks over the computed sets
//!
//! Every pass reports into a [`Diagnostics`] batch; later passes run only
//! when earlier ones left the grammar consistent.

pub mod bindings;
mod conflicts;
mod disallowed;
pub mod fallback;
mod first;
mod lookahead;
pub mod resolve;

#[cfg(test)]
mod conflicts_tests;
#[cfg(test)]
mod fallback_tests;

use indexmap::IndexMap;
use rill_core::Symbol;
use rill_plan::TokenId;

pub use bindings::{Bindings, Slot, SlotLayout};
pub use fallback::FallbackMap;
pub use lookahead::LookaheadSet;
pub use resolve::resolve;

use crate::diagnostics::Diagnostics;
use crate::ir::{Branches, Element, Grammar, Reference, Term};

/// What a referenced name stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Token(TokenId),
    Expression(Symbol),
}

/// FIRST and disallowed-after sets of every expression.
///
/// Node-level queries derive from the per-expression sets and never recurse
/// into other expressions.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    targets: IndexMap<Symbol, Target>,
    first: IndexMap<Symbol, LookaheadSet>,
    disallowed: IndexMap<Symbol, LookaheadSet>,
}

impl Analysis {
    fn new(grammar: &Grammar) -> Self {
        let mut targets = IndexMap::new();
        for (index, name) in grammar.tokens.keys().enumerate() {
            targets.insert(*name, Target::Token(TokenId::new(index)));
        }
        for name in grammar.expressions.keys() {
            targets.insert(*name, Target::Expression(*name));
        }
        Self {
            targets,
            first: IndexMap::new(),
            disallowed: IndexMap::new(),
        }
    }

    pub fn target(&self, name: Symbol) -> Option<Target> {
        self.targets.get(&name).copied()
    }

    pub fn first(&self, expr: Symbol) -> Option<&LookaheadSet> {
        self.first.get(&expr)
    }

    pub fn disallowed(&self, expr: Symbol) -> Option<&LookaheadSet> {
        self.disallowed.get(&expr)
    }

    fn first_of_reference(&self, reference: &Reference) -> LookaheadSet {
        match self.target(reference.name) {
            Some(Target::Token(token)) => LookaheadSet::token(token),
            Some(Target::Expression(name)) => self.first.get(&name).cloned().unwrap_or_default(),
            None => LookaheadSet::new(),
        }
    }

    pub fn first_of_branches(&self, branches: &Branches) -> LookaheadSet {
        first::branches_first(branches, &mut |r| self.first_of_reference(r))
    }

    pub fn first_of_elements(&self, elements: &[Element]) -> LookaheadSet {
        first::elements_first(elements, &mut |r| self.first_of_reference(r))
    }

    pub fn first_of_term(&self, term: &Term) -> LookaheadSet {
        first::term_first(term, &mut |r| self.first_of_reference(r))
    }
}

/// Runs FIRST, the repeat check, disallowed-after and the conflict checker.
#[tracing::instrument(level = "debug", skip_all)]
pub fn analyze(grammar: &Grammar, fallbacks: &FallbackMap) -> (Analysis, Diagnostics) {
    let mut analysis = Analysis::new(grammar);

    let (first, mut diagnostics) = first::FirstSolver::new(grammar, &analysis.targets).solve();
    analysis.first = first;
    if diagnostics.has_errors() {
        return (analysis, diagnostics);
    }

    diagnostics.extend(first::check_repeats(grammar, &analysis));
    if diagnostics.has_errors() {
        return (analysis, diagnostics);
    }

    analysis.solve_disallowed(grammar);
    diagnostics.extend(conflicts::check(grammar, &analysis, fallbacks));

    tracing::debug!(
        expressions = analysis.first.len(),
        errors = diagnostics.error_count(),
        "analyzed"
    );
    (analysis, diagnostics)
}
