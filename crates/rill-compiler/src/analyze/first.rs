//! FIRST sets.
//!
//! Expression-level sets are computed eagerly by [`FirstSolver`], which
//! follows references depth-first and reports re-entry into an expression
//! still being visited as left recursion. Node-level sets are then derived
//! from the cached expression sets without further recursion.

use indexmap::IndexMap;
use rill_core::Symbol;

use super::lookahead::LookaheadSet;
use super::{Analysis, Target};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::visit::{Visitor, walk_multiplier};
use crate::ir::{Branches, Element, Grammar, Multiplier, Reference, Term};

pub(crate) fn branches_first<F>(branches: &Branches, reference: &mut F) -> LookaheadSet
where
    F: FnMut(&Reference) -> LookaheadSet,
{
    let mut set = LookaheadSet::new();
    for seq in &branches.alternatives {
        set.union_with(&elements_first(&seq.elements, reference));
    }
    set
}

/// Left fold stopping at the first element that cannot match nothing.
pub(crate) fn elements_first<F>(elements: &[Element], reference: &mut F) -> LookaheadSet
where
    F: FnMut(&Reference) -> LookaheadSet,
{
    let mut set = LookaheadSet::new();
    for element in elements {
        let Element::Term(term) = element else {
            continue;
        };
        let first = term_first(term, reference);
        set.tokens.union_with(&first.tokens);
        if !first.epsilon {
            return set;
        }
    }
    set.with_epsilon(true)
}

pub(crate) fn term_first<F>(term: &Term, reference: &mut F) -> LookaheadSet
where
    F: FnMut(&Reference) -> LookaheadSet,
{
    match term {
        Term::Reference(r) => reference(r),
        Term::Group(g) => branches_first(&g.inner, reference),
        Term::Multiplier(m) => {
            let mut set = branches_first(&m.inner, reference);
            set.epsilon |= m.min == 0;
            set
        }
        Term::Recovery(r) => branches_first(&r.inner, reference),
    }
}

pub(super) struct FirstSolver<'g> {
    grammar: &'g Grammar,
    targets: &'g IndexMap<Symbol, Target>,
    cache: IndexMap<Symbol, LookaheadSet>,
    visiting: Vec<Symbol>,
    diagnostics: Diagnostics,
}

impl<'g> FirstSolver<'g> {
    pub(super) fn new(grammar: &'g Grammar, targets: &'g IndexMap<Symbol, Target>) -> Self {
        Self {
            grammar,
            targets,
            cache: IndexMap::new(),
            visiting: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// FIRST of every expression, in declaration order.
    pub(super) fn solve(mut self) -> (IndexMap<Symbol, LookaheadSet>, Diagnostics) {
        for &name in self.grammar.expressions.keys() {
            self.expression(name);
        }
        let first = self
            .grammar
            .expressions
            .keys()
            .map(|name| (*name, self.cache.get(name).cloned().unwrap_or_default()))
            .collect();
        (first, self.diagnostics)
    }

    fn expression(&mut self, name: Symbol) -> LookaheadSet {
        if let Some(set) = self.cache.get(&name) {
            return set.clone();
        }
        if let Some(pos) = self.visiting.iter().position(|&v| v == name) {
            self.report_cycle(pos);
            return LookaheadSet::new();
        }
        let grammar = self.grammar;
        let Some(expr) = grammar.expression(name) else {
            return LookaheadSet::new();
        };

        self.visiting.push(name);
        let set = branches_first(&expr.body, &mut |r| self.reference(r));
        self.visiting.pop();

        self.cache.insert(name, set.clone());
        set
    }

    fn reference(&mut self, reference: &Reference) -> LookaheadSet {
        match self.targets.get(&reference.name) {
            Some(Target::Token(token)) => LookaheadSet::token(*token),
            Some(Target::Expression(name)) => self.expression(*name),
            None => LookaheadSet::new(),
        }
    }

    fn report_cycle(&mut self, start: usize) {
        let cycle = &self.visiting[start..];
        let mut names: Vec<&str> = cycle.iter().map(|&s| self.grammar.name(s)).collect();
        names.push(names[0]);
        let range = self
            .grammar
            .expression(cycle[0])
            .map(|e| e.range)
            .unwrap_or_default();
        self.diagnostics
            .report(DiagnosticKind::LeftRecursion, range)
            .message(names.join(" → "))
            .emit();
    }
}

/// Reports repeats whose body may match nothing.
pub(super) fn check_repeats(grammar: &Grammar, analysis: &Analysis) -> Diagnostics {
    let mut checker = RepeatChecker {
        analysis,
        diagnostics: Diagnostics::new(),
    };
    for expr in grammar.expressions.values() {
        checker.visit_branches(&expr.body);
    }
    checker.diagnostics
}

struct RepeatChecker<'a> {
    analysis: &'a Analysis,
    diagnostics: Diagnostics,
}

impl Visitor for RepeatChecker<'_> {
    fn visit_multiplier(&mut self, multiplier: &Multiplier) {
        let first = self.analysis.first_of_branches(&multiplier.inner);
        if first.epsilon || first.tokens.is_empty() {
            self.diagnostics
                .report(DiagnosticKind::EmptyRepeat, multiplier.range)
                .emit();
        }
        walk_multiplier(self, multiplier);
    }
}
