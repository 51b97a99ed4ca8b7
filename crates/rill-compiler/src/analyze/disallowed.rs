//! Disallowed-after sets.
//!
//! `da(x)` holds the tokens that may still continue `x` after it could have
//! ended, plus ε when `x` may end without consuming anything. A sequence
//! element whose FIRST meets the running `da` of its predecessors cannot be
//! told apart from their continuation with one token of lookahead.
//!
//! Expression sets are the least fixed point of the equations, iterated from
//! the empty set.

use super::Analysis;
use super::lookahead::LookaheadSet;
use super::Target;
use crate::ir::{Branches, Element, Grammar, Term};

impl Analysis {
    pub(super) fn solve_disallowed(&mut self, grammar: &Grammar) {
        self.disallowed = grammar
            .expressions
            .keys()
            .map(|name| (*name, LookaheadSet::new()))
            .collect();

        let mut rounds = 0usize;
        loop {
            rounds += 1;
            let mut changed = false;
            for expr in grammar.expressions.values() {
                let set = self.disallowed_of_branches(&expr.body);
                if self.disallowed.get(&expr.name) != Some(&set) {
                    self.disallowed.insert(expr.name, set);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        tracing::trace!(rounds, "disallowed-after converged");
    }

    pub fn disallowed_of_branches(&self, branches: &Branches) -> LookaheadSet {
        let mut set = LookaheadSet::new();
        let mut nullable = false;
        for seq in &branches.alternatives {
            set.union_with(&self.disallowed_of_elements(&seq.elements));
            nullable |= self.first_of_elements(&seq.elements).epsilon;
        }
        if nullable {
            set.tokens.union_with(&self.first_of_branches(branches).tokens);
        }
        set
    }

    /// Right fold: elements are added while everything after them may be
    /// skipped.
    pub fn disallowed_of_elements(&self, elements: &[Element]) -> LookaheadSet {
        let mut acc = LookaheadSet::epsilon();
        for element in elements.iter().rev() {
            if !acc.epsilon {
                break;
            }
            let da = match element {
                Element::Term(term) => self.disallowed_of_term(term),
                Element::Snippet(_) => LookaheadSet::epsilon(),
            };
            acc.epsilon = false;
            acc.union_with(&da);
        }
        acc
    }

    pub fn disallowed_of_term(&self, term: &Term) -> LookaheadSet {
        match term {
            Term::Reference(r) => match self.target(r.name) {
                Some(Target::Expression(name)) => {
                    self.disallowed.get(&name).cloned().unwrap_or_default()
                }
                _ => LookaheadSet::new(),
            },
            Term::Group(g) => self.disallowed_of_branches(&g.inner),
            Term::Recovery(r) => self.disallowed_of_branches(&r.inner),
            Term::Multiplier(m) => {
                let mut set = self.disallowed_of_branches(&m.inner);
                if m.max == Some(m.min) {
                    return set;
                }
                set.tokens
                    .union_with(&self.first_of_branches(&m.inner).tokens);
                set.epsilon |= m.min == 0;
                set
            }
        }
    }
}
