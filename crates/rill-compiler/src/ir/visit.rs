//! Visitor over expression bodies.
//!
//! Override `visit_*` to add logic and call the matching `walk_*` to keep
//! descending (or omit it to stop).
//!
//! ```ignore
//! impl Visitor for MyPass {
//!     fn visit_multiplier(&mut self, m: &Multiplier) {
//!         // pre-order
//!         walk_multiplier(self, m);
//!         // post-order
//!     }
//! }
//! ```

use super::{Branches, Element, Group, Multiplier, Recovery, Reference, Sequence, Snippet, Term};

pub trait Visitor: Sized {
    fn visit_branches(&mut self, branches: &Branches) {
        walk_branches(self, branches);
    }

    fn visit_sequence(&mut self, seq: &Sequence) {
        walk_sequence(self, seq);
    }

    fn visit_term(&mut self, term: &Term) {
        walk_term(self, term);
    }

    fn visit_reference(&mut self, _reference: &Reference) {}

    fn visit_group(&mut self, group: &Group) {
        walk_group(self, group);
    }

    fn visit_multiplier(&mut self, multiplier: &Multiplier) {
        walk_multiplier(self, multiplier);
    }

    fn visit_recovery(&mut self, recovery: &Recovery) {
        walk_recovery(self, recovery);
    }

    fn visit_snippet(&mut self, _snippet: &Snippet) {}
}

pub fn walk_branches<V: Visitor>(visitor: &mut V, branches: &Branches) {
    for seq in &branches.alternatives {
        visitor.visit_sequence(seq);
    }
}

pub fn walk_sequence<V: Visitor>(visitor: &mut V, seq: &Sequence) {
    for element in &seq.elements {
        match element {
            Element::Term(term) => visitor.visit_term(term),
            Element::Snippet(snippet) => visitor.visit_snippet(snippet),
        }
    }
}

pub fn walk_term<V: Visitor>(visitor: &mut V, term: &Term) {
    match term {
        Term::Reference(r) => visitor.visit_reference(r),
        Term::Group(g) => visitor.visit_group(g),
        Term::Multiplier(m) => visitor.visit_multiplier(m),
        Term::Recovery(r) => visitor.visit_recovery(r),
    }
}

pub fn walk_group<V: Visitor>(visitor: &mut V, group: &Group) {
    visitor.visit_branches(&group.inner);
}

pub fn walk_multiplier<V: Visitor>(visitor: &mut V, multiplier: &Multiplier) {
    visitor.visit_branches(&multiplier.inner);
}

/// Visits the recovered branches, then the handler snippets.
pub fn walk_recovery<V: Visitor>(visitor: &mut V, recovery: &Recovery) {
    visitor.visit_branches(&recovery.inner);
    for handler in &recovery.handlers {
        visitor.visit_snippet(handler);
    }
}
