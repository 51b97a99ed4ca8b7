//! Bind-tag scoping and slot layouts.
//!
//! Every expression frame has slot 0 for `$$` and one slot per bind-tag, in
//! order of first appearance. A tag bound by token or expression references
//! takes the referenced type; a tag bound only by snippets takes the
//! expression type.
//!
//! Scoping: a sequence exports what it binds, a group exports what all of
//! its alternatives bind, a repeat exports nothing, and a recovery block
//! exports what both its inner branches and its handlers bind.
//!
//! Reading `$tag` moves the value into the snippet. A read that some path
//! reaches after an earlier read, with no rebinding in between, is warned
//! about.

use indexmap::IndexMap;
use rill_core::Symbol;
use rill_plan::SlotId;
use rowan::TextRange;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::visit::Visitor;
use crate::ir::{Branches, Element, Expression, Grammar, RefKind, Reference, Recovery, Sequence, Snippet, Term};

/// Name of the implicit binding available to recovery snippets.
pub const ERROR_BINDING: &str = "error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// `None` for the output slot.
    pub name: Option<Symbol>,
    pub ty: Option<Symbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotLayout {
    pub slots: Vec<Slot>,
}

impl SlotLayout {
    pub fn slot(&self, tag: Symbol) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| s.name == Some(tag))
            .map(SlotId::new)
    }

    pub fn ty(&self, slot: SlotId) -> Option<Symbol> {
        self.slots.get(slot.index()).and_then(|s| s.ty)
    }

    /// Slot receiving the result of `snippet`, if it produces one.
    pub fn output_of(&self, snippet: &Snippet) -> Option<SlotId> {
        match snippet.bind {
            Some(tag) => self.slot(tag),
            None => snippet.writes_output().then_some(SlotId::OUTPUT),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bindings {
    layouts: IndexMap<Symbol, SlotLayout>,
}

impl Bindings {
    pub fn layout(&self, expr: Symbol) -> Option<&SlotLayout> {
        self.layouts.get(&expr)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn infer(grammar: &Grammar) -> (Bindings, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut layouts = IndexMap::new();

        for expr in grammar.expressions.values() {
            let layout = infer_layout(grammar, expr, &mut diagnostics);
            let mut scope = ScopeChecker {
                grammar,
                layout: &layout,
                diagnostics: &mut diagnostics,
                moved: Vec::new(),
            };
            scope.branches(&expr.body, &[]);
            layouts.insert(expr.name, layout);
        }

        (Bindings { layouts }, diagnostics)
    }
}

#[derive(Default)]
struct TagUse {
    /// Types of referenced symbols bound to the tag, with their ranges.
    refs: Vec<(Option<Symbol>, TextRange)>,
}

struct TagCollector<'g> {
    grammar: &'g Grammar,
    tags: IndexMap<Symbol, TagUse>,
}

impl Visitor for TagCollector<'_> {
    fn visit_reference(&mut self, reference: &Reference) {
        if let Some(tag) = reference.bind {
            let ty = self.grammar.type_of(reference.name);
            self.tags
                .entry(tag)
                .or_default()
                .refs
                .push((ty, reference.range));
        }
    }

    fn visit_snippet(&mut self, snippet: &Snippet) {
        if let Some(tag) = snippet.bind {
            self.tags.entry(tag).or_default();
        }
    }
}

fn infer_layout(grammar: &Grammar, expr: &Expression, diagnostics: &mut Diagnostics) -> SlotLayout {
    let mut collector = TagCollector {
        grammar,
        tags: IndexMap::new(),
    };
    collector.visit_branches(&expr.body);

    let mut slots = vec![Slot {
        name: None,
        ty: expr.ty,
    }];
    for (tag, usage) in collector.tags {
        let ty = match usage.refs.split_first() {
            None => expr.ty,
            Some((&(first, _), rest)) => {
                if let Some(&(_, range)) = rest.iter().find(|(ty, _)| *ty != first) {
                    diagnostics
                        .report(DiagnosticKind::ConflictingSlotType, range)
                        .message(grammar.name(tag))
                        .emit();
                }
                first
            }
        };
        slots.push(Slot { name: Some(tag), ty });
    }
    SlotLayout { slots }
}

struct ScopeChecker<'a> {
    grammar: &'a Grammar,
    layout: &'a SlotLayout,
    diagnostics: &'a mut Diagnostics,
    /// Tags whose value a snippet on some path to here already took.
    moved: Vec<Symbol>,
}

impl ScopeChecker<'_> {
    /// Returns the tags bound on every path through `branches`.
    fn branches(&mut self, branches: &Branches, outer: &[Symbol]) -> Vec<Symbol> {
        let incoming = self.moved.clone();
        let mut moved = incoming.clone();
        let mut common: Option<Vec<Symbol>> = None;
        for seq in &branches.alternatives {
            self.moved.clone_from(&incoming);
            let bound = self.sequence(seq, outer);
            merge(&mut moved, &self.moved);
            common = Some(match common {
                None => bound,
                Some(prev) => prev.into_iter().filter(|t| bound.contains(t)).collect(),
            });
        }
        self.moved = moved;
        common.unwrap_or_default()
    }

    fn rebind(&mut self, tags: &[Symbol]) {
        self.moved.retain(|t| !tags.contains(t));
    }

    fn sequence(&mut self, seq: &Sequence, outer: &[Symbol]) -> Vec<Symbol> {
        let mut scope = outer.to_vec();
        let start = scope.len();

        for element in &seq.elements {
            match element {
                Element::Snippet(snippet) => {
                    self.snippet(snippet, &scope, false);
                    self.rebind(snippet.bind.as_slice());
                    scope.extend(snippet.bind);
                }
                Element::Term(Term::Reference(r)) => {
                    self.rebind(r.bind.as_slice());
                    scope.extend(r.bind);
                }
                Element::Term(Term::Group(g)) => {
                    let bound = self.branches(&g.inner, &scope);
                    self.rebind(&bound);
                    scope.extend(bound);
                }
                Element::Term(Term::Multiplier(m)) => {
                    let skipped = self.moved.clone();
                    self.branches(&m.inner, &scope);
                    merge(&mut self.moved, &skipped);
                }
                Element::Term(Term::Recovery(r)) => {
                    let bound = self.recovery(r, &scope);
                    self.rebind(&bound);
                    scope.extend(bound);
                }
            }
        }

        scope.split_off(start)
    }

    fn recovery(&mut self, recovery: &Recovery, outer: &[Symbol]) -> Vec<Symbol> {
        let inner = self.branches(&recovery.inner, outer);
        let succeeded = self.moved.clone();
        let mut scope = outer.to_vec();
        let mut handled = Vec::new();
        for handler in &recovery.handlers {
            self.snippet(handler, &scope, true);
            if let Some(tag) = handler.bind {
                self.rebind(&[tag]);
                scope.push(tag);
                handled.push(tag);
            }
        }
        merge(&mut self.moved, &succeeded);
        handled.into_iter().filter(|t| inner.contains(t)).collect()
    }

    fn snippet(&mut self, snippet: &Snippet, scope: &[Symbol], recovery: bool) {
        let mut reported: Vec<String> = Vec::new();
        let mut report = |this: &mut Self, kind: DiagnosticKind, name: &str| {
            if reported.iter().any(|r| r == name) {
                return;
            }
            reported.push(name.to_string());
            this.diagnostics
                .report(kind, snippet.range)
                .message(name)
                .emit();
        };

        let mut taken = Vec::new();
        for r in &snippet.refs {
            match (&r.name, r.kind) {
                (None, RefKind::Value) => {
                    let uninferable = self
                        .layout
                        .output_of(snippet)
                        .is_some_and(|slot| self.layout.ty(slot).is_none());
                    if uninferable {
                        report(self, DiagnosticKind::UninferableSlotType, "$$");
                    }
                }
                (None, RefKind::Location) => {}
                (Some(name), _) if recovery && name == ERROR_BINDING => {}
                (Some(name), kind) => {
                    let tag = self.grammar.interner.get(name);
                    let Some(tag) = tag.filter(|t| scope.contains(t)) else {
                        report(self, DiagnosticKind::UnknownBinding, name);
                        continue;
                    };
                    let typed = self
                        .layout
                        .slot(tag)
                        .is_some_and(|slot| self.layout.ty(slot).is_some());
                    if kind == RefKind::Value && !typed {
                        report(self, DiagnosticKind::UninferableSlotType, name);
                    }
                    if kind == RefKind::Value {
                        if self.moved.contains(&tag) {
                            report(self, DiagnosticKind::MovedBinding, name);
                        }
                        taken.push(tag);
                    }
                }
            }
        }
        merge(&mut self.moved, &taken);
    }
}

fn merge(into: &mut Vec<Symbol>, tags: &[Symbol]) {
    for tag in tags {
        if !into.contains(tag) {
            into.push(*tag);
        }
    }
}

/// Tags bound anywhere inside a recovery block's inner branches.
pub fn bound_inside(recovery: &Recovery) -> Vec<Symbol> {
    struct Collector(Vec<Symbol>);
    impl Collector {
        fn add(&mut self, tag: Option<Symbol>) {
            if let Some(tag) = tag
                && !self.0.contains(&tag)
            {
                self.0.push(tag);
            }
        }
    }
    impl Visitor for Collector {
        fn visit_reference(&mut self, reference: &Reference) {
            self.add(reference.bind);
        }
        fn visit_snippet(&mut self, snippet: &Snippet) {
            self.add(snippet.bind);
        }
    }
    let mut collector = Collector(Vec::new());
    collector.visit_branches(&recovery.inner);
    collector.0
}
