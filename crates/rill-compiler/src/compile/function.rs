//! State emission for one expression.

use rill_plan::{
    Arm, CounterId, FnId, FnPlan, ParserPlan, RecoveryId, RecoveryInfo, SlotId, SlotInfo,
    SnippetId, SnippetInfo, StateId, Step, TokenSet,
};

use super::PlanContext;
use crate::analyze::bindings::{ERROR_BINDING, bound_inside};
use crate::analyze::{SlotLayout, Target};
use crate::ir::visit::Visitor;
use crate::ir::{
    Branches, Element, Expression, Multiplier, RefKind, Recovery, Reference, Sequence, Snippet,
    Term,
};

/// Successor placeholder; every one is patched before the function is done.
const UNSET: StateId = StateId(u16::MAX);

/// A successor field of an emitted state that still points nowhere.
#[derive(Debug, Clone, Copy)]
enum Hole {
    Next(StateId),
    Default(StateId),
    Arm(StateId, usize),
    Body(StateId),
    Exit(StateId),
}

pub(super) struct FnCompiler<'c, 'a> {
    cx: &'c PlanContext<'a>,
    plan: &'c mut ParserPlan,
    id: FnId,
    layout: &'a SlotLayout,
    states: Vec<Step>,
    holes: Vec<Hole>,
    counters: u16,
}

impl<'c, 'a> FnCompiler<'c, 'a> {
    pub(super) fn new(
        cx: &'c PlanContext<'a>,
        plan: &'c mut ParserPlan,
        id: FnId,
        layout: &'a SlotLayout,
    ) -> Self {
        Self {
            cx,
            plan,
            id,
            layout,
            states: Vec::new(),
            holes: Vec::new(),
            counters: 0,
        }
    }

    pub(super) fn compile(mut self, expr: &Expression) -> FnPlan {
        self.branches(&expr.body, &TokenSet::new());
        self.push(Step::Return);

        let grammar = self.cx.grammar;
        let slots = self
            .layout
            .slots
            .iter()
            .map(|slot| SlotInfo {
                name: slot
                    .name
                    .map_or_else(|| "$$".to_string(), |n| grammar.name(n).to_string()),
                ty: self.cx.type_id(slot.ty),
            })
            .collect();

        FnPlan {
            name: grammar.name(expr.name).to_string(),
            ty: self.cx.type_id(expr.ty),
            slots,
            counters: self.counters,
            states: self.states,
        }
    }

    /// Appends `step`, routing every open hole to it.
    fn push(&mut self, step: Step) -> StateId {
        let id = StateId::new(self.states.len());
        for hole in std::mem::take(&mut self.holes) {
            self.patch(hole, id);
        }
        self.states.push(step);
        id
    }

    fn patch(&mut self, hole: Hole, target: StateId) {
        match hole {
            Hole::Next(at) => match &mut self.states[at.index()] {
                Step::Match { next, .. }
                | Step::Resume { next, .. }
                | Step::Action { next, .. }
                | Step::LoopHead { next, .. }
                | Step::RecoveryEnter { next, .. }
                | Step::RecoveryExit { next, .. }
                | Step::Sync { next, .. } => *next = target,
                _ => {}
            },
            Hole::Default(at) => {
                if let Step::Dispatch { default, .. } = &mut self.states[at.index()] {
                    *default = Some(target);
                }
            }
            Hole::Arm(at, arm) => {
                if let Step::Dispatch { arms, .. } = &mut self.states[at.index()] {
                    arms[arm].target = target;
                }
            }
            Hole::Body(at) => {
                if let Step::LoopTest { body, .. } = &mut self.states[at.index()] {
                    *body = target;
                }
            }
            Hole::Exit(at) => {
                if let Step::LoopTest { exit, .. } = &mut self.states[at.index()] {
                    *exit = target;
                }
            }
        }
    }

    /// Tokens that select `options[0]` over `follow`, fallbacks resolved.
    fn claimed(&self, first: &TokenSet, follow: &TokenSet) -> TokenSet {
        let options = [first.clone(), follow.clone()];
        self.cx
            .fallbacks
            .resolve_choice(&options)
            .swap_remove(0)
    }

    fn branches(&mut self, branches: &Branches, follow: &TokenSet) {
        if let [only] = branches.alternatives.as_slice() {
            self.sequence(only, follow);
            return;
        }

        let analysis = self.cx.analysis;
        let firsts: Vec<_> = branches
            .alternatives
            .iter()
            .map(|alt| analysis.first_of_elements(&alt.elements))
            .collect();
        let default = firsts.iter().position(|f| f.epsilon);

        let mut options: Vec<TokenSet> = firsts.iter().map(|f| f.tokens.clone()).collect();
        if default.is_some() {
            options.push(follow.clone());
        }
        let resolved = self.cx.fallbacks.resolve_choice(&options);

        let mut arms = Vec::new();
        let mut entries = Vec::new();
        for (i, accept) in resolved.into_iter().take(branches.alternatives.len()).enumerate() {
            if Some(i) == default {
                continue;
            }
            entries.push((i, arms.len()));
            arms.push(Arm {
                accept,
                target: UNSET,
            });
        }
        let dispatch = self.push(Step::Dispatch {
            arms,
            default: default.map(|_| UNSET),
        });

        let mut exits = Vec::new();
        for (i, alt) in branches.alternatives.iter().enumerate() {
            let entry = match entries.iter().find(|(alt_index, _)| *alt_index == i) {
                Some(&(_, arm)) => Hole::Arm(dispatch, arm),
                None => Hole::Default(dispatch),
            };
            self.holes = vec![entry];
            self.sequence(alt, follow);
            exits.append(&mut self.holes);
        }
        self.holes = exits;
    }

    fn sequence(&mut self, seq: &Sequence, follow: &TokenSet) {
        let analysis = self.cx.analysis;
        for (i, element) in seq.elements.iter().enumerate() {
            match element {
                Element::Snippet(snippet) => self.snippet(snippet, false),
                Element::Term(term) => {
                    let rest = &seq.elements[i + 1..];
                    let rest_first = analysis.first_of_elements(rest);
                    let mut after = rest_first.tokens;
                    if rest_first.epsilon {
                        after.union_with(follow);
                    }
                    self.term(term, rest, &after);
                }
            }
        }
    }

    fn term(&mut self, term: &Term, rest: &[Element], follow: &TokenSet) {
        match term {
            Term::Reference(r) => self.reference(r),
            Term::Group(g) => self.branches(&g.inner, follow),
            Term::Multiplier(m) => self.multiplier(m, follow),
            Term::Recovery(r) => {
                let sentinel = self.sentinel(rest);
                self.recovery(r, &sentinel, follow);
            }
        }
    }

    fn reference(&mut self, reference: &Reference) {
        let bind = reference.bind.and_then(|tag| self.layout.slot(tag));
        match self.cx.analysis.target(reference.name) {
            Some(Target::Token(token)) => {
                let accept = self.cx.fallbacks.expand(&TokenSet::single(token));
                let id = self.push(Step::Match {
                    accept,
                    bind,
                    next: UNSET,
                });
                self.holes.push(Hole::Next(id));
            }
            Some(Target::Expression(name)) => {
                let Some(&callee) = self.cx.fn_ids.get(&name) else {
                    return;
                };
                let ret = StateId::new(self.states.len() + 1);
                self.push(Step::Call { callee, ret });
                let id = self.push(Step::Resume { bind, next: UNSET });
                self.holes.push(Hole::Next(id));
            }
            None => {}
        }
    }

    fn multiplier(&mut self, multiplier: &Multiplier, follow: &TokenSet) {
        let first = self.cx.analysis.first_of_branches(&multiplier.inner).tokens;
        let iterate = self.claimed(&first, follow);

        if multiplier.is_optional() {
            let gate = self.push(Step::Dispatch {
                arms: vec![Arm {
                    accept: iterate,
                    target: UNSET,
                }],
                default: Some(UNSET),
            });
            self.holes = vec![Hole::Arm(gate, 0)];
            self.branches(&multiplier.inner, follow);
            self.holes.push(Hole::Default(gate));
            return;
        }

        let counter = if multiplier.min == 0 && multiplier.max.is_none() {
            None
        } else {
            let counter = CounterId(self.counters);
            self.counters += 1;
            let head = self.push(Step::LoopHead {
                counter,
                next: UNSET,
            });
            self.holes.push(Hole::Next(head));
            Some(counter)
        };

        let test = self.push(Step::LoopTest {
            counter,
            min: multiplier.min,
            max: multiplier.max,
            iterate,
            body: UNSET,
            exit: UNSET,
        });
        self.holes.push(Hole::Body(test));

        let mut inner_follow = first;
        inner_follow.union_with(follow);
        self.branches(&multiplier.inner, &inner_follow);

        for hole in std::mem::take(&mut self.holes) {
            self.patch(hole, test);
        }
        self.holes.push(Hole::Exit(test));
    }

    /// Tokens the parser resynchronizes on after a recovery block: the token
    /// reference that follows it, with its fallbacks.
    fn sentinel(&self, rest: &[Element]) -> TokenSet {
        let next = rest.iter().find_map(|e| match e {
            Element::Term(t) => Some(t),
            Element::Snippet(_) => None,
        });
        let Some(Term::Reference(r)) = next else {
            return TokenSet::new();
        };
        match self.cx.analysis.target(r.name) {
            Some(Target::Token(token)) => self.cx.fallbacks.expand(&TokenSet::single(token)),
            _ => TokenSet::new(),
        }
    }

    fn recovery(&mut self, recovery: &Recovery, sentinel: &TokenSet, follow: &TokenSet) {
        let id = RecoveryId::new(self.plan.recoveries.len());
        self.plan.recoveries.push(RecoveryInfo {
            function: self.id,
            handler: UNSET,
            sentinel: sentinel.clone(),
            scoped_slots: self.scoped_slots(recovery),
        });

        let enter = self.push(Step::RecoveryEnter {
            recovery: id,
            next: UNSET,
        });
        self.holes.push(Hole::Next(enter));
        self.branches(&recovery.inner, follow);
        let exit = self.push(Step::RecoveryExit {
            recovery: id,
            next: UNSET,
        });

        // The handler path is entered by the runtime, not by a predecessor.
        let handler = StateId::new(self.states.len());
        for snippet in &recovery.handlers {
            self.snippet(snippet, true);
        }
        let sync = self.push(Step::Sync {
            recovery: id,
            sentinel: sentinel.clone(),
            next: UNSET,
        });
        self.plan.recoveries[id.index()].handler = handler;

        self.holes = vec![Hole::Next(exit), Hole::Next(sync)];
    }

    /// Slots written inside the recovered branches, released on unwind.
    fn scoped_slots(&self, recovery: &Recovery) -> Vec<SlotId> {
        let mut slots: Vec<SlotId> = bound_inside(recovery)
            .into_iter()
            .filter_map(|tag| self.layout.slot(tag))
            .collect();
        if writes_output(&recovery.inner) {
            slots.insert(0, SlotId::OUTPUT);
        }
        slots
    }

    fn snippet(&mut self, snippet: &Snippet, recovery: bool) {
        let grammar = self.cx.grammar;
        let interner = &grammar.interner;
        let id = SnippetId::new(self.plan.snippets.len());
        self.plan.snippets.push(SnippetInfo {
            code: snippet.code.clone(),
            bind: snippet.bind.map(|b| interner.resolve(b).to_string()),
            recovery,
            line: snippet.line,
        });

        let mut values: Vec<SlotId> = Vec::new();
        let mut locations: Vec<SlotId> = Vec::new();
        for r in &snippet.refs {
            let slot = match (&r.name, r.kind) {
                (None, RefKind::Value) => continue,
                (None, RefKind::Location) => SlotId::OUTPUT,
                (Some(name), _) if recovery && name == ERROR_BINDING => continue,
                (Some(name), _) => {
                    let Some(slot) = interner.get(name).and_then(|tag| self.layout.slot(tag)) else {
                        continue;
                    };
                    slot
                }
            };
            let list = match r.kind {
                RefKind::Value => &mut values,
                RefKind::Location => &mut locations,
            };
            if !list.contains(&slot) {
                list.push(slot);
            }
        }

        let step = self.push(Step::Action {
            snippet: id,
            values,
            locations,
            output: self.layout.output_of(snippet),
            next: UNSET,
        });
        self.holes.push(Hole::Next(step));
    }
}

/// Whether an unbound snippet inside `branches` writes `$$`.
fn writes_output(branches: &Branches) -> bool {
    struct Finder(bool);
    impl Visitor for Finder {
        fn visit_snippet(&mut self, snippet: &Snippet) {
            self.0 |= snippet.bind.is_none() && snippet.writes_output();
        }
    }
    let mut finder = Finder(false);
    finder.visit_branches(branches);
    finder.0
}
