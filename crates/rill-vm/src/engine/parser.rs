//! Resumable driver for a call-plan.
//!
//! The parser owns a stack of frames, a value stack split into per-frame
//! windows and a stack of recovery markers. [`Parser::feed`] hands it one
//! token; states run until a state needs a token that is not buffered
//! (the parser suspends), the root returns, or the parse fails.

use rill_plan::{FnId, ParserPlan, SlotId, SnippetId, StateId, Step, TokenId, TokenSet, TypeId};

use super::error::{RuntimeError, SemanticError};
use super::frame::{Frame, Marker, Returned, Slot, Token};
use super::semantics::{ActionContext, Semantics, SyntaxErrorReport};
use super::trace::{NoopTracer, Tracer};

/// Outcome of one [`Parser::feed`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    /// The token was taken; feed the next one.
    Ok,
    /// The root expression finished. Its value is in [`Parser::take_output`].
    Done,
    /// Unrecoverable syntax error.
    SyntaxError,
    /// A snippet failed.
    SemanticError,
}

/// Resource limits.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    /// Maximum number of frames, and of active recovery markers.
    pub(crate) stack_depth: usize,
    /// Maximum number of value slots across all frames.
    pub(crate) semval_depth: usize,
    /// Maximum states executed per fed token (default: 1,000,000).
    pub(crate) exec_fuel: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            stack_depth: 256,
            semval_depth: 4096,
            exec_fuel: 1_000_000,
        }
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack_depth(mut self, depth: usize) -> Self {
        self.stack_depth = depth;
        self
    }

    pub fn semval_depth(mut self, depth: usize) -> Self {
        self.semval_depth = depth;
        self
    }

    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = fuel;
        self
    }

    pub fn get_stack_depth(&self) -> usize {
        self.stack_depth
    }

    pub fn get_semval_depth(&self) -> usize {
        self.semval_depth
    }

    pub fn get_exec_fuel(&self) -> u32 {
        self.exec_fuel
    }
}

/// Builder for [`Parser`] instances.
pub struct ParserBuilder<'p> {
    plan: &'p ParserPlan,
    root: FnId,
    limits: Limits,
}

impl<'p> ParserBuilder<'p> {
    pub fn new(plan: &'p ParserPlan, root: FnId) -> Self {
        Self {
            plan,
            root,
            limits: Limits::default(),
        }
    }

    /// Builder for the root named `name`, if the plan has one.
    pub fn for_root(plan: &'p ParserPlan, name: &str) -> Option<Self> {
        plan.root(name).map(|root| Self::new(plan, root.function))
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn stack_depth(mut self, depth: usize) -> Self {
        self.limits = self.limits.stack_depth(depth);
        self
    }

    pub fn semval_depth(mut self, depth: usize) -> Self {
        self.limits = self.limits.semval_depth(depth);
        self
    }

    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.limits = self.limits.exec_fuel(fuel);
        self
    }

    pub fn build<S: Semantics>(self, semantics: S) -> Parser<'p, S> {
        self.build_traced(semantics, NoopTracer)
    }

    pub fn build_traced<S: Semantics, T: Tracer>(self, semantics: S, tracer: T) -> Parser<'p, S, T> {
        Parser {
            plan: self.plan,
            root: self.root,
            limits: self.limits,
            semantics,
            tracer,
            frames: Vec::new(),
            slots: Vec::new(),
            counters: Vec::new(),
            markers: Vec::new(),
            lookahead: None,
            returned: None,
            last_loc: None,
            output: None,
            started: false,
            phase: Phase::Running,
            semantic_error: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Running,
    Finished,
}

/// What the driver loop does after a state.
enum Flow {
    Continue,
    NeedToken,
    Finish(Status),
}

type Loc<S> = <S as Semantics>::Loc;
type Value<S> = <S as Semantics>::Value;

/// A push parser for one root expression of a plan.
pub struct Parser<'p, S: Semantics, T: Tracer = NoopTracer> {
    plan: &'p ParserPlan,
    root: FnId,
    limits: Limits,
    semantics: S,
    tracer: T,
    frames: Vec<Frame<Loc<S>>>,
    slots: Vec<Slot<Value<S>, Loc<S>>>,
    counters: Vec<u32>,
    markers: Vec<Marker>,
    lookahead: Option<Token<Value<S>, Loc<S>>>,
    returned: Option<Returned<Value<S>, Loc<S>>>,
    /// Location of the last consumed token.
    last_loc: Option<Loc<S>>,
    output: Option<Returned<Value<S>, Loc<S>>>,
    started: bool,
    phase: Phase,
    semantic_error: Option<SemanticError>,
}

impl<'p> Parser<'p, Unbuilt> {
    /// Starts building a parser for `root`; semantics are given to
    /// [`ParserBuilder::build`].
    pub fn builder(plan: &'p ParserPlan, root: FnId) -> ParserBuilder<'p> {
        ParserBuilder::new(plan, root)
    }
}

/// Semantics of a parser that does not exist yet; only anchors
/// [`Parser::builder`].
#[doc(hidden)]
pub enum Unbuilt {}

impl Semantics for Unbuilt {
    type Value = ();
    type Loc = ();

    fn run(&mut self, _action: ActionContext<'_, (), ()>) -> Result<Option<()>, SemanticError> {
        match *self {}
    }

    fn destroy(&mut self, _ty: Option<TypeId>, _value: ()) {
        match *self {}
    }
}

impl<'p, S: Semantics, T: Tracer> Parser<'p, S, T> {
    pub fn plan(&self) -> &'p ParserPlan {
        self.plan
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn semantics(&self) -> &S {
        &self.semantics
    }

    pub fn semantics_mut(&mut self) -> &mut S {
        &mut self.semantics
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Whether the parser stopped; further tokens are refused until
    /// [`reset`](Self::reset).
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// The error of the snippet that ended the parse, if any.
    pub fn last_semantic_error(&self) -> Option<&SemanticError> {
        self.semantic_error.as_ref()
    }

    /// Pushes one token. The parser owns `value` from here on: it is moved
    /// into a slot, into a snippet, or released through
    /// [`Semantics::destroy`].
    pub fn feed(
        &mut self,
        kind: TokenId,
        value: Option<Value<S>>,
        loc: Loc<S>,
    ) -> Result<Status, RuntimeError> {
        let plan = self.plan;
        let Some(token) = plan.tokens.get(kind.index()) else {
            if let Some(value) = value {
                self.semantics.destroy(None, value);
            }
            return Err(RuntimeError::UnknownToken(kind));
        };
        if self.phase == Phase::Finished {
            if let Some(value) = value {
                self.semantics.destroy(token.ty, value);
            }
            return Err(RuntimeError::ParserFinished);
        }

        self.tracer.trace_token(kind);
        if !self.started {
            self.started = true;
            if let Err(error) = self.push_frame(self.root, TokenSet::new()) {
                if let Some(value) = value {
                    self.semantics.destroy(token.ty, value);
                }
                return Err(error);
            }
        }
        self.lookahead = Some(Token { kind, value, loc });
        self.run()
    }

    /// Moves the root's value out. `None` before [`Status::Done`], after a
    /// previous call, or when the root produced no value.
    pub fn take_output(&mut self) -> Option<Value<S>> {
        self.output.as_mut().and_then(|out| out.value.take())
    }

    /// Location of the root expression once done.
    pub fn output_loc(&self) -> Option<&Loc<S>> {
        self.output.as_ref().map(|out| &out.loc)
    }

    /// Releases every value the parser still owns, the unclaimed result
    /// included, and makes it ready for a new parse.
    pub fn reset(&mut self) {
        self.unwind();
        if let Some(out) = self.output.take()
            && let Some(value) = out.value
        {
            self.semantics.destroy(out.ty, value);
        }
        self.last_loc = None;
        self.started = false;
        self.phase = Phase::Running;
        self.semantic_error = None;
    }

    fn run(&mut self) -> Result<Status, RuntimeError> {
        let mut fuel = self.limits.exec_fuel;
        loop {
            if fuel == 0 {
                return Err(self.fail(RuntimeError::ExecFuelExhausted));
            }
            fuel -= 1;

            match self.step()? {
                Flow::Continue => {}
                Flow::NeedToken => return Ok(Status::Ok),
                Flow::Finish(status) => return Ok(status),
            }
        }
    }

    fn step(&mut self) -> Result<Flow, RuntimeError> {
        let plan = self.plan;
        let Some(frame) = self.frames.last() else {
            return Ok(self.halt(Status::SyntaxError));
        };
        let function = frame.function;
        let state = frame.state;
        let step = plan.function(function).state(state);
        self.tracer.trace_step(function, state, step);

        match step {
            Step::Match { accept, bind, next } => {
                let Some(kind) = self.lookahead_kind() else {
                    return Ok(Flow::NeedToken);
                };
                if !accept.contains(kind) {
                    return Ok(self.syntax_error(accept));
                }
                self.consume(*bind);
                self.goto(*next);
            }
            Step::Call { callee, ret } => {
                self.goto(*ret);
                let follow = self.top().follow.clone();
                self.push_frame(*callee, follow)?;
                self.tracer.trace_call(*callee);
            }
            Step::Resume { bind, next } => {
                self.resume(*bind);
                self.goto(*next);
            }
            Step::Action {
                snippet,
                values,
                locations,
                output,
                next,
            } => {
                if let Err(error) = self.action(*snippet, values, locations, *output) {
                    self.tracer.trace_semantic_error(&error);
                    self.semantic_error = Some(error);
                    return Ok(self.halt(Status::SemanticError));
                }
                self.goto(*next);
            }
            Step::Dispatch { arms, default } => {
                let Some(kind) = self.lookahead_kind() else {
                    return Ok(Flow::NeedToken);
                };
                if let Some(arm) = arms.iter().find(|arm| arm.accept.contains(kind)) {
                    self.goto(arm.target);
                    return Ok(Flow::Continue);
                }
                let mut all = TokenSet::new();
                for arm in arms {
                    all.union_with(&arm.accept);
                }
                match default {
                    Some(target) => {
                        self.top_mut().follow.union_with(&all);
                        self.goto(*target);
                    }
                    None => return Ok(self.syntax_error(&all)),
                }
            }
            Step::LoopHead { counter, next } => {
                let index = self.top().counter_base + counter.index();
                self.counters[index] = 0;
                self.goto(*next);
            }
            Step::LoopTest {
                counter,
                min,
                max,
                iterate,
                body,
                exit,
            } => {
                let counter = counter.map(|c| self.top().counter_base + c.index());
                let count = counter.map_or(0, |i| self.counters[i]);
                if max.is_some_and(|max| count >= max) {
                    self.goto(*exit);
                    return Ok(Flow::Continue);
                }
                if count >= *min {
                    let Some(kind) = self.lookahead_kind() else {
                        return Ok(Flow::NeedToken);
                    };
                    if !iterate.contains(kind) {
                        self.top_mut().follow.union_with(iterate);
                        self.goto(*exit);
                        return Ok(Flow::Continue);
                    }
                }
                if let Some(i) = counter {
                    self.counters[i] += 1;
                }
                self.goto(*body);
            }
            Step::RecoveryEnter { recovery, next } => {
                if self.markers.len() >= self.limits.stack_depth {
                    return Err(self.fail(RuntimeError::StackOverflow));
                }
                self.markers.push(Marker {
                    recovery: *recovery,
                    frame: self.frames.len() - 1,
                });
                self.goto(*next);
            }
            Step::RecoveryExit { next, .. } => {
                self.markers.pop();
                self.goto(*next);
            }
            Step::Sync { sentinel, next, .. } => {
                let Some(kind) = self.lookahead_kind() else {
                    return Ok(Flow::NeedToken);
                };
                if sentinel.contains(kind) {
                    self.goto(*next);
                } else if plan.end_token == Some(kind) {
                    self.report(sentinel);
                    return Ok(self.halt(Status::SyntaxError));
                } else {
                    self.tracer.trace_discard(kind);
                    self.release_lookahead();
                    return Ok(Flow::NeedToken);
                }
            }
            Step::Return => return Ok(self.return_from()),
        }
        Ok(Flow::Continue)
    }

    fn top(&self) -> &Frame<Loc<S>> {
        let last = self.frames.len() - 1;
        &self.frames[last]
    }

    fn top_mut(&mut self) -> &mut Frame<Loc<S>> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn goto(&mut self, state: StateId) {
        self.top_mut().state = state;
    }

    fn lookahead_kind(&self) -> Option<TokenId> {
        self.lookahead.as_ref().map(|token| token.kind)
    }

    fn token_type(&self, kind: TokenId) -> Option<TypeId> {
        self.plan.tokens.get(kind.index()).and_then(|t| t.ty)
    }

    fn slot_type(&self, function: FnId, slot: usize) -> Option<TypeId> {
        self.plan.function(function).slots[slot].ty
    }

    /// Releases the value in slot `index`, if any.
    fn release(&mut self, index: usize, ty: Option<TypeId>) {
        if let Some(value) = self.slots[index].value.take() {
            self.semantics.destroy(ty, value);
        }
    }

    /// Stores `value` in slot `index`, releasing the previous occupant.
    fn store(&mut self, index: usize, ty: Option<TypeId>, value: Option<Value<S>>) {
        self.release(index, ty);
        self.slots[index].value = value;
    }

    fn release_lookahead(&mut self) {
        if let Some(token) = self.lookahead.take()
            && let Some(value) = token.value
        {
            let ty = self.token_type(token.kind);
            self.semantics.destroy(ty, value);
        }
    }

    /// Location of everything `frame` consumed so far.
    fn frame_loc(semantics: &mut S, frame: &Frame<Loc<S>>, previous: Option<&Loc<S>>) -> Loc<S> {
        match (&frame.first, &frame.last) {
            (Some(first), Some(last)) => semantics.span(first, last),
            _ => semantics.zero_loc(previous),
        }
    }

    fn push_frame(&mut self, function: FnId, follow: TokenSet) -> Result<(), RuntimeError> {
        let plan = self.plan;
        let callee = plan.function(function);
        if self.frames.len() >= self.limits.stack_depth
            || self.slots.len() + callee.slots.len() > self.limits.semval_depth
        {
            return Err(self.fail(RuntimeError::StackOverflow));
        }

        let base = self.slots.len();
        let counter_base = self.counters.len();
        self.slots.resize_with(base + callee.slots.len(), Slot::default);
        self.counters.resize(counter_base + callee.counters as usize, 0);
        self.frames
            .push(Frame::new(function, base, counter_base, follow));
        Ok(())
    }

    /// Releases a popped frame's live slots, last first, and its windows.
    fn drop_frame(&mut self, frame: &Frame<Loc<S>>) {
        let count = self.plan.function(frame.function).slots.len();
        for slot in (0..count).rev() {
            let ty = self.slot_type(frame.function, slot);
            self.release(frame.base + slot, ty);
        }
        self.slots.truncate(frame.base);
        self.counters.truncate(frame.counter_base);
    }

    /// Moves the lookahead into `bind` of the current frame, or releases it.
    fn consume(&mut self, bind: Option<SlotId>) {
        let Some(token) = self.lookahead.take() else {
            return;
        };
        self.tracer.trace_consume(token.kind);

        let frame = self.top_mut();
        frame.extend(&token.loc, &token.loc);
        frame.follow = TokenSet::new();
        let (function, base) = (frame.function, frame.base);
        self.last_loc = Some(token.loc.clone());

        match bind {
            Some(slot) => {
                let ty = self.slot_type(function, slot.index());
                let index = base + slot.index();
                self.store(index, ty, token.value);
                self.slots[index].loc = Some(token.loc);
            }
            None => {
                if let Some(value) = token.value {
                    let ty = self.token_type(token.kind);
                    self.semantics.destroy(ty, value);
                }
            }
        }
    }

    /// Stores the value of the callee that just returned, or releases it.
    fn resume(&mut self, bind: Option<SlotId>) {
        let Some(returned) = self.returned.take() else {
            return;
        };
        match bind {
            Some(slot) => {
                let frame = self.top();
                let (function, base) = (frame.function, frame.base);
                let ty = self.slot_type(function, slot.index());
                let index = base + slot.index();
                self.store(index, ty, returned.value);
                self.slots[index].loc = Some(returned.loc);
            }
            None => {
                if let Some(value) = returned.value {
                    self.semantics.destroy(returned.ty, value);
                }
            }
        }
    }

    fn action(
        &mut self,
        snippet: SnippetId,
        values: &[SlotId],
        locations: &[SlotId],
        output: Option<SlotId>,
    ) -> Result<(), SemanticError> {
        let plan = self.plan;
        let info = plan.snippet(snippet);
        let last = self.frames.len() - 1;
        let (function_id, base) = (self.frames[last].function, self.frames[last].base);
        let function = plan.function(function_id);
        self.tracer.trace_action(snippet);

        let values = values
            .iter()
            .map(|&slot| (slot, self.slots[base + slot.index()].value.take()))
            .collect();
        let mut locs = Vec::with_capacity(locations.len());
        for &slot in locations {
            let loc = if slot == SlotId::OUTPUT {
                Self::frame_loc(&mut self.semantics, &self.frames[last], self.last_loc.as_ref())
            } else {
                self.slots[base + slot.index()].loc.clone().unwrap_or_default()
            };
            locs.push((slot, loc));
        }
        let error = if info.recovery {
            self.lookahead_kind()
        } else {
            None
        };

        let result = self.semantics.run(ActionContext {
            snippet,
            info,
            function,
            values,
            locations: locs,
            error,
        })?;

        match output {
            Some(slot) => {
                let index = base + slot.index();
                self.store(index, function.slot(slot).ty, result);
                if slot != SlotId::OUTPUT {
                    self.slots[index].loc = Some(self.semantics.zero_loc(self.last_loc.as_ref()));
                }
            }
            None => {
                if let Some(value) = result {
                    self.semantics.destroy(None, value);
                }
            }
        }
        Ok(())
    }

    /// Hands `$$` to the caller, or finishes the parse at the root.
    fn return_from(&mut self) -> Flow {
        let plan = self.plan;
        let Some(frame) = self.frames.pop() else {
            return self.halt(Status::SyntaxError);
        };
        self.tracer.trace_return(frame.function);

        let ty = plan.function(frame.function).ty;
        let value = self.slots[frame.base].value.take();
        let loc = Self::frame_loc(&mut self.semantics, &frame, self.last_loc.as_ref());
        self.drop_frame(&frame);

        let returned = Returned { value, ty, loc };
        let Some(caller) = self.frames.last_mut() else {
            self.output = Some(returned);
            self.release_lookahead();
            self.phase = Phase::Finished;
            return Flow::Finish(Status::Done);
        };
        caller.follow = frame.follow;
        if let (Some(first), Some(last)) = (&frame.first, &frame.last) {
            caller.extend(first, last);
        }
        self.returned = Some(returned);
        Flow::Continue
    }

    /// Reports the lookahead as unexpected, then recovers or halts.
    fn syntax_error(&mut self, accept: &TokenSet) -> Flow {
        let mut expected = accept.clone();
        if let Some(frame) = self.frames.last() {
            expected.union_with(&frame.follow);
        }
        self.report(&expected);

        match self.markers.pop() {
            Some(marker) => {
                self.recover(marker);
                Flow::Continue
            }
            None => self.halt(Status::SyntaxError),
        }
    }

    fn report(&mut self, expected: &TokenSet) {
        let Some(token) = &self.lookahead else {
            return;
        };
        self.tracer.trace_syntax_error(token.kind, expected);
        self.semantics.syntax_error(SyntaxErrorReport {
            plan: self.plan,
            token: token.kind,
            value: token.value.as_ref(),
            loc: &token.loc,
            expected,
        });
    }

    /// Unwinds to the marker's frame and jumps to the handler. The offending
    /// token stays as lookahead.
    fn recover(&mut self, marker: Marker) {
        let plan = self.plan;
        let info = plan.recovery(marker.recovery);
        self.tracer.trace_recover(marker.recovery);

        while self.frames.len() > marker.frame + 1 {
            if let Some(frame) = self.frames.pop() {
                self.drop_frame(&frame);
            }
        }
        let frame = self.top_mut();
        frame.follow = TokenSet::new();
        frame.state = info.handler;
        let (function, base) = (frame.function, frame.base);
        for slot in info.scoped_slots.iter().rev() {
            let ty = self.slot_type(function, slot.index());
            self.release(base + slot.index(), ty);
        }
    }

    /// Releases frames, pending values and the lookahead.
    fn unwind(&mut self) {
        while let Some(frame) = self.frames.pop() {
            self.drop_frame(&frame);
        }
        if let Some(returned) = self.returned.take()
            && let Some(value) = returned.value
        {
            self.semantics.destroy(returned.ty, value);
        }
        self.markers.clear();
        self.release_lookahead();
    }

    fn halt(&mut self, status: Status) -> Flow {
        self.unwind();
        self.phase = Phase::Finished;
        Flow::Finish(status)
    }

    fn fail(&mut self, error: RuntimeError) -> RuntimeError {
        self.unwind();
        self.phase = Phase::Finished;
        error
    }
}

impl<S: Semantics, T: Tracer> Drop for Parser<'_, S, T> {
    fn drop(&mut self) {
        self.reset();
    }
}
