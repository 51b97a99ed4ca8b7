//! States of a function's call-plan.

use serde::Serialize;

use crate::{CounterId, FnId, RecoveryId, SlotId, SnippetId, StateId, TokenSet};

/// Action kind of a state, as listed in dumps and emitted comments.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    AwaitToken,
    ConsumeToken,
    Recurse,
    RunSnippet,
    BranchDispatch,
    LoopHead,
    LoopTest,
    RecoveryEnter,
    RecoveryExit,
    Return,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::AwaitToken => "await-token",
            StepKind::ConsumeToken => "consume-token",
            StepKind::Recurse => "recurse",
            StepKind::RunSnippet => "run-snippet",
            StepKind::BranchDispatch => "branch-dispatch",
            StepKind::LoopHead => "loop-head",
            StepKind::LoopTest => "loop-test",
            StepKind::RecoveryEnter => "recovery-enter",
            StepKind::RecoveryExit => "recovery-exit",
            StepKind::Return => "return",
        }
    }
}

/// One arm of a dispatch: tokens that select `target`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Arm {
    pub accept: TokenSet,
    pub target: StateId,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Consume the lookahead if it is in `accept` and move its value to `bind`
    /// (or release it).
    Match {
        accept: TokenSet,
        bind: Option<SlotId>,
        next: StateId,
    },
    /// Push a frame for `callee`; the caller resumes at `ret`.
    Call { callee: FnId, ret: StateId },
    /// Post-return half of a call: store or release the callee's value.
    Resume { bind: Option<SlotId>, next: StateId },
    /// Run a snippet. `values` are moved into it, `locations` are lent.
    Action {
        snippet: SnippetId,
        values: Vec<SlotId>,
        locations: Vec<SlotId>,
        output: Option<SlotId>,
        next: StateId,
    },
    /// Pick an arm by lookahead; without a matching arm take `default`, or fail.
    Dispatch {
        arms: Vec<Arm>,
        default: Option<StateId>,
    },
    /// Reset a repeat counter.
    LoopHead { counter: CounterId, next: StateId },
    /// Repeat guard. Exits at `max`, iterates unconditionally below `min`,
    /// otherwise iterates while the lookahead is in `iterate`. Entering the
    /// body bumps the counter.
    LoopTest {
        counter: Option<CounterId>,
        min: u32,
        max: Option<u32>,
        iterate: TokenSet,
        body: StateId,
        exit: StateId,
    },
    /// Push a recovery marker for this frame.
    RecoveryEnter { recovery: RecoveryId, next: StateId },
    /// Pop the marker pushed by the matching `RecoveryEnter`.
    RecoveryExit { recovery: RecoveryId, next: StateId },
    /// Discard tokens until one in `sentinel` arrives; it stays as lookahead.
    Sync {
        recovery: RecoveryId,
        sentinel: TokenSet,
        next: StateId,
    },
    /// Finish the function and hand `$$` to the caller.
    Return,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Match { .. } => StepKind::ConsumeToken,
            Step::Call { .. } | Step::Resume { .. } => StepKind::Recurse,
            Step::Action { .. } => StepKind::RunSnippet,
            Step::Dispatch { .. } => StepKind::BranchDispatch,
            Step::LoopHead { .. } => StepKind::LoopHead,
            Step::LoopTest { .. } => StepKind::LoopTest,
            Step::RecoveryEnter { .. } => StepKind::RecoveryEnter,
            Step::RecoveryExit { .. } => StepKind::RecoveryExit,
            Step::Sync { .. } => StepKind::AwaitToken,
            Step::Return => StepKind::Return,
        }
    }

    /// Whether executing this state may need the lookahead token.
    pub fn needs_lookahead(&self) -> bool {
        match self {
            Step::Match { .. } | Step::Dispatch { .. } | Step::Sync { .. } => true,
            Step::LoopTest { min, max, .. } => max.is_none_or(|max| *min < max),
            _ => false,
        }
    }

    /// Tokens accepted here, for expected-mask reporting. `None` for states
    /// that never raise a syntax error.
    pub fn expected(&self) -> Option<TokenSet> {
        match self {
            Step::Match { accept, .. } => Some(accept.clone()),
            Step::Dispatch {
                arms,
                default: None,
            } => {
                let mut set = TokenSet::new();
                for arm in arms {
                    set.union_with(&arm.accept);
                }
                Some(set)
            }
            _ => None,
        }
    }

    /// Successor states, in the order they are listed by dumps.
    pub fn successors(&self) -> Vec<StateId> {
        match self {
            Step::Match { next, .. }
            | Step::Resume { next, .. }
            | Step::Action { next, .. }
            | Step::LoopHead { next, .. }
            | Step::RecoveryEnter { next, .. }
            | Step::RecoveryExit { next, .. }
            | Step::Sync { next, .. } => vec![*next],
            Step::Call { ret, .. } => vec![*ret],
            Step::Dispatch { arms, default } => arms
                .iter()
                .map(|a| a.target)
                .chain(default.iter().copied())
                .collect(),
            Step::LoopTest { body, exit, .. } => vec![*body, *exit],
            Step::Return => Vec::new(),
        }
    }
}
