//! Frames, value slots and recovery markers.

use rill_plan::{FnId, RecoveryId, StateId, TokenId, TokenSet, TypeId};

/// One active expression.
#[derive(Debug)]
pub(crate) struct Frame<L> {
    pub(crate) function: FnId,
    pub(crate) state: StateId,
    /// First slot of the frame's window on the value stack.
    pub(crate) base: usize,
    /// First counter of the frame's window on the counter stack.
    pub(crate) counter_base: usize,
    /// Tokens that nullable decisions would also have accepted since the
    /// last consumption.
    pub(crate) follow: TokenSet,
    pub(crate) first: Option<L>,
    pub(crate) last: Option<L>,
}

impl<L: Clone> Frame<L> {
    pub(crate) fn new(function: FnId, base: usize, counter_base: usize, follow: TokenSet) -> Self {
        Self {
            function,
            state: StateId(0),
            base,
            counter_base,
            follow,
            first: None,
            last: None,
        }
    }

    /// Records consumed input spanning `first..=last`.
    pub(crate) fn extend(&mut self, first: &L, last: &L) {
        if self.first.is_none() {
            self.first = Some(first.clone());
        }
        self.last = Some(last.clone());
    }
}

#[derive(Debug)]
pub(crate) struct Slot<V, L> {
    pub(crate) value: Option<V>,
    pub(crate) loc: Option<L>,
}

impl<V, L> Default for Slot<V, L> {
    fn default() -> Self {
        Self {
            value: None,
            loc: None,
        }
    }
}

/// Active recovery: unwinding stops at `frame`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marker {
    pub(crate) recovery: RecoveryId,
    pub(crate) frame: usize,
}

#[derive(Debug)]
pub(crate) struct Token<V, L> {
    pub(crate) kind: TokenId,
    pub(crate) value: Option<V>,
    pub(crate) loc: L,
}

/// A finished callee's value, waiting for the caller's resume state.
#[derive(Debug)]
pub(crate) struct Returned<V, L> {
    pub(crate) value: Option<V>,
    pub(crate) ty: Option<TypeId>,
    pub(crate) loc: L,
}
