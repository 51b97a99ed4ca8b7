//! Lookahead sets: a token set plus the ε marker.

use rill_plan::{TokenId, TokenSet};

#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct LookaheadSet {
    pub tokens: TokenSet,
    pub epsilon: bool,
}

impl LookaheadSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epsilon() -> Self {
        Self {
            tokens: TokenSet::new(),
            epsilon: true,
        }
    }

    pub fn token(token: TokenId) -> Self {
        Self {
            tokens: TokenSet::single(token),
            epsilon: false,
        }
    }

    /// Neither tokens nor ε.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && !self.epsilon
    }

    pub fn union_with(&mut self, other: &LookaheadSet) {
        self.tokens.union_with(&other.tokens);
        self.epsilon |= other.epsilon;
    }

    pub fn with_epsilon(mut self, epsilon: bool) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl std::fmt::Debug for LookaheadSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut set = f.debug_set();
        set.entries(self.tokens.iter().map(|t| t.0));
        if self.epsilon {
            set.entry(&format_args!("ε"));
        }
        set.finish()
    }
}
