//! Structural validation of a plan.
//!
//! Emitters and the interpreter index tables without bounds checks of their
//! own, so a plan is verified once before use.

use thiserror::Error;

use crate::{FnId, ParserPlan, Step, TokenSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("function `{function}` has no states")]
    EmptyFunction { function: String },

    #[error("function `{function}` state {state}: target {target} out of range")]
    BadTarget {
        function: String,
        state: usize,
        target: usize,
    },

    #[error("function `{function}` state {state}: {what} {index} out of range")]
    BadIndex {
        function: String,
        state: usize,
        what: &'static str,
        index: usize,
    },

    #[error("function `{function}` state {state}: token {token} is not declared")]
    UnknownToken {
        function: String,
        state: usize,
        token: usize,
    },

    #[error("root `{root}` names function {function}, which does not exist")]
    BadRoot { root: String, function: usize },

    #[error("plan has no roots")]
    NoRoots,
}

impl ParserPlan {
    pub fn verify(&self) -> Result<(), PlanError> {
        if self.roots.is_empty() {
            return Err(PlanError::NoRoots);
        }
        for root in &self.roots {
            if root.function.index() >= self.functions.len() {
                return Err(PlanError::BadRoot {
                    root: root.name.clone(),
                    function: root.function.index(),
                });
            }
        }
        for (i, _) in self.functions.iter().enumerate() {
            self.verify_function(FnId::new(i))?;
        }
        Ok(())
    }

    fn verify_function(&self, id: FnId) -> Result<(), PlanError> {
        let func = self.function(id);
        if func.states.is_empty() {
            return Err(PlanError::EmptyFunction {
                function: func.name.clone(),
            });
        }

        for (state, step) in func.states.iter().enumerate() {
            let bad_index = |what: &'static str, index: usize| PlanError::BadIndex {
                function: func.name.clone(),
                state,
                what,
                index,
            };

            for target in step.successors() {
                if target.index() >= func.states.len() {
                    return Err(PlanError::BadTarget {
                        function: func.name.clone(),
                        state,
                        target: target.index(),
                    });
                }
            }

            let mut slots = Vec::new();
            let mut sets: Vec<&TokenSet> = Vec::new();
            match step {
                Step::Match { accept, bind, .. } => {
                    sets.push(accept);
                    slots.extend(bind.iter().copied());
                }
                Step::Call { callee, .. } => {
                    if callee.index() >= self.functions.len() {
                        return Err(bad_index("function", callee.index()));
                    }
                }
                Step::Resume { bind, .. } => slots.extend(bind.iter().copied()),
                Step::Action {
                    snippet,
                    values,
                    locations,
                    output,
                    ..
                } => {
                    if snippet.index() >= self.snippets.len() {
                        return Err(bad_index("snippet", snippet.index()));
                    }
                    slots.extend(values.iter().chain(locations).chain(output).copied());
                }
                Step::Dispatch { arms, .. } => sets.extend(arms.iter().map(|a| &a.accept)),
                Step::LoopHead { counter, .. } => {
                    if counter.0 >= func.counters {
                        return Err(bad_index("counter", counter.index()));
                    }
                }
                Step::LoopTest {
                    counter, iterate, ..
                } => {
                    if let Some(counter) = counter
                        && counter.0 >= func.counters
                    {
                        return Err(bad_index("counter", counter.index()));
                    }
                    sets.push(iterate);
                }
                Step::RecoveryEnter { recovery, .. } | Step::RecoveryExit { recovery, .. } => {
                    if recovery.index() >= self.recoveries.len() {
                        return Err(bad_index("recovery", recovery.index()));
                    }
                }
                Step::Sync {
                    recovery, sentinel, ..
                } => {
                    if recovery.index() >= self.recoveries.len() {
                        return Err(bad_index("recovery", recovery.index()));
                    }
                    sets.push(sentinel);
                }
                Step::Return => {}
            }

            if let Some(slot) = slots.iter().find(|s| s.index() >= func.slots.len()) {
                return Err(bad_index("slot", slot.index()));
            }
            for set in sets {
                if let Some(token) = set.iter().find(|t| t.index() >= self.tokens.len()) {
                    return Err(PlanError::UnknownToken {
                        function: func.name.clone(),
                        state,
                        token: token.index(),
                    });
                }
            }
        }
        Ok(())
    }
}
