#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Call-plan format for rill parsers.
//!
//! A [`ParserPlan`] is what the generator hands to emitters and to the
//! reference interpreter: per-expression state machines whose state numbers
//! a resumable parser stores in its frames.

mod dump;
mod ids;
mod plan;
mod step;
mod token_set;
mod verify;

#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod verify_tests;

pub use dump::dump;
pub use ids::{CounterId, FnId, RecoveryId, SlotId, SnippetId, StateId, TokenId, TypeId};
pub use plan::{FnPlan, ParserPlan, RecoveryInfo, RootEntry, SlotInfo, SnippetInfo, TokenInfo, TypeInfo};
pub use step::{Arm, Step, StepKind};
pub use token_set::TokenSet;
pub use verify::PlanError;
