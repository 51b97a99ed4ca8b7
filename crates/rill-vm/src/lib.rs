#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reference interpreter for rill call-plans.
//!
//! Runs a [`rill_plan::ParserPlan`] with the same contract as generated
//! parsers: tokens are pushed one at a time, snippets run through a
//! [`Semantics`] implementation, and every value the parser owns is handed
//! back to [`Semantics::destroy`] on abnormal paths.

pub mod engine;

pub use engine::{
    ActionContext, Limits, NoopTracer, Parser, ParserBuilder, PrintTracer, RuntimeError,
    SemanticError, Semantics, Status, SyntaxErrorReport, Tracer,
};
