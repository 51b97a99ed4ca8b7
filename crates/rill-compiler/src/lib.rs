//! rill compiler: grammar front end, LL(1) analysis and code generation.
//!
//! - `parser` - lexer, CST and typed AST for the grammar DSL
//! - `ir` - grammar IR and the scoped builder that lowering drives
//! - `analyze` - name resolution, FIRST and disallowed-after sets, fallback
//!   tokens, bindings and the conflict checker
//! - `compile` - call-plan construction
//! - `emit` - emitter trait and the C backend
//! - `pipeline` - the staged facade tying the passes together

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analyze;
pub mod compile;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod ir;
pub mod parser;
pub mod pipeline;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
pub mod test_utils;

/// Result type for passes that produce both output and diagnostics.
///
/// Fatal errors (like fuel exhaustion) use the outer `Result`.
pub type PassResult<T> = std::result::Result<(T, Diagnostics), Error>;

pub use config::Config;
pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use emit::{EmitError, EmitInput, Emitter, LineFiles, emitter_for};
pub use pipeline::{AnalyzedGrammar, ParsedGrammar, Pipeline};

/// Generator assumed when the grammar has no `%generator` directive.
pub const DEFAULT_GENERATOR: &str = "c";

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Execution fuel exhausted (too many parser operations).
    #[error("execution limit exceeded")]
    ExecFuelExhausted,

    /// Recursion fuel exhausted (input nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("grammar is invalid: {} errors", .0.error_count())]
    InvalidGrammar(Diagnostics),

    #[error("no emitter for language `{0}`")]
    UnknownLanguage(String),

    #[error("grammar targets generator `{grammar}`, not `{requested}`")]
    GeneratorMismatch { grammar: String, requested: String },

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("internal error: invalid call-plan: {0}")]
    Plan(#[from] rill_plan::PlanError),
}

pub type Result<T> = std::result::Result<T, Error>;
