//! Target-language emitters.
//!
//! An emitter turns a verified [`ParserPlan`] plus the grammar's verbatim
//! code (prologue, epilogue, snippets, type specs) into one source file.
//! Only C ships today; [`emitter_for`] is the registry.

mod c;

#[cfg(test)]
mod c_run_tests;

use rill_plan::ParserPlan;

use crate::config::Config;
use crate::ir::Grammar;

pub use c::CEmitter;

/// Everything an emitter reads.
pub struct EmitInput<'a> {
    pub grammar: &'a Grammar,
    pub plan: &'a ParserPlan,
    pub config: &'a Config,
    /// Grammar and output file names for `#line` directives. Without them
    /// snippets are marked with their grammar line in a comment.
    pub line_files: Option<LineFiles<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct LineFiles<'a> {
    pub grammar: &'a str,
    pub output: &'a str,
}

pub trait Emitter {
    /// Generator name as written in `%generator`.
    fn lang(&self) -> &'static str;

    /// File extension of the generated source, without the dot.
    fn extension(&self) -> &'static str;

    fn emit(&self, input: &EmitInput<'_>) -> Result<String, EmitError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EmitError {
    /// A snippet names a bind-tag the function has no slot for.
    #[error("snippet in `{function}` refers to unknown value `{name}`")]
    UnknownSlot { function: String, name: String },

    /// Root function missing from the plan.
    #[error("root `{0}` has no function")]
    MissingRoot(String),
}

/// Emitter registered for `lang`.
pub fn emitter_for(lang: &str) -> Option<Box<dyn Emitter>> {
    match lang {
        "c" => Some(Box::new(CEmitter)),
        _ => None,
    }
}

/// Languages with a registered emitter.
pub fn languages() -> &'static [&'static str] {
    &["c"]
}
