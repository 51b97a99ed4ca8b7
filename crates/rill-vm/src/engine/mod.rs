//! Interpreter engine.
//!
//! - `parser` - the resumable state-machine driver
//! - `frame` - call frames, value slots and recovery markers
//! - `semantics` - the host side: snippet execution and value release
//! - `trace` - step-by-step instrumentation

mod error;
mod frame;
mod parser;
mod semantics;
mod trace;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod test_semantics;

pub use error::{RuntimeError, SemanticError};
pub use parser::{Limits, Parser, ParserBuilder, Status};
pub use semantics::{ActionContext, Semantics, SyntaxErrorReport};
pub use trace::{NoopTracer, PrintTracer, Tracer};
