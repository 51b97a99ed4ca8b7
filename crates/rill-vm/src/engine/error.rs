//! Errors raised while feeding tokens.

use rill_plan::TokenId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("unknown token {0}")]
    UnknownToken(TokenId),

    /// Frame or semval stack exhausted. The parser is halted.
    #[error("parser stack overflow")]
    StackOverflow,

    /// The parser already finished or failed; reset it first.
    #[error("parser has finished; reset it before feeding more tokens")]
    ParserFinished,

    /// Too many states executed for one token. The parser is halted.
    #[error("runtime execution limit exceeded")]
    ExecFuelExhausted,
}

/// Failure signalled by a snippet. The parse ends with
/// [`Status::SemanticError`](super::Status::SemanticError).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("semantic error: {message}")]
pub struct SemanticError {
    pub message: String,
}

impl SemanticError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
