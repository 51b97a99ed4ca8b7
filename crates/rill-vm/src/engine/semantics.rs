//! Host side of the interpreter.

use rill_plan::{FnPlan, ParserPlan, SlotId, SnippetId, SnippetInfo, TokenId, TokenSet, TypeId};

use super::error::SemanticError;

/// What the interpreter calls back into: snippets, destructors and
/// location arithmetic.
///
/// Every value the parser receives (token values and snippet results) ends
/// up in exactly one place: moved into a snippet, handed to
/// [`destroy`](Semantics::destroy), or taken as the parse result.
pub trait Semantics {
    type Value;
    /// Use `()` when locations are not tracked.
    type Loc: Clone + Default;

    /// Runs a snippet. The returned value lands in the snippet's output
    /// slot; an error ends the parse with a semantic error.
    fn run(
        &mut self,
        action: ActionContext<'_, Self::Value, Self::Loc>,
    ) -> Result<Option<Self::Value>, SemanticError>;

    /// Releases a value the parser owned.
    fn destroy(&mut self, ty: Option<TypeId>, value: Self::Value);

    /// Location of an expression that consumed input from `first` to `last`.
    fn span(&mut self, first: &Self::Loc, last: &Self::Loc) -> Self::Loc {
        let _ = last;
        first.clone()
    }

    /// Location of a value that consumed nothing, placed after `previous`
    /// (the last consumed token, if any).
    fn zero_loc(&mut self, previous: Option<&Self::Loc>) -> Self::Loc {
        previous.cloned().unwrap_or_default()
    }

    /// Called once per syntax error, before recovery or halting.
    fn syntax_error(&mut self, report: SyntaxErrorReport<'_, Self::Value, Self::Loc>) {
        let _ = report;
    }
}

/// Inputs of one snippet run.
pub struct ActionContext<'a, V, L> {
    pub snippet: SnippetId,
    pub info: &'a SnippetInfo,
    pub function: &'a FnPlan,
    pub(crate) values: Vec<(SlotId, Option<V>)>,
    pub(crate) locations: Vec<(SlotId, L)>,
    pub(crate) error: Option<TokenId>,
}

impl<'a, V, L> ActionContext<'a, V, L> {
    pub fn code(&self) -> &'a str {
        &self.info.code
    }

    /// Moves out the value bound to `name`. Values not taken are dropped
    /// with the context.
    pub fn take(&mut self, name: &str) -> Option<V> {
        let function = self.function;
        self.values
            .iter_mut()
            .find(|(slot, _)| function.slot(*slot).name == name)
            .and_then(|(_, value)| value.take())
    }

    /// Moves out every input value, in slot order.
    pub fn take_all(&mut self) -> Vec<V> {
        self.values
            .iter_mut()
            .filter_map(|(_, value)| value.take())
            .collect()
    }

    /// Location of `name`; `$` is the expression's own location so far.
    pub fn loc(&self, name: &str) -> Option<&L> {
        let function = self.function;
        self.locations
            .iter()
            .find(|(slot, _)| {
                if name == "$" {
                    *slot == SlotId::OUTPUT
                } else {
                    *slot != SlotId::OUTPUT && function.slot(*slot).name == name
                }
            })
            .map(|(_, loc)| loc)
    }

    /// The offending token, inside recovery snippets.
    pub fn error(&self) -> Option<TokenId> {
        self.error
    }
}

/// One syntax error, as passed to [`Semantics::syntax_error`].
pub struct SyntaxErrorReport<'a, V, L> {
    pub plan: &'a ParserPlan,
    pub token: TokenId,
    pub value: Option<&'a V>,
    pub loc: &'a L,
    pub expected: &'a TokenSet,
}

impl<V, L> SyntaxErrorReport<'_, V, L> {
    pub fn token_name(&self) -> &str {
        self.plan.token_name(self.token)
    }

    pub fn expected_names(&self) -> Vec<&str> {
        self.plan.token_names(self.expected)
    }
}
