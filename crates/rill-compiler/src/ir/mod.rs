//! Grammar intermediate representation.
//!
//! Tokens and expressions live in insertion-ordered arenas keyed by interned
//! name. Expression bodies are always [`Branches`]; a plain sequence is a
//! single alternative. The IR is built once through [`GrammarBuilder`] and
//! is read-only afterwards.

mod builder;
mod code;
mod lower;
pub mod visit;


use indexmap::IndexMap;
use rill_core::{Interner, Symbol};
use rill_plan::TokenId;
use rowan::TextRange;

pub use builder::{ExprBuilder, GrammarBuilder, Scope};
pub use code::{CodeRef, RefKind, scan_refs, substitute_refs};
pub use lower::lower;
pub use visit::Visitor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDecl {
    pub name: Symbol,
    pub ty: Option<Symbol>,
    pub range: TextRange,
    /// Declared only by naming it in a `%fallback` directive.
    pub implicit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: Symbol,
    /// Target-language type, verbatim.
    pub spec: String,
    pub destructor: Option<String>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub name: Symbol,
    pub ty: Option<Symbol>,
    pub body: Branches,
    pub range: TextRange,
}

/// Non-empty list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branches {
    pub alternatives: Vec<Sequence>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub elements: Vec<Element>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Term(Term),
    Snippet(Snippet),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Reference(Reference),
    Group(Group),
    Multiplier(Multiplier),
    Recovery(Recovery),
}

impl Term {
    pub fn range(&self) -> TextRange {
        match self {
            Term::Reference(r) => r.range,
            Term::Group(g) => g.range,
            Term::Multiplier(m) => m.range,
            Term::Recovery(r) => r.range,
        }
    }
}

impl Element {
    pub fn range(&self) -> TextRange {
        match self {
            Element::Term(t) => t.range(),
            Element::Snippet(s) => s.range,
        }
    }
}

/// Name of a token or expression, with an optional bind-tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: Symbol,
    pub bind: Option<Symbol>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub inner: Branches,
    pub range: TextRange,
}

/// Repeat of `inner` between `min` and `max` times; `max: None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiplier {
    pub inner: Branches,
    pub min: u32,
    pub max: Option<u32>,
    pub range: TextRange,
}

impl Multiplier {
    pub fn is_optional(&self) -> bool {
        self.min == 0 && self.max == Some(1)
    }

    /// Whether the loop may run the body again after an iteration.
    pub fn can_iterate_again(&self) -> bool {
        self.max.is_none_or(|max| max > self.min.max(1))
    }
}

/// `< inner ? handlers >`: on a syntax error inside `inner`, run the
/// handlers and discard input up to the following token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub inner: Branches,
    pub handlers: Vec<Snippet>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub code: String,
    pub bind: Option<Symbol>,
    pub refs: Vec<CodeRef>,
    pub range: TextRange,
    /// 1-based source line; 0 when unknown.
    pub line: u32,
}

impl Snippet {
    /// Whether the code writes `$$`.
    pub fn writes_output(&self) -> bool {
        self.refs
            .iter()
            .any(|r| r.kind == RefKind::Value && r.name.is_none())
    }
}

/// Verbatim code outside expressions (prologue and epilogue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub text: String,
    pub range: TextRange,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kwarg {
    pub key: String,
    pub value: String,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDecl {
    pub name: Symbol,
    pub range: TextRange,
}

/// `%fallback to from...`: every `from` is accepted where `to` is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackDecl {
    pub to: Symbol,
    pub from: Vec<Symbol>,
    pub range: TextRange,
}

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition<'g> {
    Token(TokenId, &'g TokenDecl),
    Expression(&'g Expression),
}

#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub interner: Interner,
    pub tokens: IndexMap<Symbol, TokenDecl>,
    pub expressions: IndexMap<Symbol, Expression>,
    pub types: IndexMap<Symbol, TypeDecl>,
    pub kwargs: Vec<Kwarg>,
    pub roots: Vec<RootDecl>,
    pub fallbacks: Vec<FallbackDecl>,
    /// Generator named by `%generator`, if any.
    pub generator: Option<String>,
    pub prologue: Vec<Code>,
    pub epilogue: Vec<Code>,
}

impl Grammar {
    pub fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn lookup(&self, sym: Symbol) -> Option<Definition<'_>> {
        if let Some((index, _, decl)) = self.tokens.get_full(&sym) {
            return Some(Definition::Token(TokenId::new(index), decl));
        }
        self.expressions.get(&sym).map(Definition::Expression)
    }

    pub fn token_id(&self, sym: Symbol) -> Option<TokenId> {
        self.tokens.get_index_of(&sym).map(TokenId::new)
    }

    pub fn token(&self, id: TokenId) -> &TokenDecl {
        &self.tokens[id.index()]
    }

    pub fn token_name(&self, id: TokenId) -> &str {
        self.name(self.token(id).name)
    }

    pub fn expression(&self, sym: Symbol) -> Option<&Expression> {
        self.expressions.get(&sym)
    }

    /// Semantic type of whatever `sym` names; `None` for untyped or unknown.
    pub fn type_of(&self, sym: Symbol) -> Option<Symbol> {
        match self.lookup(sym)? {
            Definition::Token(_, decl) => decl.ty,
            Definition::Expression(expr) => expr.ty,
        }
    }

    /// Declared roots, or the first expression when none is declared.
    pub fn root_names(&self) -> Vec<Symbol> {
        if self.roots.is_empty() {
            return self.expressions.keys().next().copied().into_iter().collect();
        }
        self.roots.iter().map(|r| r.name).collect()
    }

    pub fn kwarg(&self, key: &str) -> Option<&Kwarg> {
        self.kwargs.iter().rev().find(|k| k.key == key)
    }

    /// Names of the tokens in `set`, in declaration order, as `` `A`, `B` ``.
    pub fn describe_tokens(&self, set: &rill_plan::TokenSet) -> String {
        set.iter()
            .map(|t| format!("`{}`", self.token_name(t)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
