//! Scoped construction of the grammar IR.
//!
//! Expression bodies are built through an explicit scope stack. Every
//! `open_*` call returns a [`Scope`] guard that borrows the builder, so
//! scopes close in LIFO order by construction; the stack still checks the
//! order at runtime and reports malformed nesting as diagnostics.

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use rill_core::{Interner, Symbol};
use rowan::TextRange;

use super::code::scan_refs;
use super::{
    Branches, Code, Element, Expression, FallbackDecl, Grammar, Group, Kwarg, Multiplier,
    Recovery, Reference, RootDecl, Sequence, Snippet, Term, TokenDecl, TypeDecl,
};
use crate::DEFAULT_GENERATOR;
use crate::diagnostics::{DiagnosticKind, Diagnostics, LineIndex};

/// A directive restricted to one generator by a `:tag`.
#[derive(Debug, Clone)]
struct Tagged<T> {
    tag: Option<String>,
    item: T,
}

#[derive(Debug, Default)]
pub struct GrammarBuilder {
    interner: Interner,
    tokens: IndexMap<Symbol, TokenDecl>,
    expressions: IndexMap<Symbol, Expression>,
    types: Vec<Tagged<TypeDecl>>,
    kwargs: Vec<Tagged<Kwarg>>,
    roots: Vec<Tagged<RootDecl>>,
    fallbacks: Vec<Tagged<FallbackDecl>>,
    generator: Option<(String, TextRange)>,
    prologue: Vec<Code>,
    epilogue: Vec<Code>,
    lines: Option<LineIndex>,
    diagnostics: Diagnostics,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record line numbers of snippets against `source`.
    pub fn with_source(mut self, source: &str) -> Self {
        self.lines = Some(LineIndex::new(source));
        self
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    fn line(&self, range: TextRange) -> u32 {
        self.lines.as_ref().map_or(0, |l| l.line(range.start()))
    }

    /// Report a clash with an earlier token or expression of the same name.
    fn check_unique(&mut self, name: Symbol, range: TextRange) -> bool {
        let previous = self
            .tokens
            .get(&name)
            .map(|t| t.range)
            .or_else(|| self.expressions.get(&name).map(|e| e.range));
        let Some(previous) = previous else {
            return true;
        };
        let text = self.interner.resolve(name).to_string();
        self.diagnostics
            .report(DiagnosticKind::DuplicateDefinition, range)
            .message(text)
            .related_to("first defined here", previous)
            .emit();
        false
    }

    pub fn token(&mut self, name: &str, ty: Option<&str>, range: TextRange) {
        let name = self.intern(name);
        let ty = ty.map(|t| self.intern(t));
        if self.check_unique(name, range) {
            self.tokens.insert(
                name,
                TokenDecl {
                    name,
                    ty,
                    range,
                    implicit: false,
                },
            );
        }
    }

    /// Declare an expression and start building its body.
    ///
    /// The body is committed when the returned builder is dropped or
    /// finished.
    pub fn expression(&mut self, name: &str, ty: Option<&str>, range: TextRange) -> ExprBuilder<'_> {
        let name = self.intern(name);
        let ty = ty.map(|t| self.intern(t));
        let discard = !self.check_unique(name, range);
        ExprBuilder {
            grammar: self,
            name,
            ty,
            range,
            stack: vec![Frame::Branches {
                role: Role::Body,
                alternatives: Vec::new(),
                range,
            }],
            discard,
            done: false,
        }
    }

    pub fn type_decl(
        &mut self,
        tag: Option<&str>,
        name: &str,
        spec: &str,
        destructor: Option<&str>,
        range: TextRange,
    ) {
        let name = self.intern(name);
        self.types.push(Tagged {
            tag: tag.map(str::to_string),
            item: TypeDecl {
                name,
                spec: spec.to_string(),
                destructor: destructor.map(str::to_string),
                range,
            },
        });
    }

    pub fn kwarg(&mut self, tag: Option<&str>, key: &str, value: &str, range: TextRange) {
        self.kwargs.push(Tagged {
            tag: tag.map(str::to_string),
            item: Kwarg {
                key: key.to_string(),
                value: value.to_string(),
                range,
            },
        });
    }

    pub fn root(&mut self, tag: Option<&str>, name: &str, range: TextRange) {
        let name = self.intern(name);
        self.roots.push(Tagged {
            tag: tag.map(str::to_string),
            item: RootDecl { name, range },
        });
    }

    pub fn fallback(&mut self, tag: Option<&str>, to: &str, from: &[&str], range: TextRange) {
        let to = self.intern(to);
        let from = from.iter().map(|f| self.intern(f)).collect();
        self.fallbacks.push(Tagged {
            tag: tag.map(str::to_string),
            item: FallbackDecl { to, from, range },
        });
    }

    pub fn generator(&mut self, name: &str, range: TextRange) {
        if let Some((_, previous)) = &self.generator {
            let previous = *previous;
            self.diagnostics
                .report(DiagnosticKind::DuplicateGenerator, range)
                .related_to("first set here", previous)
                .emit();
            return;
        }
        self.generator = Some((name.to_string(), range));
    }

    pub fn prologue(&mut self, text: &str, range: TextRange) {
        let line = self.line(range);
        self.prologue.push(Code {
            text: text.to_string(),
            range,
            line,
        });
    }

    pub fn epilogue(&mut self, text: &str, range: TextRange) {
        let line = self.line(range);
        self.epilogue.push(Code {
            text: text.to_string(),
            range,
            line,
        });
    }

    pub fn finish(mut self) -> (Grammar, Diagnostics) {
        let active = self
            .generator
            .as_ref()
            .map_or(DEFAULT_GENERATOR, |(g, _)| g.as_str())
            .to_string();
        let applies = |tag: &Option<String>| tag.as_deref().is_none_or(|t| t == active);

        let mut types: IndexMap<Symbol, TypeDecl> = IndexMap::new();
        for Tagged { tag, item } in std::mem::take(&mut self.types) {
            if !applies(&tag) {
                continue;
            }
            if let Some(previous) = types.get(&item.name) {
                self.diagnostics
                    .report(DiagnosticKind::DuplicateType, item.range)
                    .message(self.interner.resolve(item.name))
                    .related_to("first declared here", previous.range)
                    .emit();
                continue;
            }
            types.insert(item.name, item);
        }

        let kwargs = take_applicable(&mut self.kwargs, &applies);
        let roots = take_applicable(&mut self.roots, &applies);
        let fallbacks = take_applicable(&mut self.fallbacks, &applies);
        let fallbacks = self.declare_fallback_tokens(fallbacks);

        let grammar = Grammar {
            interner: self.interner,
            tokens: self.tokens,
            expressions: self.expressions,
            types,
            kwargs,
            roots,
            fallbacks,
            generator: self.generator.map(|(g, _)| g),
            prologue: self.prologue,
            epilogue: self.epilogue,
        };
        (grammar, self.diagnostics)
    }

    /// Names used only by `%fallback` become untyped tokens. Expressions are
    /// rejected and dropped from the relation.
    fn declare_fallback_tokens(&mut self, fallbacks: Vec<FallbackDecl>) -> Vec<FallbackDecl> {
        let mut kept = Vec::with_capacity(fallbacks.len());
        for mut decl in fallbacks {
            let mut names = vec![decl.to];
            names.extend(decl.from.iter().copied());

            let mut valid = true;
            for name in names {
                if self.expressions.contains_key(&name) {
                    self.diagnostics
                        .report(DiagnosticKind::FallbackNotToken, decl.range)
                        .message(self.interner.resolve(name))
                        .emit();
                    valid = false;
                    continue;
                }
                self.tokens.entry(name).or_insert(TokenDecl {
                    name,
                    ty: None,
                    range: decl.range,
                    implicit: true,
                });
            }
            if valid {
                decl.from.dedup();
                kept.push(decl);
            }
        }
        kept
    }
}

fn take_applicable<T>(items: &mut Vec<Tagged<T>>, applies: &impl Fn(&Option<String>) -> bool) -> Vec<T> {
    std::mem::take(items)
        .into_iter()
        .filter(|t| applies(&t.tag))
        .map(|t| t.item)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Body,
    Group,
    Multiplier { min: u32, max: Option<u32> },
    RecoveryInner,
}

#[derive(Debug)]
enum Frame {
    Branches {
        role: Role,
        alternatives: Vec<Sequence>,
        range: TextRange,
    },
    Sequence {
        elements: Vec<Element>,
        range: TextRange,
    },
    Recovery {
        inner: Option<Branches>,
        handlers: Vec<Snippet>,
        range: TextRange,
    },
}

/// Builds one expression body. Dropping it commits the expression.
pub struct ExprBuilder<'b> {
    grammar: &'b mut GrammarBuilder,
    name: Symbol,
    ty: Option<Symbol>,
    range: TextRange,
    stack: Vec<Frame>,
    /// Set for duplicate names: the body is checked but not kept.
    discard: bool,
    done: bool,
}

/// Guard for one open scope; closes it when dropped.
#[must_use = "dropping a scope closes it immediately"]
pub struct Scope<'s, 'b> {
    builder: &'s mut ExprBuilder<'b>,
    depth: usize,
    closed: bool,
}

impl<'b> Deref for Scope<'_, 'b> {
    type Target = ExprBuilder<'b>;

    fn deref(&self) -> &Self::Target {
        self.builder
    }
}

impl DerefMut for Scope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.builder
    }
}

impl Scope<'_, '_> {
    pub fn close(mut self) {
        self.closed = true;
        self.builder.close_scope(self.depth);
    }
}

impl Drop for Scope<'_, '_> {
    fn drop(&mut self) {
        if !self.closed {
            self.builder.close_scope(self.depth);
        }
    }
}

impl<'b> ExprBuilder<'b> {
    pub fn name(&self) -> Symbol {
        self.name
    }

    fn malformed(&mut self, range: TextRange, detail: &str) {
        self.grammar
            .diagnostics
            .report(DiagnosticKind::MalformedNesting, range)
            .message(detail)
            .emit();
    }

    fn in_sequence(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Sequence { .. }))
    }

    fn push_scope(&mut self, frame: Frame) -> Scope<'_, 'b> {
        let depth = self.stack.len();
        self.stack.push(frame);
        Scope {
            builder: self,
            depth,
            closed: false,
        }
    }

    /// Open one alternative of the innermost branches.
    pub fn open_sequence(&mut self, range: TextRange) -> Scope<'_, 'b> {
        if !matches!(self.stack.last(), Some(Frame::Branches { .. })) {
            self.malformed(range, "a sequence must be opened inside branches");
        }
        self.push_scope(Frame::Sequence {
            elements: Vec::new(),
            range,
        })
    }

    fn open_branches(&mut self, role: Role, range: TextRange, what: &str) -> Scope<'_, 'b> {
        if !self.in_sequence() {
            self.malformed(range, &format!("{what} must be opened inside a sequence"));
        }
        self.push_scope(Frame::Branches {
            role,
            alternatives: Vec::new(),
            range,
        })
    }

    pub fn open_group(&mut self, range: TextRange) -> Scope<'_, 'b> {
        self.open_branches(Role::Group, range, "a group")
    }

    pub fn open_multiplier(&mut self, min: u32, max: Option<u32>, range: TextRange) -> Scope<'_, 'b> {
        self.open_branches(Role::Multiplier { min, max }, range, "a repeat")
    }

    /// Open a recovery block. Its inner branches are open right away; call
    /// [`recovery_handler`](Self::recovery_handler) to switch to the
    /// recovery snippets.
    pub fn open_recovery(&mut self, range: TextRange) -> Scope<'_, 'b> {
        if !self.in_sequence() {
            self.malformed(range, "a recovery block must be opened inside a sequence");
        }
        let depth = self.stack.len();
        self.stack.push(Frame::Recovery {
            inner: None,
            handlers: Vec::new(),
            range,
        });
        self.stack.push(Frame::Branches {
            role: Role::RecoveryInner,
            alternatives: Vec::new(),
            range,
        });
        Scope {
            builder: self,
            depth,
            closed: false,
        }
    }

    pub fn recovery_handler(&mut self) {
        match self.stack.last() {
            Some(Frame::Branches {
                role: Role::RecoveryInner,
                ..
            }) => self.pop_frame(),
            _ => {
                let range = self.current_range();
                self.malformed(range, "recovery handler outside a recovery block");
            }
        }
    }

    pub fn reference(&mut self, name: &str, bind: Option<&str>, range: TextRange) {
        let name = self.grammar.intern(name);
        let bind = bind.map(|b| self.grammar.intern(b));
        match self.stack.last_mut() {
            Some(Frame::Sequence { elements, .. }) => {
                elements.push(Element::Term(Term::Reference(Reference { name, bind, range })));
            }
            _ => self.malformed(range, "a reference must be inside a sequence"),
        }
    }

    pub fn snippet(&mut self, code: &str, bind: Option<&str>, range: TextRange) {
        let bind = bind.map(|b| self.grammar.intern(b));
        let snippet = Snippet {
            code: code.to_string(),
            bind,
            refs: scan_refs(code),
            range,
            line: self.grammar.line(range),
        };
        match self.stack.last_mut() {
            Some(Frame::Sequence { elements, .. }) => elements.push(Element::Snippet(snippet)),
            Some(Frame::Recovery {
                inner: Some(_),
                handlers,
                ..
            }) => handlers.push(snippet),
            _ => self.malformed(range, "a snippet must be inside a sequence or a recovery handler"),
        }
    }

    /// Close the innermost open scope.
    pub fn close(&mut self) {
        if self.stack.len() <= 1 {
            let range = self.range;
            self.malformed(range, "no open scope to close");
            return;
        }
        self.pop_frame();
    }

    fn close_scope(&mut self, depth: usize) {
        if self.stack.len() <= depth {
            return;
        }
        if self.stack.len() > depth + 1 {
            let range = self.current_range();
            self.malformed(range, "closing a scope while an inner scope is still open");
        }
        while self.stack.len() > depth {
            self.pop_frame();
        }
    }

    fn current_range(&self) -> TextRange {
        match self.stack.last() {
            Some(Frame::Branches { range, .. })
            | Some(Frame::Sequence { range, .. })
            | Some(Frame::Recovery { range, .. }) => *range,
            None => self.range,
        }
    }

    fn push_term(&mut self, term: Term) {
        // A misplaced open was already reported.
        if let Some(Frame::Sequence { elements, .. }) = self.stack.last_mut() {
            elements.push(Element::Term(term));
        }
    }

    fn pop_frame(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Sequence { elements, range } => {
                if let Some(Frame::Branches { alternatives, .. }) = self.stack.last_mut() {
                    alternatives.push(Sequence { elements, range });
                }
            }
            Frame::Branches {
                role,
                alternatives,
                range,
            } => {
                if alternatives.is_empty() {
                    self.malformed(range, "empty branches");
                }
                let inner = Branches {
                    alternatives,
                    range,
                };
                match role {
                    Role::Body => {}
                    Role::Group => self.push_term(Term::Group(Group { inner, range })),
                    Role::Multiplier { min, max } => self.push_term(Term::Multiplier(Multiplier {
                        inner,
                        min,
                        max,
                        range,
                    })),
                    Role::RecoveryInner => {
                        if let Some(Frame::Recovery { inner: slot, .. }) = self.stack.last_mut() {
                            *slot = Some(inner);
                        }
                    }
                }
            }
            Frame::Recovery {
                inner,
                handlers,
                range,
            } => {
                if handlers.is_empty() {
                    self.malformed(range, "a recovery block needs at least one snippet");
                }
                let inner = inner.unwrap_or(Branches {
                    alternatives: Vec::new(),
                    range,
                });
                self.push_term(Term::Recovery(Recovery {
                    inner,
                    handlers,
                    range,
                }));
            }
        }
    }

    /// Commit the expression. Equivalent to dropping the builder.
    pub fn finish(self) {}

    fn commit(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        while self.stack.len() > 1 {
            self.pop_frame();
        }
        let Some(Frame::Branches {
            alternatives,
            range,
            ..
        }) = self.stack.pop()
        else {
            return;
        };
        if alternatives.is_empty() {
            let name = self.grammar.interner.resolve(self.name).to_string();
            self.malformed(self.range, &format!("expression `{name}` has an empty body"));
        }
        if self.discard {
            return;
        }
        self.grammar.expressions.insert(
            self.name,
            Expression {
                name: self.name,
                ty: self.ty,
                body: Branches {
                    alternatives,
                    range,
                },
                range: self.range,
            },
        );
    }
}

impl Drop for ExprBuilder<'_> {
    fn drop(&mut self) {
        self.commit();
    }
}
