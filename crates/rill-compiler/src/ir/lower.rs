//! AST to grammar IR lowering.
//!
//! Walks the typed AST once and drives [`GrammarBuilder`]. Directive arity
//! and repeat bounds are checked here; name resolution happens later.

use rowan::TextRange;

use super::builder::{ExprBuilder, GrammarBuilder};
use super::Grammar;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::{ast, Item, SeqItem, SyntaxKind, SyntaxToken};

#[tracing::instrument(level = "debug", skip_all)]
pub fn lower(root: &ast::Root, source: &str) -> (Grammar, Diagnostics) {
    let mut lowering = Lowering {
        builder: GrammarBuilder::new().with_source(source),
        diagnostics: Diagnostics::new(),
    };

    let items: Vec<Item> = root.items().collect();
    let first_stmt = items.iter().position(|i| !matches!(i, Item::Snippet(_)));
    let last_stmt = items.iter().rposition(|i| !matches!(i, Item::Snippet(_)));

    for (index, item) in items.iter().enumerate() {
        match item {
            Item::Directive(d) => lowering.directive(d),
            Item::Def(d) => lowering.def(d),
            Item::Snippet(s) => {
                let Some(code) = s.body() else { continue };
                if first_stmt.is_none_or(|f| index < f) {
                    lowering.builder.prologue(&code, s.text_range());
                } else if last_stmt.is_some_and(|l| index > l) {
                    lowering.builder.epilogue(&code, s.text_range());
                }
                // Code between statements was reported by the parser.
            }
        }
    }

    let (grammar, builder_diagnostics) = lowering.builder.finish();
    let mut diagnostics = lowering.diagnostics;
    diagnostics.extend(builder_diagnostics);
    tracing::debug!(
        tokens = grammar.tokens.len(),
        expressions = grammar.expressions.len(),
        "lowered"
    );
    (grammar, diagnostics)
}

struct Lowering {
    builder: GrammarBuilder,
    diagnostics: Diagnostics,
}

fn tag_name(tag: Option<ast::Tag>) -> Option<String> {
    tag.and_then(|t| t.name()).map(|n| n.text().to_string())
}

impl Lowering {
    fn invalid(&mut self, range: TextRange, detail: &str) {
        self.diagnostics
            .report(DiagnosticKind::InvalidDirective, range)
            .message(detail)
            .emit();
    }

    fn directive(&mut self, directive: &ast::Directive) {
        let Some(keyword) = directive.keyword() else {
            return;
        };
        let range = directive.text_range();
        let tag = tag_name(directive.tag());
        let tag = tag.as_deref();
        let args = directive.args();
        let is_text = |t: &SyntaxToken| t.kind() == SyntaxKind::Text;
        let is_code = |t: &SyntaxToken| t.kind() == SyntaxKind::Code;

        match keyword.text() {
            "generator" => match args.as_slice() {
                [name] if is_text(name) && tag.is_none() => {
                    self.builder.generator(name.text(), range)
                }
                _ => self.invalid(range, "`%generator` takes one name and no tag"),
            },
            "kwarg" => match args.as_slice() {
                [key, value] if is_text(key) && (is_text(value) || is_code(value)) => {
                    let value = token_value(value);
                    self.builder.kwarg(tag, key.text(), &value, range);
                }
                _ => self.invalid(range, "`%kwarg` takes a key and a value"),
            },
            "type" => match args.as_slice() {
                [name, spec, rest @ ..]
                    if is_text(name) && is_code(spec) && rest.len() <= 1 && rest.iter().all(is_code) =>
                {
                    let spec = token_value(spec);
                    let destructor = rest.first().map(token_value);
                    self.builder
                        .type_decl(tag, name.text(), &spec, destructor.as_deref(), range);
                }
                _ => self.invalid(
                    range,
                    "`%type` takes a name, a type block and an optional destructor block",
                ),
            },
            "root" => match args.as_slice() {
                [name] if is_text(name) => self.builder.root(tag, name.text(), range),
                _ => self.invalid(range, "`%root` takes one expression name"),
            },
            "fallback" => match args.as_slice() {
                [to, from @ ..] if !from.is_empty() && args.iter().all(is_text) => {
                    let from: Vec<&str> = from.iter().map(|t| t.text()).collect();
                    self.builder.fallback(tag, to.text(), &from, range);
                }
                _ => self.invalid(range, "`%fallback` takes a token and one or more fallbacks"),
            },
            other => {
                self.diagnostics
                    .report(DiagnosticKind::UnknownDirective, keyword.text_range())
                    .message(other)
                    .emit();
            }
        }
    }

    fn def(&mut self, def: &ast::Def) {
        let Some(name) = def.name() else {
            return;
        };
        let ty = tag_name(def.type_tag());
        let range = name.text_range();

        if def.is_token() {
            self.builder.token(name.text(), ty.as_deref(), range);
            return;
        }
        let Some(body) = def.body() else {
            return;
        };
        let mut expr = self.builder.expression(name.text(), ty.as_deref(), range);
        let mut bounds = Vec::new();
        lower_branches(&mut expr, &body, &mut bounds);
        expr.finish();

        for (range, detail) in bounds {
            self.diagnostics
                .report(DiagnosticKind::InvalidRepeatBounds, range)
                .message(detail)
                .emit();
        }
    }
}

/// Text or code-block body of a directive argument.
fn token_value(token: &SyntaxToken) -> String {
    if token.kind() == SyntaxKind::Code {
        crate::parser::lexer::code_body(token.text())
            .unwrap_or_default()
            .to_string()
    } else {
        token.text().to_string()
    }
}

type BoundErrors = Vec<(TextRange, String)>;

fn lower_branches(eb: &mut ExprBuilder<'_>, branches: &ast::Branches, errors: &mut BoundErrors) {
    for seq in branches.seqs() {
        let mut scope = eb.open_sequence(seq.text_range());
        for item in seq.items() {
            match item {
                SeqItem::Term(term) => lower_term(&mut scope, &term, errors),
                SeqItem::Snippet(snippet) => lower_snippet(&mut scope, &snippet),
            }
        }
    }
}

fn lower_snippet(eb: &mut ExprBuilder<'_>, snippet: &ast::Snippet) {
    let Some(code) = snippet.body() else {
        return;
    };
    let bind = tag_name(snippet.bind());
    eb.snippet(&code, bind.as_deref(), snippet.text_range());
}

fn lower_term(eb: &mut ExprBuilder<'_>, term: &ast::Term, errors: &mut BoundErrors) {
    match term {
        ast::Term::Ref(r) => {
            let Some(name) = r.name() else {
                return;
            };
            let bind = tag_name(r.bind());
            eb.reference(name.text(), bind.as_deref(), r.text_range());
        }
        ast::Term::Group(g) => {
            let mut scope = eb.open_group(g.text_range());
            if let Some(body) = g.body() {
                lower_branches(&mut scope, &body, errors);
            }
        }
        ast::Term::Optional(o) => {
            let mut scope = eb.open_multiplier(0, Some(1), o.text_range());
            if let Some(body) = o.body() {
                lower_branches(&mut scope, &body, errors);
            }
        }
        ast::Term::Repeat(r) => {
            let (min, max) = match repeat_bounds(r) {
                Ok(bounds) => bounds,
                Err(detail) => {
                    errors.push((r.bounds_range(), detail));
                    (0, None)
                }
            };
            let Some(inner) = r.inner() else {
                return;
            };
            let mut scope = eb.open_multiplier(min, max, r.text_range());
            match &inner {
                ast::Term::Group(g) => {
                    if let Some(body) = g.body() {
                        lower_branches(&mut scope, &body, errors);
                    }
                }
                other => {
                    let mut seq = scope.open_sequence(other.as_cst().text_range());
                    lower_term(&mut seq, other, errors);
                }
            }
        }
        ast::Term::Recovery(r) => {
            let mut scope = eb.open_recovery(r.text_range());
            if let Some(body) = r.body() {
                lower_branches(&mut scope, &body, errors);
            }
            scope.recovery_handler();
            for handler in r.handlers() {
                lower_snippet(&mut scope, &handler);
            }
        }
    }
}

/// `*x` is (0,∞), `*n x` (0,n), `m* x` (m,∞), `m*n x` (m,n).
fn repeat_bounds(repeat: &ast::Repeat) -> Result<(u32, Option<u32>), String> {
    let parse = |t: SyntaxToken| {
        t.text()
            .parse::<u32>()
            .map_err(|_| format!("`{}` is too large", t.text()))
    };
    let min = repeat.min().map(parse).transpose()?.unwrap_or(0);
    let max = repeat.max().map(parse).transpose()?;
    match max {
        Some(0) => Err("the upper bound must be at least 1".to_string()),
        Some(max) if min > max => Err(format!("lower bound {min} exceeds upper bound {max}")),
        _ => Ok((min, max)),
    }
}
