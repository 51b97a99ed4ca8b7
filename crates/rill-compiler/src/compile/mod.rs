//! Call-plan construction.
//!
//! Each expression becomes one function whose states are numbered in
//! traversal order. States are emitted forward; every state leaves "holes"
//! (successor fields not yet known) that the next emitted state fills in.
//!
//! - `function` - per-expression state emission
//! - `PlanBuilder` - tables, function ids and roots

mod function;

#[cfg(test)]
mod compile_tests;

use indexmap::IndexMap;
use rill_core::Symbol;
use rill_plan::{FnId, ParserPlan, RootEntry, TokenId, TokenInfo, TypeId, TypeInfo};

use crate::analyze::{Analysis, Bindings, FallbackMap};
use crate::ir::Grammar;

use function::FnCompiler;

/// Builds a [`ParserPlan`] from an analyzed grammar.
///
/// The grammar must have passed analysis; unresolved names are skipped
/// rather than reported.
pub struct PlanBuilder<'a> {
    grammar: &'a Grammar,
    analysis: &'a Analysis,
    fallbacks: &'a FallbackMap,
    bindings: &'a Bindings,
    end_token: Option<TokenId>,
}

/// Read-only inputs shared by every function compiler.
pub(crate) struct PlanContext<'a> {
    pub(crate) grammar: &'a Grammar,
    pub(crate) analysis: &'a Analysis,
    pub(crate) fallbacks: &'a FallbackMap,
    pub(crate) fn_ids: IndexMap<Symbol, FnId>,
    pub(crate) type_ids: IndexMap<Symbol, TypeId>,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(
        grammar: &'a Grammar,
        analysis: &'a Analysis,
        fallbacks: &'a FallbackMap,
        bindings: &'a Bindings,
    ) -> Self {
        Self {
            grammar,
            analysis,
            fallbacks,
            bindings,
            end_token: None,
        }
    }

    /// Token that ends the input. Reaching it while resynchronizing after a
    /// syntax error is fatal.
    pub fn end_token(mut self, token: Option<TokenId>) -> Self {
        self.end_token = token;
        self
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(self) -> ParserPlan {
        let grammar = self.grammar;
        let cx = PlanContext {
            grammar,
            analysis: self.analysis,
            fallbacks: self.fallbacks,
            fn_ids: grammar
                .expressions
                .keys()
                .enumerate()
                .map(|(i, name)| (*name, FnId::new(i)))
                .collect(),
            type_ids: grammar
                .types
                .keys()
                .enumerate()
                .map(|(i, name)| (*name, TypeId::new(i)))
                .collect(),
        };

        let mut plan = ParserPlan {
            tokens: grammar
                .tokens
                .values()
                .map(|t| TokenInfo {
                    name: grammar.name(t.name).to_string(),
                    ty: cx.type_id(t.ty),
                })
                .collect(),
            types: grammar
                .types
                .values()
                .map(|t| TypeInfo {
                    name: grammar.name(t.name).to_string(),
                    spec: t.spec.clone(),
                    destructor: t.destructor.clone(),
                })
                .collect(),
            end_token: self.end_token,
            ..ParserPlan::default()
        };

        for (index, expr) in grammar.expressions.values().enumerate() {
            let Some(layout) = self.bindings.layout(expr.name) else {
                continue;
            };
            let function = FnCompiler::new(&cx, &mut plan, FnId::new(index), layout).compile(expr);
            plan.functions.push(function);
        }

        plan.roots = grammar
            .root_names()
            .into_iter()
            .filter_map(|name| {
                cx.fn_ids.get(&name).map(|&function| RootEntry {
                    name: grammar.name(name).to_string(),
                    function,
                })
            })
            .collect();

        tracing::debug!(
            functions = plan.functions.len(),
            states = plan.functions.iter().map(|f| f.states.len()).sum::<usize>(),
            snippets = plan.snippets.len(),
            "plan built"
        );
        plan
    }
}

impl PlanContext<'_> {
    pub(crate) fn type_id(&self, ty: Option<Symbol>) -> Option<TypeId> {
        ty.and_then(|t| self.type_ids.get(&t).copied())
    }
}
