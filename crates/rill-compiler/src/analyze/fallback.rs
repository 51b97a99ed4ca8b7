//! Fallback tokens.
//!
//! `%fallback LETTER A B;` makes `A` and `B` acceptable wherever `LETTER` is
//! expected. The relation is kept as a forest of parent links; where a more
//! specific token and one of its ancestors are both expected at one choice
//! point, the more specific one wins.

use indexmap::IndexMap;
use rill_plan::{TokenId, TokenSet};
use rowan::TextRange;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::Grammar;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackMap {
    parent: IndexMap<TokenId, TokenId>,
    children: IndexMap<TokenId, Vec<TokenId>>,
}

impl FallbackMap {
    /// Builds the forest from the grammar's `%fallback` directives.
    ///
    /// Edges that would give a token a second parent or close a cycle are
    /// reported and dropped, so the result is always a forest.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn extract(grammar: &Grammar) -> (FallbackMap, Diagnostics) {
        let mut map = FallbackMap::default();
        let mut diagnostics = Diagnostics::new();
        let mut edge_ranges: IndexMap<TokenId, TextRange> = IndexMap::new();

        for decl in &grammar.fallbacks {
            let Some(to) = grammar.token_id(decl.to) else {
                continue;
            };
            for &from_sym in &decl.from {
                let Some(from) = grammar.token_id(from_sym) else {
                    continue;
                };

                if let Some(&existing) = map.parent.get(&from) {
                    if existing != to {
                        let mut report = diagnostics
                            .report(DiagnosticKind::FallbackMultipleParents, decl.range)
                            .message(grammar.token_name(from));
                        if let Some(&first) = edge_ranges.get(&from) {
                            report = report.related_to(
                                format!("already falls back to `{}` here", grammar.token_name(existing)),
                                first,
                            );
                        }
                        report.emit();
                    }
                    continue;
                }

                if let Some(chain) = map.path_to_root_containing(to, from) {
                    let mut names: Vec<&str> =
                        chain.iter().rev().map(|&t| grammar.token_name(t)).collect();
                    names.push(grammar.token_name(from));
                    diagnostics
                        .report(DiagnosticKind::FallbackCycle, decl.range)
                        .message(names.join(" → "))
                        .emit();
                    continue;
                }

                let from_ty = grammar.token(from).ty;
                let to_ty = grammar.token(to).ty;
                if let (Some(from_ty), Some(to_ty)) = (from_ty, to_ty)
                    && from_ty != to_ty
                {
                    diagnostics
                        .report(DiagnosticKind::FallbackTypeMismatch, decl.range)
                        .message(format!(
                            "`{}` has type `{}` but `{}` has type `{}`",
                            grammar.token_name(from),
                            grammar.name(from_ty),
                            grammar.token_name(to),
                            grammar.name(to_ty),
                        ))
                        .emit();
                    continue;
                }

                map.parent.insert(from, to);
                map.children.entry(to).or_default().push(from);
                edge_ranges.insert(from, decl.range);
            }
        }

        tracing::debug!(edges = map.parent.len(), "fallback forest");
        (map, diagnostics)
    }

    /// Ancestors of `start` (inclusive) up to and including `target`, when
    /// `target` is among them.
    fn path_to_root_containing(&self, start: TokenId, target: TokenId) -> Option<Vec<TokenId>> {
        let mut chain = vec![start];
        let mut current = start;
        while current != target {
            current = *self.parent.get(&current)?;
            chain.push(current);
        }
        Some(chain)
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn parent(&self, token: TokenId) -> Option<TokenId> {
        self.parent.get(&token).copied()
    }

    /// Direct fallbacks of `token`, in declaration order.
    pub fn children(&self, token: TokenId) -> &[TokenId] {
        self.children.get(&token).map_or(&[], Vec::as_slice)
    }

    /// All tokens that transitively fall back to `token`, excluding itself.
    pub fn descendants(&self, token: TokenId) -> TokenSet {
        let mut set = TokenSet::new();
        let mut stack: Vec<TokenId> = self.children(token).to_vec();
        while let Some(t) = stack.pop() {
            if set.insert(t) {
                stack.extend_from_slice(self.children(t));
            }
        }
        set
    }

    pub fn is_descendant(&self, token: TokenId, ancestor: TokenId) -> bool {
        let mut current = token;
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Tokens accepted through `token` alone: its descendants, minus the
    /// siblings and the subtrees of siblings below `token`.
    pub fn fallback_set(&self, token: TokenId, siblings: &TokenSet) -> TokenSet {
        let mut set = self.descendants(token);
        set.subtract(siblings);
        for sibling in siblings.iter() {
            if sibling != token && self.is_descendant(sibling, token) {
                set.subtract(&self.descendants(sibling));
            }
        }
        set
    }

    /// Union of [`fallback_set`](Self::fallback_set) over `set`, minus
    /// `exclude`.
    pub fn all_fallbacks(&self, set: &TokenSet, exclude: &TokenSet) -> TokenSet {
        let mut out = TokenSet::new();
        for token in set.iter() {
            out.union_with(&self.fallback_set(token, set));
        }
        out.subtract(exclude);
        out
    }

    /// `set` plus every token accepted through a member of it.
    pub fn expand(&self, set: &TokenSet) -> TokenSet {
        let mut out = set.clone();
        out.union_with(&self.all_fallbacks(set, set));
        out
    }

    /// Effective FIRST of each option at one choice point.
    ///
    /// Every token goes to the option listing its nearest listed
    /// ancestor-or-self; a token listed by several options goes to the
    /// first of them.
    pub fn resolve_choice(&self, options: &[TokenSet]) -> Vec<TokenSet> {
        let mut owner: IndexMap<TokenId, usize> = IndexMap::new();
        for (i, option) in options.iter().enumerate() {
            for token in option.iter() {
                owner.entry(token).or_insert(i);
            }
        }

        let mut out = vec![TokenSet::new(); options.len()];
        for (&token, &i) in &owner {
            out[i].insert(token);
            for descendant in self.descendants(token).iter() {
                if self.nearest_listed(descendant, &owner) == Some(token) {
                    out[i].insert(descendant);
                }
            }
        }
        out
    }

    fn nearest_listed(&self, token: TokenId, listed: &IndexMap<TokenId, usize>) -> Option<TokenId> {
        let mut current = token;
        loop {
            if listed.contains_key(&current) {
                return Some(current);
            }
            current = self.parent(current)?;
        }
    }
}
