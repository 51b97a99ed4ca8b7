//! Test helpers shared by the pass tests.

use rill_core::Symbol;
use rill_plan::{ParserPlan, TokenId, TokenSet};

use crate::analyze::{self, Analysis, FallbackMap};
use crate::diagnostics::Diagnostics;
use crate::ir::{Grammar, lower};
use crate::parser::parse;
use crate::pipeline::{AnalyzedGrammar, Pipeline};

/// Parses and lowers `source`, which must be free of parse errors.
pub fn lower_source(source: &str) -> (Grammar, Diagnostics) {
    let (parse, diagnostics) = parse(source).unwrap();
    assert!(
        diagnostics.is_empty(),
        "unexpected parse diagnostics:\n{}",
        diagnostics.printer().source(source).render()
    );
    lower(&parse.root().unwrap(), source)
}

/// Like [`lower_source`], but lowering must be clean as well.
pub fn lower_ok(source: &str) -> Grammar {
    let (grammar, diagnostics) = lower_source(source);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics:\n{}",
        diagnostics.printer().source(source).render()
    );
    grammar
}

/// Lowers `source` and runs the fallback extraction and LL(1) analysis.
pub fn analyze_source(source: &str) -> (Grammar, FallbackMap, Analysis, Diagnostics) {
    let grammar = lower_ok(source);
    let (fallbacks, mut diagnostics) = FallbackMap::extract(&grammar);
    let (analysis, analyzed) = analyze::analyze(&grammar, &fallbacks);
    diagnostics.extend(analyzed);
    (grammar, fallbacks, analysis, diagnostics)
}

pub fn sym(grammar: &Grammar, name: &str) -> Symbol {
    grammar
        .interner
        .get(name)
        .unwrap_or_else(|| panic!("`{name}` is not interned"))
}

pub fn token(grammar: &Grammar, name: &str) -> TokenId {
    grammar
        .token_id(sym(grammar, name))
        .unwrap_or_else(|| panic!("`{name}` is not a token"))
}

pub fn tokens(grammar: &Grammar, names: &[&str]) -> TokenSet {
    names.iter().map(|n| token(grammar, n)).collect()
}

/// Rendered message texts, in report order.
pub fn messages(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics.iter().map(|d| d.message().to_string()).collect()
}

/// Runs the whole front end; `source` must be a valid grammar.
pub fn analyzed_ok(source: &str) -> AnalyzedGrammar<'_> {
    let analyzed = Pipeline::new(source).parse().unwrap().analyze();
    assert!(
        analyzed.is_valid(),
        "unexpected diagnostics:\n{}",
        analyzed.diagnostics().printer().source(source).render()
    );
    analyzed
}

pub fn plan_ok(source: &str) -> ParserPlan {
    analyzed_ok(source).plan().unwrap()
}

/// Messages of every pass for a grammar that parses.
pub fn pipeline_messages(source: &str) -> Vec<String> {
    let analyzed = Pipeline::new(source).parse().unwrap().analyze();
    messages(analyzed.diagnostics())
}
