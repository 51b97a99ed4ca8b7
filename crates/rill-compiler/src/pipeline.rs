//! Staged facade over the compiler passes.
//!
//! ```ignore
//! let analyzed = Pipeline::new(source).parse()?.analyze();
//! let c_source = analyzed.emit(None, None)?;
//! ```

use rill_plan::ParserPlan;

use crate::analyze::{self, Analysis, Bindings, FallbackMap};
use crate::compile::PlanBuilder;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::emit::{EmitInput, LineFiles, emitter_for};
use crate::ir::{Grammar, lower};
use crate::parser::lexer::lex;
use crate::parser::{Parse, Parser, parse_with_parser};
use crate::{DEFAULT_GENERATOR, Error, Result};

const DEFAULT_EXEC_FUEL: u32 = 1_000_000;
const DEFAULT_RECURSION_FUEL: u32 = 512;

pub struct Pipeline<'s> {
    source: &'s str,
    exec_fuel: Option<u32>,
    recursion_fuel: Option<u32>,
}

impl<'s> Pipeline<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            exec_fuel: Some(DEFAULT_EXEC_FUEL),
            recursion_fuel: Some(DEFAULT_RECURSION_FUEL),
        }
    }

    /// Parser operation budget; `None` disables the limit.
    pub fn with_exec_fuel(mut self, limit: Option<u32>) -> Self {
        self.exec_fuel = limit;
        self
    }

    /// Nesting budget; `None` disables the limit.
    pub fn with_recursion_fuel(mut self, limit: Option<u32>) -> Self {
        self.recursion_fuel = limit;
        self
    }

    /// Parses the DSL. Syntax errors end the pipeline here.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(self) -> Result<ParsedGrammar<'s>> {
        let parser = Parser::new(self.source, lex(self.source))
            .with_exec_fuel(self.exec_fuel)
            .with_recursion_fuel(self.recursion_fuel);
        let (parse, diagnostics) = parse_with_parser(parser)?;
        if diagnostics.has_errors() {
            return Err(Error::InvalidGrammar(diagnostics));
        }
        Ok(ParsedGrammar {
            source: self.source,
            parse,
            diagnostics,
        })
    }
}

#[derive(Debug)]
pub struct ParsedGrammar<'s> {
    source: &'s str,
    parse: Parse,
    diagnostics: Diagnostics,
}

impl<'s> ParsedGrammar<'s> {
    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn parse(&self) -> &Parse {
        &self.parse
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Lowers the tree and runs every analysis pass.
    ///
    /// LL(1) analysis is skipped when name resolution or binding checks
    /// already failed; its findings would only repeat those errors.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn analyze(self) -> AnalyzedGrammar<'s> {
        let mut diagnostics = self.diagnostics;

        let (grammar, lowered) = match self.parse.root() {
            Some(root) => lower(&root, self.source),
            None => (Grammar::default(), Diagnostics::new()),
        };
        diagnostics.extend(lowered);

        let (config, configured) = Config::resolve(&grammar);
        diagnostics.extend(configured);
        diagnostics.extend(analyze::resolve(&grammar, &config));

        let (fallbacks, extracted) = FallbackMap::extract(&grammar);
        diagnostics.extend(extracted);
        let (bindings, inferred) = Bindings::infer(&grammar);
        diagnostics.extend(inferred);

        let analysis = if diagnostics.has_errors() {
            Analysis::default()
        } else {
            let (analysis, analyzed) = analyze::analyze(&grammar, &fallbacks);
            diagnostics.extend(analyzed);
            analysis
        };

        tracing::debug!(
            tokens = grammar.tokens.len(),
            expressions = grammar.expressions.len(),
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "grammar analyzed"
        );

        AnalyzedGrammar {
            source: self.source,
            grammar,
            config,
            fallbacks,
            analysis,
            bindings,
            diagnostics,
        }
    }
}

#[derive(Debug)]
pub struct AnalyzedGrammar<'s> {
    source: &'s str,
    grammar: Grammar,
    config: Config,
    fallbacks: FallbackMap,
    analysis: Analysis,
    bindings: Bindings,
    diagnostics: Diagnostics,
}

impl<'s> AnalyzedGrammar<'s> {
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fallbacks(&self) -> &FallbackMap {
        &self.fallbacks
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Errors and warnings of every pass, in report order.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Builds and verifies the call-plan.
    pub fn plan(&self) -> Result<ParserPlan> {
        if !self.is_valid() {
            return Err(Error::InvalidGrammar(self.diagnostics.clone()));
        }
        let plan = PlanBuilder::new(&self.grammar, &self.analysis, &self.fallbacks, &self.bindings)
            .end_token(self.config.eof_token)
            .build();
        plan.verify()?;
        Ok(plan)
    }

    /// Generator used for `requested`, or for the grammar's own choice.
    pub fn generator(&self, requested: Option<&str>) -> Result<String> {
        match (requested, self.grammar.generator.as_deref()) {
            (Some(requested), Some(declared)) if requested != declared => {
                Err(Error::GeneratorMismatch {
                    grammar: declared.to_string(),
                    requested: requested.to_string(),
                })
            }
            (Some(lang), _) | (None, Some(lang)) => Ok(lang.to_string()),
            (None, None) => Ok(DEFAULT_GENERATOR.to_string()),
        }
    }

    /// Generates parser source for `lang` (default: the grammar's generator).
    ///
    /// With `line_files`, snippets are wrapped in `#line` directives that
    /// point back into the grammar file.
    pub fn emit(&self, lang: Option<&str>, line_files: Option<LineFiles<'_>>) -> Result<String> {
        let lang = self.generator(lang)?;
        let emitter = emitter_for(&lang).ok_or_else(|| Error::UnknownLanguage(lang.clone()))?;
        let plan = self.plan()?;
        let input = EmitInput {
            grammar: &self.grammar,
            plan: &plan,
            config: &self.config,
            line_files,
        };
        Ok(emitter.emit(&input)?)
    }
}
