//! Subcommand implementations.
//!
//! Each command has an `execute` that returns what it would print, and a
//! `run` that prints it and sets the exit status.

pub mod check;
pub mod dump;
pub mod generate;
pub mod grammar_loader;

#[cfg(test)]
mod commands_tests;

use rill_compiler::{AnalyzedGrammar, Diagnostics, Error, Pipeline};

use grammar_loader::Grammar;

/// Output of a successful command.
#[derive(Debug, Default)]
pub struct Output {
    pub stdout: String,
    /// Warnings.
    pub stderr: String,
}

/// A failed command, with everything it reports on stderr.
#[derive(Debug)]
pub struct Failure(pub String);

impl Failure {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Failure(format!("error: {message}\n"))
    }
}

/// Prints the outcome; failures exit with status 1.
pub fn finish(result: Result<Output, Failure>) {
    match result {
        Ok(output) => {
            eprint!("{}", output.stderr);
            print!("{}", output.stdout);
        }
        Err(Failure(message)) => {
            eprint!("{message}");
            std::process::exit(1);
        }
    }
}

/// Parses and analyzes a grammar. Errors, and warnings under `strict`, fail;
/// otherwise the rendered warnings come back with the grammar.
pub fn analyze(
    grammar: &Grammar,
    color: bool,
    strict: bool,
) -> Result<(AnalyzedGrammar<'_>, String), Failure> {
    let render = |diagnostics: &Diagnostics| {
        if diagnostics.is_empty() {
            return String::new();
        }
        let mut text = diagnostics
            .printer()
            .source(&grammar.source)
            .path(&grammar.path)
            .colored(color)
            .render();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    };

    let analyzed = match Pipeline::new(&grammar.source).parse() {
        Ok(parsed) => parsed.analyze(),
        Err(Error::InvalidGrammar(diagnostics)) => return Err(Failure(render(&diagnostics))),
        Err(e) => return Err(Failure::error(e)),
    };

    let diagnostics = analyzed.diagnostics();
    tracing::debug!(
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "analyzed {}",
        grammar.path
    );
    let rendered = render(diagnostics);
    if diagnostics.has_errors() || (strict && diagnostics.has_warnings()) {
        return Err(Failure(rendered));
    }
    Ok((analyzed, rendered))
}
