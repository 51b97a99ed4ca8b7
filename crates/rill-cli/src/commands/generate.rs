use std::fs;
use std::path::PathBuf;

use rill_compiler::LineFiles;

use super::grammar_loader::load_grammar;
use super::{Failure, Output, analyze, finish};

pub struct GenArgs {
    pub grammar_path: PathBuf,
    pub output_path: PathBuf,
    pub lang: Option<String>,
    pub color: bool,
}

pub fn run(args: GenArgs) {
    finish(execute(&args));
}

pub fn execute(args: &GenArgs) -> Result<Output, Failure> {
    let grammar = load_grammar(&args.grammar_path)?;
    let (analyzed, warnings) = analyze(&grammar, args.color, false)?;

    let output_name = args.output_path.to_string_lossy();
    let files = LineFiles {
        grammar: &grammar.path,
        output: &output_name,
    };
    let fail = |e: &dyn std::fmt::Display| Failure(format!("{warnings}error: {e}\n"));
    let code = analyzed
        .emit(args.lang.as_deref(), Some(files))
        .map_err(|e| fail(&e))?;
    fs::write(&args.output_path, code).map_err(|e| {
        fail(&format!(
            "failed to write '{}': {e}",
            args.output_path.display()
        ))
    })?;
    tracing::debug!(output = %args.output_path.display(), "parser written");

    Ok(Output {
        stdout: String::new(),
        stderr: warnings,
    })
}
