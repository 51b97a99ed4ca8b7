use std::path::PathBuf;

use super::grammar_loader::load_grammar;
use super::{Failure, Output, analyze, finish};

pub struct CheckArgs {
    pub grammar_path: PathBuf,
    pub strict: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    finish(execute(&args));
}

/// Silent on success apart from warnings.
pub fn execute(args: &CheckArgs) -> Result<Output, Failure> {
    let grammar = load_grammar(&args.grammar_path)?;
    let (_, warnings) = analyze(&grammar, args.color, args.strict)?;
    Ok(Output {
        stdout: String::new(),
        stderr: warnings,
    })
}
