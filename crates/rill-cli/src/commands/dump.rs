use std::path::PathBuf;

use rill_core::Colors;
use rill_plan::dump;

use super::grammar_loader::load_grammar;
use super::{Failure, Output, analyze, finish};

pub struct DumpArgs {
    pub grammar_path: PathBuf,
    pub json: bool,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    finish(execute(&args));
}

pub fn execute(args: &DumpArgs) -> Result<Output, Failure> {
    let grammar = load_grammar(&args.grammar_path)?;
    let (analyzed, warnings) = analyze(&grammar, args.color, false)?;
    let plan = analyzed.plan().map_err(Failure::error)?;

    let stdout = if args.json {
        let mut json = serde_json::to_string_pretty(&plan).map_err(Failure::error)?;
        json.push('\n');
        json
    } else {
        dump(&plan, Colors::new(args.color))
    };
    Ok(Output {
        stdout,
        stderr: warnings,
    })
}
