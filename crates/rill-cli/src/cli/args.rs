//! Shared argument builders for CLI commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

use super::ColorChoice;

/// Grammar file (positional). `-` reads stdin.
pub fn grammar_path_arg() -> Arg {
    Arg::new("grammar_path")
        .value_name("INPUT")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Grammar file, or - for stdin")
}

/// Generated parser file (positional).
pub fn output_path_arg() -> Arg {
    Arg::new("output_path")
        .value_name("OUTPUT")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("File to write the generated parser to")
}

/// Target language (-l/--lang).
pub fn lang_arg() -> Arg {
    Arg::new("lang")
        .short('l')
        .long("lang")
        .value_name("LANG")
        .help("Target language (default: the grammar's %generator, else c)")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(value_parser!(ColorChoice))
        .help("Colorize output")
}

/// Treat warnings as errors (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Treat warnings as errors")
}

/// Output JSON (--json).
pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the call-plan as JSON")
}
