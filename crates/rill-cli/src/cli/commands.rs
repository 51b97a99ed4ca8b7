//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("rill")
        .about("LL(1) parser generator for resumable push parsers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(gen_command())
        .subcommand(check_command())
        .subcommand(dump_command())
}

/// Generate a parser.
pub fn gen_command() -> Command {
    Command::new("gen")
        .about("Generate a parser from a grammar")
        .override_usage("  rill gen <INPUT> <OUTPUT> [-l <LANG>]")
        .after_help(
            r#"EXAMPLES:
  rill gen calc.rill calc.c           # C parser
  rill gen calc.rill calc.c -l c      # explicit target"#,
        )
        .arg(grammar_path_arg())
        .arg(output_path_arg())
        .arg(lang_arg())
        .arg(color_arg())
}

/// Validate a grammar.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Validate a grammar")
        .override_usage("  rill check <INPUT> [--strict]")
        .after_help(
            r#"EXAMPLES:
  rill check calc.rill                # errors only
  rill check calc.rill --strict       # warnings fail too"#,
        )
        .arg(grammar_path_arg())
        .arg(strict_arg())
        .arg(color_arg())
}

/// Show the call-plan.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Show the compiled call-plan")
        .override_usage("  rill dump <INPUT> [--json]")
        .after_help(
            r#"EXAMPLES:
  rill dump calc.rill                 # text listing
  rill dump calc.rill --json          # machine-readable"#,
        )
        .arg(grammar_path_arg())
        .arg(json_arg())
        .arg(color_arg())
}
