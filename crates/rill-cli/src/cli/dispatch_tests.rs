//! Tests for CLI dispatch logic.

use std::path::PathBuf;

use super::*;
use crate::cli::commands::{check_command, dump_command, gen_command};

#[test]
fn gen_extracts_paths_and_lang() {
    let m = gen_command()
        .try_get_matches_from(["gen", "calc.rill", "calc.c", "-l", "c"])
        .unwrap();
    let params = GenParams::from_matches(&m);

    assert_eq!(params.grammar_path, PathBuf::from("calc.rill"));
    assert_eq!(params.output_path, PathBuf::from("calc.c"));
    assert_eq!(params.lang.as_deref(), Some("c"));
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn gen_requires_output() {
    let result = gen_command().try_get_matches_from(["gen", "calc.rill"]);
    assert!(result.is_err());
}

#[test]
fn check_strict_and_color() {
    let m = check_command()
        .try_get_matches_from(["check", "calc.rill", "--strict", "--color", "never"])
        .unwrap();
    let params = CheckParams::from_matches(&m);

    assert!(params.strict);
    assert_eq!(params.color, ColorChoice::Never);
    assert!(!params.color.should_colorize());
}

#[test]
fn dump_json_flag() {
    let m = dump_command()
        .try_get_matches_from(["dump", "calc.rill", "--json", "--color", "always"])
        .unwrap();
    let params = DumpParams::from_matches(&m);

    assert_eq!(params.grammar_path, PathBuf::from("calc.rill"));
    assert!(params.json);
    assert!(params.color.should_colorize());
}

#[test]
fn dump_rejects_output_positional() {
    let result = dump_command().try_get_matches_from(["dump", "calc.rill", "calc.c"]);
    assert!(result.is_err());
}

#[test]
fn color_rejects_unknown_mode() {
    let result = check_command().try_get_matches_from(["check", "calc.rill", "--color", "sometimes"]);
    assert!(result.is_err());
}

#[test]
fn cli_lists_subcommands() {
    let cli = build_cli();
    let names: Vec<&str> = cli.get_subcommands().map(|c| c.get_name()).collect();
    assert_eq!(names, ["gen", "check", "dump"]);
}
