use std::fs;
use std::path::PathBuf;

use indoc::indoc;
use tempfile::TempDir;

use super::check::{self, CheckArgs};
use super::dump::{self, DumpArgs};
use super::generate::{self, GenArgs};

const CALC: &str = indoc! {"
    %type str {char*} {free($$);};
    STR:str; PLUS; MINUS; EOF;
    sum:str = diff:a *(PLUS diff:b {$$ = cat($a, $b);}:a) EOF {$$ = $a;};
    diff:str = STR:a *(MINUS STR:b {$$ = cat($a, $b);}:a) {$$ = $a;};
"};

fn write_grammar(dir: &TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("calc.rill");
    fs::write(&path, source).unwrap();
    path
}

fn gen_args(grammar_path: PathBuf, output_path: PathBuf) -> GenArgs {
    GenArgs {
        grammar_path,
        output_path,
        lang: None,
        color: false,
    }
}

#[test]
fn gen_writes_parser_with_line_directives() {
    let dir = TempDir::new().unwrap();
    let grammar = write_grammar(&dir, CALC);
    let output = dir.path().join("calc.c");

    let result = generate::execute(&gen_args(grammar.clone(), output.clone())).unwrap();
    assert!(result.stdout.is_empty());
    assert!(result.stderr.is_empty());

    let code = fs::read_to_string(&output).unwrap();
    assert!(code.starts_with("/* Generated by rill. Do not edit. */"));
    assert!(code.contains("int rill_parse_sum(rill_parser *p, int kind, rill_semval sem)"));
    let directive = format!("#line 3 \"{}\"", grammar.display());
    assert!(code.contains(&directive), "missing `{directive}`");
    assert!(code.contains(&format!("\"{}\"", output.display())));
}

#[test]
fn gen_rejects_unknown_language() {
    let dir = TempDir::new().unwrap();
    let grammar = write_grammar(&dir, CALC);
    let output = dir.path().join("calc.cob");
    let mut args = gen_args(grammar, output.clone());
    args.lang = Some("cobol".to_string());

    let failure = generate::execute(&args).unwrap_err();
    assert_eq!(failure.0, "error: no emitter for language `cobol`\n");
    assert!(!output.exists());
}

#[test]
fn gen_reports_grammar_errors() {
    let dir = TempDir::new().unwrap();
    let grammar = write_grammar(&dir, "A; a = A b;");
    let output = dir.path().join("calc.c");

    let failure = generate::execute(&gen_args(grammar, output.clone())).unwrap_err();
    assert!(failure.0.contains("`b` is not defined"), "{}", failure.0);
    assert!(!output.exists());
}

#[test]
fn missing_grammar_file() {
    let dir = TempDir::new().unwrap();
    let args = CheckArgs {
        grammar_path: dir.path().join("absent.rill"),
        strict: false,
        color: false,
    };

    let failure = check::execute(&args).unwrap_err();
    assert!(failure.0.starts_with("error: failed to read '"), "{}", failure.0);
}

#[test]
fn check_warnings_fail_only_when_strict() {
    let dir = TempDir::new().unwrap();
    let grammar = write_grammar(&dir, "A; B; a = A;");
    let mut args = CheckArgs {
        grammar_path: grammar,
        strict: false,
        color: false,
    };

    let result = check::execute(&args).unwrap();
    assert!(result.stdout.is_empty());
    assert!(result.stderr.contains("warning"), "{}", result.stderr);

    args.strict = true;
    let failure = check::execute(&args).unwrap_err();
    assert!(failure.0.contains("warning"), "{}", failure.0);
}

#[test]
fn check_clean_grammar_is_silent() {
    let dir = TempDir::new().unwrap();
    let args = CheckArgs {
        grammar_path: write_grammar(&dir, CALC),
        strict: true,
        color: false,
    };

    let result = check::execute(&args).unwrap();
    assert!(result.stdout.is_empty());
    assert!(result.stderr.is_empty());
}

#[test]
fn dump_text() {
    let dir = TempDir::new().unwrap();
    let args = DumpArgs {
        grammar_path: write_grammar(&dir, "A; B; a = A B;"),
        json: false,
        color: false,
    };

    let result = dump::execute(&args).unwrap();
    assert!(result.stdout.contains("[roots]\na → F0"), "{}", result.stdout);
    assert!(result.stdout.contains("[F0 a]"));
}

#[test]
fn dump_json() {
    let dir = TempDir::new().unwrap();
    let args = DumpArgs {
        grammar_path: write_grammar(&dir, "A; B; a = A B;"),
        json: true,
        color: false,
    };

    let result = dump::execute(&args).unwrap();
    let plan: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(plan["roots"][0]["name"], "a");
    assert_eq!(plan["tokens"][1]["name"], "B");
    assert_eq!(plan["functions"][0]["states"][0]["op"], "match");
}
