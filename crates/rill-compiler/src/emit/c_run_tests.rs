//! Compiles generated parsers with the system C compiler and drives them
//! through a small harness. Skipped when `cc` is not available.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use indoc::indoc;
use tempfile::TempDir;

use crate::test_utils::analyzed_ok;

/// Feeds `NAME` / `NAME=text` arguments as tokens of the `str` type, `reset`
/// resets the parser. Prints the final status, the result and how many
/// strings are still allocated.
const DRIVER: &str = r#"#include <stdio.h>
#include <stdlib.h>
#include <string.h>

static int allocs;
static int frees;

static char *copy(const char *s)
{
    char *d = malloc(strlen(s) + 1);

    allocs++;
    return strcpy(d, s);
}

static void release(char *s)
{
    frees++;
    free(s);
}

static char *cat(char *a, char *o, char *b)
{
    char *d = malloc(strlen(a) + strlen(o) + strlen(b) + 1);

    allocs++;
    strcpy(d, a);
    strcat(d, o);
    strcat(d, b);
    release(a);
    release(o);
    release(b);
    return d;
}

static void note(void)
{
}

#include "parser.c"

static int kind_of(const char *word, size_t len)
{
    int kind;

    for (kind = 0; kind < RILL_TOKEN_COUNT; kind++) {
        const char *name = rill_token_name(kind);

        if (strlen(name) == len && strncmp(name, word, len) == 0)
            return kind;
    }
    return RILL_TOKEN_COUNT;
}

int main(int argc, char **argv)
{
    RILL_PARSER_DECLARE(p, 32, 64);
    rill_semval out;
    int status = RILL_OK;
    int i;

    rill_parser_init(&p);
    for (i = 1; i < argc; i++) {
        const char *eq = strchr(argv[i], '=');
        size_t len = eq ? (size_t)(eq - argv[i]) : strlen(argv[i]);
        int kind = kind_of(argv[i], len);
        rill_semval sem;

        if (strcmp(argv[i], "reset") == 0) {
            rill_parser_reset(&p);
            printf("reset live %d\n", allocs - frees);
            continue;
        }
        memset(&sem, 0, sizeof sem);
        if (eq)
            sem.str = copy(eq + 1);
        status = ROOT(&p, kind, sem);
        /* unknown kinds leave `sem` with the caller */
        if (kind == RILL_TOKEN_COUNT && eq)
            release(sem.str);
    }
    printf("status %d\n", status);
    if (rill_result(&p, &out)) {
        printf("result %s\n", out.str);
        release(out.str);
    }
    printf("live %d\n", allocs - frees);
    return 0;
}
"#;

const CALC: &str = indoc! {r#"
    %type str {char*} {release($$);};
    STR:str; PLUS:str; MINUS:str; EOF;
    sum:str = diff:a *(PLUS:o diff:b {$$ = cat($a, $o, $b);}:a) EOF {$$ = $a;};
    diff:str = STR:a *(MINUS:o STR:b {$$ = cat($a, $o, $b);}:a) {$$ = $a;};
"#};

const RECOVER: &str = indoc! {r#"
    %type str {char*} {release($$);};
    NUM:str; SEMI; JUNK:str; EOF;
    a:str = <NUM:x ? {$$ = copy(rill_token_name($error));} {$$ = copy("-1");}:x> SEMI {$$ = $x;} EOF;
"#};

struct Program {
    _dir: TempDir,
    exe: PathBuf,
}

impl Program {
    /// Compiles `grammar` with the driver calling `rill_parse_<root>`.
    fn build(grammar: &str, root: &str) -> Option<Program> {
        let cc = Command::new("cc").arg("--version").output();
        if !cc.is_ok_and(|o| o.status.success()) {
            eprintln!("skipped: no `cc` on PATH");
            return None;
        }

        let dir = TempDir::new().unwrap();
        let parser = analyzed_ok(grammar).emit(None, None).unwrap();
        fs::write(dir.path().join("parser.c"), parser).unwrap();
        let driver = DRIVER.replace("ROOT", &format!("rill_parse_{root}"));
        fs::write(dir.path().join("main.c"), driver).unwrap();

        let exe = dir.path().join("driver");
        let compiled = Command::new("cc")
            .arg("-o")
            .arg(&exe)
            .arg("main.c")
            .current_dir(dir.path())
            .output()
            .unwrap();
        assert!(
            compiled.status.success(),
            "cc failed:\n{}",
            String::from_utf8_lossy(&compiled.stderr)
        );
        Some(Program { _dir: dir, exe })
    }

    /// Runs the driver; returns stdout and stderr.
    fn run(&self, input: &str) -> (String, String) {
        let output = Command::new(&self.exe)
            .args(input.split_whitespace())
            .output()
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(output.status.success(), "driver crashed:\n{stdout}{stderr}");
        (stdout, stderr)
    }
}

#[test]
fn arithmetic() {
    let Some(calc) = Program::build(CALC, "sum") else {
        return;
    };

    let (stdout, stderr) = calc.run(
        "STR=QWER PLUS=+ STR=ASDF PLUS=+ STR=ZXVC MINUS=- STR=qwer MINUS=- STR=asdf MINUS=- STR=zxvc EOF",
    );
    assert_eq!(stdout, "status 1\nresult QWER+ASDF+ZXVC-qwer-asdf-zxvc\nlive 0\n");
    assert!(stderr.is_empty(), "{stderr}");

    let (stdout, stderr) = calc.run("STR=a STR=b");
    assert_eq!(stdout, "status 2\nlive 0\n");
    assert_eq!(stderr, "syntax error: unexpected STR, expected PLUS, MINUS, EOF\n");

    let (stdout, _) = calc.run("STR=a PLUS=+ STR=b reset STR=c EOF");
    assert_eq!(stdout, "reset live 0\nstatus 1\nresult c\nlive 0\n");

    let (stdout, stderr) = calc.run("STR=a BOGUS=x PLUS=+ STR=b EOF");
    assert_eq!(stdout, "status 1\nresult a+b\nlive 0\n");
    assert!(stderr.is_empty(), "{stderr}");
}

#[test]
fn recovery() {
    let Some(recover) = Program::build(RECOVER, "a") else {
        return;
    };

    let (stdout, stderr) = recover.run("JUNK=j JUNK=k SEMI EOF");
    assert_eq!(stdout, "status 1\nresult -1\nlive 0\n");
    assert_eq!(stderr, "syntax error: unexpected JUNK, expected NUM\n");

    let (stdout, _) = recover.run("NUM=7 SEMI EOF");
    assert_eq!(stdout, "status 1\nresult 7\nlive 0\n");

    let (stdout, stderr) = recover.run("JUNK=j EOF");
    assert_eq!(stdout, "status 2\nlive 0\n");
    assert_eq!(
        stderr,
        "syntax error: unexpected JUNK, expected NUM\nsyntax error: unexpected EOF, expected SEMI\n"
    );
}

#[test]
fn bound_snippet_without_output_owns_nothing() {
    let Some(program) = Program::build(
        "%type str {char*} {release($$);}; A; B; a:str = A {note();}:y B {$$ = $y;};",
        "a",
    ) else {
        return;
    };

    let (stdout, _) = program.run("A A");
    assert_eq!(stdout, "status 2\nlive 0\n");
}
