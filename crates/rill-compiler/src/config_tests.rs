use crate::config::{Config, DEFAULT_PREFIX};
use crate::test_utils::{lower_ok, messages, token};

fn resolve(source: &str) -> (Config, Vec<String>) {
    let grammar = lower_ok(source);
    let (config, diagnostics) = Config::resolve(&grammar);
    (config, messages(&diagnostics))
}

#[test]
fn defaults() {
    let (config, errors) = resolve("A; a = A;");
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(config, Config::default());
    assert_eq!(config.upper_prefix(), "RILL_");
}

#[test]
fn prefix_is_upper_snake_cased_for_macros() {
    let (config, _) = resolve("%kwarg prefix myCalc_; A; a = A;");
    assert_eq!(config.prefix, "myCalc_");
    assert_eq!(config.upper_prefix(), "MY_CALC_");
}

#[test]
fn identifier_kwargs_are_validated() {
    let (config, errors) = resolve("%kwarg prefix {my-calc}; %kwarg error_fn {1st}; A; a = A;");
    assert_eq!(
        errors,
        ["kwarg `prefix` must be an identifier", "kwarg `error_fn` must be an identifier"]
    );
    assert_eq!(config.prefix, DEFAULT_PREFIX);
    assert_eq!(config.error_fn, None);
}

#[test]
fn location_type_may_be_any_type() {
    let (config, errors) = resolve(
        "%kwarg semloc_type {struct loc}; %kwarg span_fn loc_span; %kwarg zero_loc_fn loc_zero; A; a = A;",
    );
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(config.locations.unwrap().semloc_type, "struct loc");
}

#[test]
fn incomplete_locations() {
    let (config, errors) = resolve("%kwarg span_fn loc_span; A; a = A;");
    assert_eq!(
        errors,
        ["incomplete location configuration: missing `semloc_type`, `zero_loc_fn`"]
    );
    assert!(!config.has_locations());
}

#[test]
fn unknown_kwarg_warns() {
    let (_, errors) = resolve("%kwarg colour red; A; a = A;");
    assert_eq!(errors, ["unknown kwarg `colour`"]);
}

#[test]
fn end_token() {
    let grammar = lower_ok("A; STOP; %kwarg eof_token STOP; a = A STOP;");
    let (config, _) = Config::resolve(&grammar);
    assert_eq!(config.eof_token, Some(token(&grammar, "STOP")));

    let grammar = lower_ok("A; EOF; a = A EOF;");
    let (config, _) = Config::resolve(&grammar);
    assert_eq!(config.eof_token, Some(token(&grammar, "EOF")));

    let (config, errors) = resolve("A; %kwarg eof_token STOP; a = A;");
    assert_eq!(errors, ["`STOP` is not defined"]);
    assert_eq!(config.eof_token, None);
}
