//! Calculator scenarios: precedence, associativity, number shapes,
//! multi-line input and the two error families.

use std::str::FromStr;

use bnfkit_core::{ErrorKind, EvalError, ParseOptions};
use bnfkit_grammars::calc::{self, calculator};
use bnfkit_grammars::CalcError;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn eval(source: &str) -> Decimal {
    calc::evaluate(source).unwrap_or_else(|e| panic!("{source:?}: {e}"))
}

// ──────────────────────────────────────────────
// 1. Values
// ──────────────────────────────────────────────

#[test]
fn basic_arithmetic() {
    assert_eq!(eval("1 + 2"), dec("3"));
    assert_eq!(eval("3 * 4"), dec("12"));
    assert_eq!(eval("10 / 4"), dec("2.5"));
    assert_eq!(eval("7"), dec("7"));
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(eval("1 - 2 - 3"), dec("-4"));
    assert_eq!(eval("8 / 2 / 2"), dec("2"));
}

#[test]
fn multiplication_binds_tighter() {
    assert_eq!(eval("1 + 2 * 3 + 4"), dec("11"));
    assert_eq!(eval("(1 + 2) * (3 + 4)"), dec("21"));
}

#[test]
fn division_is_exact() {
    assert_eq!(eval("1 / (2 + 3) + 4"), dec("4.2"));
}

#[test]
fn scientific_and_signed_constants() {
    assert_eq!(eval("1.5e+2 * -2"), dec("-300"));
    assert_eq!(eval("2.5e-1 + .75"), dec("1"));
    assert_eq!(eval("-3. * +2"), dec("-6"));
}

#[test]
fn line_breaks_are_whitespace() {
    assert_eq!(eval("1 +\n2 *\n3"), dec("7"));
    assert_eq!(eval("1 +\r\n2 *\r\n3"), dec("7"));
}

#[test]
fn evaluation_is_repeatable() {
    let grammar = calculator();
    let term = grammar.parse("(1 + 2) / 4");
    assert!(term.is_ok(), "{term}");
    let first = grammar.evaluate(&term).unwrap();
    let second = grammar.evaluate(&term).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, dec("0.75"));
}

// ──────────────────────────────────────────────
// 2. Syntax errors
// ──────────────────────────────────────────────

#[test]
fn malformed_expressions_are_syntax_errors() {
    for source in ["+", "1 + 2 * 3 + 4)", "1 + ", "", "(1 + 2", "1 2"] {
        match calc::evaluate(source) {
            Err(CalcError::Syntax(err)) => assert_eq!(err.kind, ErrorKind::Syntax, "{source:?}"),
            other => panic!("{source:?} should be a syntax error, got {other:?}"),
        }
    }
}

#[test]
fn syntax_error_reports_line_and_column() {
    let err = calc::evaluate("1 +\n2)").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: stopped at \")\" (2, 2)");

    let err = calc::evaluate("1 +\r\n2)").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: stopped at \")\" (2, 2)");
}

#[test]
fn leftover_input_stops_at_the_first_unconsumed_token() {
    let err = calc::evaluate("1 + ").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: stopped at \"+\" (1, 3)");

    let err = calc::evaluate("2 * 3 4").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: stopped at \"4\" (1, 7)");
}

#[test]
fn unmatched_root_stops_at_the_furthest_failure() {
    let err = calc::evaluate("(1 + 2").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: stopped at end of input");
}

#[test]
fn depth_limit_is_reported_as_a_term_error() {
    let source = format!("{}1{}", "(".repeat(12), ")".repeat(12));
    let options = ParseOptions::default().max_depth(32);
    let err = calc::evaluate_with(&source, &options).unwrap_err();
    match &err {
        CalcError::Aborted(term_err) => assert_eq!(term_err.kind, ErrorKind::DepthExceeded),
        other => panic!("expected depth error, got {other:?}"),
    }
    assert!(
        err.to_string()
            .starts_with("Parse aborted: rule nesting exceeded the limit of 32 at \"(\""),
        "{err}"
    );
    assert_eq!(calc::evaluate(&source).unwrap(), dec("1"));
}

#[test]
fn deep_nesting_with_defaults_fits_a_small_stack() {
    let handle = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let source = format!("{}1{}", "(".repeat(60), ")".repeat(60));
            calc::evaluate(&source)
        })
        .unwrap();
    match handle.join().expect("parser thread should not overflow") {
        Err(CalcError::Aborted(err)) => assert_eq!(err.kind, ErrorKind::DepthExceeded),
        other => panic!("expected depth error, got {other:?}"),
    }
}

#[test]
fn expired_deadline_is_not_a_syntax_error() {
    let options = ParseOptions::default().deadline(std::time::Instant::now());
    let err = calc::evaluate_with("1 + 2", &options).unwrap_err();
    assert!(matches!(&err, CalcError::Aborted(e) if e.kind == ErrorKind::TimedOut), "{err:?}");
    assert!(err.to_string().starts_with("Parse aborted: parse deadline exceeded at"));
}

// ──────────────────────────────────────────────
// 3. Evaluation errors
// ──────────────────────────────────────────────

#[test]
fn whitespace_inside_a_number_is_an_evaluation_error() {
    let err = calc::evaluate("1 .5").unwrap_err();
    assert!(
        matches!(err, CalcError::Eval(EvalError::InvalidText { .. })),
        "{err:?}"
    );
    assert!(err.to_string().starts_with("Evaluation error: "));
}

#[test]
fn overflow_is_an_evaluation_error() {
    let err = calc::evaluate("1.0e999999").unwrap_err();
    assert!(matches!(err, CalcError::Eval(_)), "{err:?}");
}
