//! Arithmetic calculator.
//!
//! ```text
//! calc                      := expression
//! expression                := additive-expression
//! additive-expression       := multiplicative-expression additive-expression-rest*
//! additive-expression-rest  := "+" multiplicative-expression | "-" multiplicative-expression
//! multiplicative-expression := unary-expression multiplicative-expression-rest*
//! multiplicative-expression-rest := "*" unary-expression | "/" unary-expression
//! unary-expression          := postfix-expression
//! postfix-expression        := primary-expression
//! primary-expression        := literal | "(" expression ")"
//! literal                   := floating-constant | integer-constant
//! floating-constant         := floating-real-part "e" integer-constant | floating-real-part
//! floating-real-part        := [sign] <NUMLIT> "." <NUMLIT> | [sign] <NUMLIT> "." | [sign] "." <NUMLIT>
//! integer-constant          := [sign] <NUMLIT>
//! sign                      := "+" | "-"
//! ```
//!
//! Values are exact decimals, so `1 / (2 + 3) + 4` is `4.2`.

use std::str::FromStr;
use std::sync::OnceLock;

use bnfkit_core::grammar::{lit, many, optional, rule, token_type};
use bnfkit_core::token::kind;
use bnfkit_core::{
    Content, ErrorKind, Eval, EvalError, Grammar, GrammarError, ParseOptions, Term, TermError,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// Exponents beyond this saturate instead of looping digit by digit.
const MAX_EXPONENT: u32 = 64;

/// Failure to compute an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("Syntax error: stopped at {}", .0.stopped_at())]
    Syntax(TermError),

    /// The parse hit its depth limit or deadline.
    #[error("Parse aborted: {} at {}", .0.message, .0.stopped_at())]
    Aborted(TermError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

impl CalcError {
    /// Classify a parse error by its kind.
    pub fn from_parse(err: TermError) -> Self {
        match err.kind {
            ErrorKind::DepthExceeded | ErrorKind::TimedOut => CalcError::Aborted(err),
            ErrorKind::Syntax | ErrorKind::UnterminatedLiteral => CalcError::Syntax(err),
        }
    }
}

static CALCULATOR: OnceLock<Grammar<Decimal>> = OnceLock::new();

/// The shared calculator grammar.
pub fn calculator() -> &'static Grammar<Decimal> {
    CALCULATOR.get_or_init(|| {
        build_calculator().unwrap_or_else(|e| panic!("calculator grammar is malformed: {e}"))
    })
}

/// Build a fresh calculator grammar.
pub fn build_calculator() -> Result<Grammar<Decimal>, GrammarError> {
    Grammar::<Decimal>::builder("calc")
        .rule("calc", vec![vec![rule("expression")]])
        .rule("expression", vec![vec![rule("additive-expression")]])
        .rule_with(
            "additive-expression",
            vec![vec![
                rule("multiplicative-expression"),
                many("additive-expression-rest"),
            ]],
            fold_operations,
        )
        .rule(
            "additive-expression-rest",
            vec![
                vec![lit("+"), rule("multiplicative-expression")],
                vec![lit("-"), rule("multiplicative-expression")],
            ],
        )
        .rule_with(
            "multiplicative-expression",
            vec![vec![
                rule("unary-expression"),
                many("multiplicative-expression-rest"),
            ]],
            fold_operations,
        )
        .rule(
            "multiplicative-expression-rest",
            vec![
                vec![lit("*"), rule("unary-expression")],
                vec![lit("/"), rule("unary-expression")],
            ],
        )
        .rule("unary-expression", vec![vec![rule("postfix-expression")]])
        .rule("postfix-expression", vec![vec![rule("primary-expression")]])
        .rule_with(
            "primary-expression",
            vec![
                vec![rule("literal")],
                vec![lit("("), rule("expression"), lit(")")],
            ],
            |term, eval| {
                let inner = term
                    .subterms()
                    .next()
                    .ok_or_else(|| EvalError::failed(term.rule(), "empty primary expression"))?;
                eval.evaluate(inner)
            },
        )
        .rule(
            "literal",
            vec![vec![rule("floating-constant")], vec![rule("integer-constant")]],
        )
        .rule_with(
            "floating-constant",
            vec![
                vec![rule("floating-real-part"), lit("e"), rule("integer-constant")],
                vec![rule("floating-real-part")],
            ],
            |term, _| number_text(term),
        )
        .rule(
            "floating-real-part",
            vec![
                vec![
                    optional("sign"),
                    token_type(kind::NUMLIT),
                    lit("."),
                    token_type(kind::NUMLIT),
                ],
                vec![optional("sign"), token_type(kind::NUMLIT), lit(".")],
                vec![optional("sign"), lit("."), token_type(kind::NUMLIT)],
            ],
        )
        .rule_with(
            "integer-constant",
            vec![vec![optional("sign"), token_type(kind::NUMLIT)]],
            |term, _| number_text(term),
        )
        .rule("sign", vec![vec![lit("+")], vec![lit("-")]])
        .build()
}

/// Parse and evaluate `source`.
pub fn evaluate(source: &str) -> Result<Decimal, CalcError> {
    evaluate_with(source, &ParseOptions::default())
}

pub fn evaluate_with(source: &str, options: &ParseOptions) -> Result<Decimal, CalcError> {
    let grammar = calculator();
    let term = grammar.parse_with(source, options);
    if let Some(err) = term.error() {
        return Err(CalcError::from_parse(err.clone()));
    }
    let value = grammar.evaluate(&term)?;
    debug!(%value, "evaluated");
    Ok(value.normalize())
}

// ── Semantic functions ───────────────────────────────────────────────

/// Left fold of `operand (op operand)*`, where each `(op operand)` is a
/// rest sub-term.
fn fold_operations(term: &Term, eval: &Eval<'_, Decimal>) -> Result<Decimal, EvalError> {
    let mut parts = term.subterms();
    let first = parts
        .next()
        .ok_or_else(|| EvalError::failed(term.rule(), "missing operand"))?;
    let mut acc = eval.evaluate(first)?;
    for rest in parts {
        let contents = eval.contents(rest)?;
        let (op, rhs) = match contents.as_slice() {
            [Content::Lexeme(op), Content::Value(rhs)] => (op.as_str(), *rhs),
            _ => return Err(EvalError::failed(rest.rule(), "malformed operation")),
        };
        acc = apply(term.rule(), op, acc, rhs)?;
    }
    Ok(acc)
}

fn apply(rule: &str, op: &str, lhs: Decimal, rhs: Decimal) -> Result<Decimal, EvalError> {
    let result = match op {
        "+" => lhs.checked_add(rhs),
        "-" => lhs.checked_sub(rhs),
        "*" => lhs.checked_mul(rhs),
        "/" => {
            if rhs.is_zero() {
                return Err(EvalError::failed(rule, "division by zero"));
            }
            lhs.checked_div(rhs)
        }
        other => return Err(EvalError::failed(rule, format!("unknown operator '{other}'"))),
    };
    result.ok_or_else(|| EvalError::failed(rule, format!("overflow in {lhs} {op} {rhs}")))
}

/// A numeric constant from its surface text. Whitespace between the parts
/// of a number is not allowed.
fn number_text(term: &Term) -> Result<Decimal, EvalError> {
    let text = term.text();
    if text.chars().any(char::is_whitespace) {
        return Err(EvalError::invalid_text(
            term.rule(),
            text,
            "whitespace inside a number",
        ));
    }
    match parse_number(&text) {
        Some(value) => Ok(value),
        None => Err(EvalError::invalid_text(
            term.rule(),
            text,
            "out of range for a decimal",
        )),
    }
}

/// `[sign] digits [. digits] [e [sign] digits]` with either side of the
/// point optional.
fn parse_number(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&text[..i], Some(&text[i + 1..])),
        None => (text, None),
    };
    let value = parse_mantissa(mantissa)?;
    match exponent {
        Some(exp) => scale(value, exp.parse().ok()?),
        None => Some(value),
    }
}

fn parse_mantissa(text: &str) -> Option<Decimal> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let mut normalized = String::with_capacity(digits.len() + 2);
    if digits.starts_with('.') {
        normalized.push('0');
    }
    normalized.push_str(digits);
    if digits.ends_with('.') {
        normalized.push('0');
    }
    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

fn scale(value: Decimal, exponent: i32) -> Option<Decimal> {
    if value.is_zero() {
        return Some(value);
    }
    if exponent.unsigned_abs() > MAX_EXPONENT {
        return if exponent > 0 { None } else { Some(Decimal::ZERO) };
    }
    let mut value = value;
    for _ in 0..exponent.unsigned_abs() {
        value = if exponent > 0 {
            value.checked_mul(Decimal::TEN)?
        } else {
            value.checked_div(Decimal::TEN)?
        };
    }
    Some(value)
}
