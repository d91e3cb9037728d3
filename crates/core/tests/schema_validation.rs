//! Validates serialized parse trees, successful and failed, against the
//! formal schema at schema/term-schema.json.

use std::path::Path;

use bnfkit_core::grammar::{lit, lit_until, many, rule, token_type};
use bnfkit_core::token::kind;
use bnfkit_core::{Grammar, ParseOptions, Term};

fn load_validator() -> jsonschema::Validator {
    let schema_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schema/term-schema.json");
    let schema_src = std::fs::read_to_string(&schema_path)
        .unwrap_or_else(|e| panic!("Failed to read schema at {}: {}", schema_path.display(), e));
    let schema_value: serde_json::Value = serde_json::from_str(&schema_src).unwrap();
    jsonschema::validator_for(&schema_value)
        .unwrap_or_else(|e| panic!("Failed to compile schema: {}", e))
}

/// call := <WORD> "(" args ")" ; args := arg more* ; more := "," arg ;
/// arg := <NUMLIT> | quoted | call ; quoted := "'" until "'" "'"
fn call_grammar() -> Grammar {
    Grammar::builder("call")
        .rule(
            "call",
            vec![vec![token_type(kind::WORD), lit("("), rule("args"), lit(")")]],
        )
        .rule("args", vec![vec![rule("arg"), many("more")]])
        .rule("more", vec![vec![lit(","), rule("arg")]])
        .rule(
            "arg",
            vec![
                vec![token_type(kind::NUMLIT)],
                vec![rule("quoted")],
                vec![rule("call")],
            ],
        )
        .rule("quoted", vec![vec![lit("'"), lit_until("'"), lit("'")]])
        .build()
        .unwrap()
}

fn assert_valid(validator: &jsonschema::Validator, source: &str, term: &Term) {
    let instance = term.to_json_value();
    if let Err(error) = validator.validate(&instance) {
        panic!("{source:?}: schema violation: {error}\n{instance:#}");
    }
}

#[test]
fn successful_parse_trees_match_schema() {
    let validator = load_validator();
    let grammar = call_grammar();
    for source in ["f(1)", " max(1, g(2), 'a b' ) ", "f(\n  1,\r\n  2)\n"] {
        let term = grammar.parse(source);
        assert!(term.is_ok(), "{source:?} should parse:\n{term}");
        assert_valid(&validator, source, &term);
    }
}

#[test]
fn failed_parse_trees_match_schema() {
    let validator = load_validator();
    let grammar = call_grammar();
    for source in ["", "f(", "f(1))", "f('open)"] {
        let term = grammar.parse(source);
        assert!(!term.is_ok(), "{source:?} should fail");
        assert_valid(&validator, source, &term);
    }

    let nested = "f(".repeat(40) + "1" + &")".repeat(40);
    let term = grammar.parse_with(&nested, &ParseOptions::default().max_depth(8));
    assert!(!term.is_ok());
    assert_valid(&validator, &nested, &term);
}
