//! Property-based tests for the lexer and parser.
//!
//! The lexer must account for every character it keeps, positions must
//! only move forward, and the parser must terminate on arbitrary input
//! with a tree whose text reproduces the source.

use bnfkit_core::grammar::{lit, many, optional, rule, token_type};
use bnfkit_core::token::kind;
use bnfkit_core::{tokenize, tokenize_with, Grammar, LexerProfile};
use proptest::prelude::*;

/// Strategy: short sources mixing words, numbers, operators and line breaks.
fn source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z_]{1,4}",
            "[0-9]{1,3}",
            "[ \t]{1,2}",
            Just("\n".to_string()),
            Just("\r\n".to_string()),
            "[-+*/().,;=<>\"'`#]",
            "[é€]",
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

/// Strategy: nested lists over a tiny alphabet, often malformed.
fn list_strategy() -> impl Strategy<Value = String> {
    "[x(), ]{0,30}"
}

/// list := "(" [items] ")" ; items := item rest* ; rest := "," item ; item := <WORD> | list
fn list_grammar() -> Grammar {
    Grammar::builder("list")
        .rule("list", vec![vec![lit("("), optional("items"), lit(")")]])
        .rule("items", vec![vec![rule("item"), many("rest")]])
        .rule("rest", vec![vec![lit(","), rule("item")]])
        .rule("item", vec![vec![token_type(kind::WORD)], vec![rule("list")]])
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn grammar_profile_keeps_every_character(input in any::<String>()) {
        let joined: String = tokenize(&input).iter().map(|t| t.text.as_str()).collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn words_profile_keeps_exactly_the_classified_characters(input in source_strategy()) {
        let kept: String = input
            .chars()
            .filter(|c| {
                c.is_whitespace()
                    || c.is_ascii_alphanumeric()
                    || (c.is_ascii_punctuation() && *c != '`')
            })
            .collect();
        let joined: String = tokenize_with(&input, LexerProfile::Words)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        prop_assert_eq!(joined, kept);
    }

    #[test]
    fn token_positions_strictly_increase(input in source_strategy()) {
        let tokens = tokenize(&input);
        for pair in tokens.windows(2) {
            prop_assert!(
                pair[0].position() < pair[1].position(),
                "{} then {}", pair[0], pair[1]
            );
        }
        prop_assert!(tokens.iter().all(|t| t.line >= 1 && t.column >= 1));
    }

    #[test]
    fn no_token_is_empty(input in source_strategy()) {
        prop_assert!(tokenize(&input).iter().all(|t| !t.text.is_empty() && !t.kind.is_empty()));
    }

    #[test]
    fn parser_terminates_and_round_trips(input in list_strategy()) {
        let term = list_grammar().parse(&input);
        if term.is_ok() {
            prop_assert_eq!(term.text(), input);
        } else {
            prop_assert!(term.elements().is_empty());
        }
    }
}
