//! Backtracking recursive-descent parsing of token sequences into Terms.
//!
//! Alternatives are tried in declaration order and the first one that
//! matches wins; there is no memoization. Syntax failures are reported on
//! the returned Term. When the root rule matches nothing the error sits at
//! the furthest token any failed element reached; when it matches but
//! input remains, at the first unconsumed token.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::grammar::Grammar;
use crate::lexer::tokenize;
use crate::term::Term;
use crate::token::Token;

mod engine;
mod failure;

use engine::{Attempt, Parser};

/// Per-call parse limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Abort with a timeout error once this instant has passed.
    pub deadline: Option<Instant>,
    /// Override the grammar's nesting limit.
    pub max_depth: Option<usize>,
}

impl ParseOptions {
    pub fn deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(at);
        self
    }

    pub fn timeout(self, limit: Duration) -> Self {
        self.deadline(Instant::now() + limit)
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// The result of matching one rule at a given position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// The matched Term, or a Term carrying the error.
    pub term: Term,
    /// Tokens consumed; zero on failure.
    pub consumed: usize,
}

impl<V> Grammar<V> {
    /// Tokenize `source` and parse it from the root rule.
    pub fn parse(&self, source: &str) -> Term {
        self.parse_with(source, &ParseOptions::default())
    }

    pub fn parse_with(&self, source: &str, options: &ParseOptions) -> Term {
        self.parse_tokens_with(&tokenize(source), options)
    }

    /// Parse a token sequence from the root rule. Every token must be
    /// consumed, except trailing whitespace which the root absorbs.
    pub fn parse_tokens(&self, tokens: &[Token]) -> Term {
        self.parse_tokens_with(tokens, &ParseOptions::default())
    }

    pub fn parse_tokens_with(&self, tokens: &[Token], options: &ParseOptions) -> Term {
        debug!(root = self.root(), tokens = tokens.len(), "parsing");
        let term = Parser::new(self, tokens, options).parse_root();
        if let Some(err) = term.error() {
            debug!(root = self.root(), error = %err, "parse failed");
        }
        term
    }

    /// Match rule `name` against `tokens` starting at index `start`,
    /// without requiring the rest of the input to be consumed.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared in this grammar.
    pub fn parse_rule(&self, name: &str, tokens: &[Token], start: usize) -> RuleMatch {
        let mut parser = Parser::new(self, tokens, &ParseOptions::default());
        match parser.parse_rule(name, start) {
            Ok(Attempt::Matched { term, consumed }) => RuleMatch { term, consumed },
            Ok(Attempt::Failed(failure)) => RuleMatch {
                term: Term::failed(name, failure.into_error(tokens)),
                consumed: 0,
            },
            Err(fatal) => RuleMatch {
                term: Term::failed(name, fatal.into_error(tokens)),
                consumed: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{lit, lit_until, many, optional, rule, token_type};
    use crate::term::{ErrorKind, Node};
    use crate::token::kind;

    fn ab_grammar() -> Grammar {
        Grammar::builder("root")
            .rule(
                "root",
                vec![
                    vec![rule("a"), rule("b")],
                    vec![lit("X"), lit("Y")],
                ],
            )
            .rule("a", vec![vec![lit("A")]])
            .rule("b", vec![vec![lit("B")]])
            .build()
            .unwrap()
    }

    #[test]
    fn first_matching_alternative_wins() {
        let grammar = ab_grammar();
        let term = grammar.parse("A B");
        assert!(term.is_ok(), "{term}");
        assert_eq!(term.rule(), "root");
        assert_eq!(term.subterms().map(Term::rule).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(term.lexemes(), vec!["A", "B"]);
    }

    #[test]
    fn backtracks_into_later_alternatives() {
        let term = ab_grammar().parse("x y");
        assert!(term.is_ok(), "{term}");
        assert_eq!(term.lexemes(), vec!["x", "y"]);
    }

    #[test]
    fn whitespace_stays_in_the_tree() {
        let source = "  A \n B  ";
        let term = ab_grammar().parse(source);
        assert!(term.is_ok(), "{term}");
        assert_eq!(term.text(), source);
    }

    #[test]
    fn leftover_input_is_a_syntax_error_at_first_unconsumed_token() {
        let term = ab_grammar().parse("A B B");
        let err = term.error().expect("should fail");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.token.as_ref().map(|t| t.column), Some(5));
        assert!(term.elements().is_empty());
    }

    #[test]
    fn error_is_reported_at_the_furthest_failure() {
        // "A" matches, then "b" fails on "C"; the X Y alternative fails on "A".
        let term = ab_grammar().parse("A C");
        let err = term.error().expect("should fail");
        assert_eq!(err.token.as_ref().map(|t| t.text.as_str()), Some("C"));
        assert!(err.message.contains("expected \"B\""), "{}", err.message);
    }

    #[test]
    fn empty_input_fails_at_end_of_input() {
        let term = ab_grammar().parse("");
        let err = term.error().expect("should fail");
        assert!(err.token.is_none());
        assert_eq!(err.stopped_at(), "end of input");
    }

    #[test]
    fn optional_and_many_may_match_nothing() {
        let grammar: Grammar = Grammar::builder("list")
            .rule("list", vec![vec![optional("sign"), lit("A"), many("more")]])
            .rule("sign", vec![vec![lit("-")]])
            .rule("more", vec![vec![lit(","), lit("A")]])
            .build()
            .unwrap();
        for source in ["A", "-A", "A, A", "- A,A,A"] {
            let term = grammar.parse(source);
            assert!(term.is_ok(), "{source}: {term}");
        }
        let term = grammar.parse("A,A,A");
        assert_eq!(term.find_all("more").len(), 2);
        assert!(grammar.parse("A,").error().is_some());
    }

    #[test]
    fn nullable_repetition_terminates() {
        let grammar: Grammar = Grammar::builder("root")
            .rule("root", vec![vec![many("maybe"), lit("A")]])
            .rule("maybe", vec![vec![optional("b")]])
            .rule("b", vec![vec![lit("B")]])
            .build()
            .unwrap();
        assert!(grammar.parse("A").is_ok());
        assert!(grammar.parse("B A").is_ok());
    }

    #[test]
    fn token_type_elements_match_kinds() {
        let grammar: Grammar = Grammar::builder("sum")
            .rule("sum", vec![vec![token_type(kind::NUMLIT), lit("+"), token_type(kind::NUMLIT)]])
            .build()
            .unwrap();
        assert!(grammar.parse("12 + 30").is_ok());
        assert!(grammar.parse("a + 30").error().is_some());
    }

    #[test]
    fn until_stops_before_its_terminator() {
        let grammar: Grammar = Grammar::builder("comment")
            .rule(
                "comment",
                vec![vec![lit("/"), lit("*"), lit_until("*"), lit("*"), lit("/")]],
            )
            .build()
            .unwrap();
        let term = grammar.parse("/* a b */");
        assert!(term.is_ok(), "{term}");
        let leaves: Vec<_> = term.elements().iter().filter_map(Node::as_token).collect();
        assert_eq!(leaves[2].text, " ");
        assert_eq!(leaves.last().map(|t| t.text.as_str()), Some("/"));
    }

    #[test]
    fn unterminated_until_aborts_the_parse() {
        let grammar: Grammar = Grammar::builder("root")
            .rule("root", vec![vec![rule("quoted")], vec![lit("\""), lit("x")]])
            .rule("quoted", vec![vec![lit("\""), lit_until("\""), lit("\"")]])
            .build()
            .unwrap();
        let term = grammar.parse("\"x");
        let err = term.error().expect("should fail");
        assert_eq!(err.kind, ErrorKind::UnterminatedLiteral);
        assert_eq!(err.token.as_ref().map(|t| t.text.as_str()), Some("\""));
    }

    #[test]
    fn depth_limit_aborts_deep_nesting() {
        let grammar: Grammar = Grammar::builder("nest")
            .rule("nest", vec![vec![lit("("), rule("nest"), lit(")")], vec![lit("x")]])
            .max_depth(4)
            .build()
            .unwrap();
        assert!(grammar.parse("((x))").is_ok());
        let term = grammar.parse("((((x))))");
        assert_eq!(term.error().map(|e| e.kind), Some(ErrorKind::DepthExceeded));

        let relaxed = ParseOptions::default().max_depth(16);
        assert!(grammar.parse_with("((((x))))", &relaxed).is_ok());
    }

    #[test]
    fn expired_deadline_times_out() {
        let options = ParseOptions::default().deadline(Instant::now());
        let term = ab_grammar().parse_with("A B", &options);
        assert_eq!(term.error().map(|e| e.kind), Some(ErrorKind::TimedOut));
    }

    #[test]
    fn parse_rule_reports_consumed_tokens() {
        let grammar = ab_grammar();
        let tokens = tokenize("A B trailing");
        let matched = grammar.parse_rule("root", &tokens, 0);
        assert!(matched.term.is_ok());
        assert_eq!(matched.consumed, 3);

        let missed = grammar.parse_rule("b", &tokens, 0);
        assert_eq!(missed.consumed, 0);
        assert!(missed.term.error().is_some());
    }
}
