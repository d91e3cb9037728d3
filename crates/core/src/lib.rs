//! bnfkit-core: a declarative BNF grammar engine.
//!
//! Grammars are rule tables built in code. Each rule is an ordered list of
//! alternatives over terminal matchers and references to other rules,
//! with an optional semantic function. Source text is tokenized, parsed by
//! backtracking recursive descent into a [`Term`] tree, and evaluated
//! bottom-up through the semantic functions.
//!
//! # Public API
//!
//! - [`tokenize()`] / [`tokenize_with()`] -- character-level lexing
//! - [`Grammar::builder()`] -- declare and validate a rule table
//! - [`Grammar::parse()`] / [`Grammar::parse_tokens()`] -- build a [`Term`]
//! - [`Grammar::evaluate()`] -- run semantic functions over a [`Term`]
//! - [`WordBuilder`] -- collapse token runs into words with a grammar
//!
//! Errors: [`GrammarError`] for malformed grammars, [`TermError`] on a
//! failed [`Term`], [`EvalError`] and [`WordError`].
//!
//! Diagnostics go through `tracing`; this crate installs no subscriber.

pub mod error;
pub mod eval;
pub mod grammar;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod term;
pub mod token;
pub mod words;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::{EvalError, GrammarError, WordError};
pub use eval::{Content, Eval};
pub use grammar::{
    Element, Grammar, GrammarBuilder, GrammarConfig, Production, Repeat, Rule, RuleRef,
    SemanticFn,
};
pub use matcher::{MatchKind, MatchSpec};
pub use parser::{ParseOptions, RuleMatch};
pub use term::{ErrorKind, Node, Term, TermError};
pub use token::{Position, Token};
pub use words::WordBuilder;

// ── Convenience re-exports: entry points ─────────────────────────────

pub use lexer::{tokenize, tokenize_with, LexerProfile};
