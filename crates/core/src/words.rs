//! Grammar-driven word building.
//!
//! A word grammar is parsed over a token sequence; every matched sub-term
//! produced by a word rule collapses into one composite token whose kind
//! comes from the word map. The rebuilt sequence is parsed again until a
//! pass changes nothing.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::WordError;
use crate::grammar::Grammar;
use crate::lexer::{tokenize_with, LexerProfile};
use crate::parser::ParseOptions;
use crate::term::{Node, Term};
use crate::token::Token;

/// Collapses token runs into words using a word grammar.
#[derive(Debug, Clone)]
pub struct WordBuilder {
    grammar: Grammar,
    words: BTreeMap<String, String>,
    max_passes: Option<usize>,
}

impl WordBuilder {
    pub fn new(grammar: Grammar) -> Self {
        WordBuilder {
            grammar,
            words: BTreeMap::new(),
            max_passes: None,
        }
    }

    /// Mark `rule` as a word rule whose matches become tokens of `kind`.
    pub fn word(mut self, rule: &str, kind: &str) -> Result<Self, WordError> {
        if self.grammar.try_lookup(rule).is_none() {
            return Err(WordError::UnknownWordRule {
                rule: rule.to_string(),
            });
        }
        self.words.insert(rule.to_string(), kind.to_string());
        Ok(self)
    }

    /// Cap the number of passes. Defaults to one more than the input
    /// token count.
    pub fn max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Rebuild `tokens` until a pass leaves them unchanged.
    pub fn build_words(&self, tokens: &[Token]) -> Result<Vec<Token>, WordError> {
        self.build_words_with(tokens, &ParseOptions::default())
    }

    /// As [`build_words`](Self::build_words), with `options` applied to
    /// every pass.
    pub fn build_words_with(
        &self,
        tokens: &[Token],
        options: &ParseOptions,
    ) -> Result<Vec<Token>, WordError> {
        let limit = self.max_passes.unwrap_or(tokens.len() + 1).max(1);
        let mut current = tokens.to_vec();
        for pass in 1..=limit {
            let term = self.grammar.parse_tokens_with(&current, options);
            if let Some(err) = term.error() {
                return Err(WordError::Parse(err.clone()));
            }
            let mut rebuilt = Vec::with_capacity(current.len());
            self.rebuild(&term, &mut rebuilt);
            if rebuilt == current {
                debug!(pass, tokens = rebuilt.len(), "words settled");
                return Ok(rebuilt);
            }
            debug!(pass, before = current.len(), after = rebuilt.len(), "word pass");
            current = rebuilt;
        }
        Err(WordError::Diverged { passes: limit })
    }

    /// Lex `source` with the word profile, build words and drop whitespace.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, WordError> {
        self.tokenize_with(source, &ParseOptions::default())
    }

    pub fn tokenize_with(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> Result<Vec<Token>, WordError> {
        let words = self.tokenize_raw_with(source, options)?;
        Ok(words
            .into_iter()
            .filter(|tok| !self.grammar.is_whitespace(tok))
            .collect())
    }

    /// Lex `source` with the word profile and build words, keeping
    /// whitespace and comments.
    pub fn tokenize_raw(&self, source: &str) -> Result<Vec<Token>, WordError> {
        self.tokenize_raw_with(source, &ParseOptions::default())
    }

    pub fn tokenize_raw_with(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> Result<Vec<Token>, WordError> {
        self.build_words_with(&tokenize_with(source, LexerProfile::Words), options)
    }

    fn rebuild(&self, term: &Term, out: &mut Vec<Token>) {
        for node in term.elements() {
            match node {
                Node::Token(tok) | Node::Space(tok) => out.push(tok.clone()),
                Node::Term(child) => match self.words.get(child.rule()) {
                    Some(kind) => out.extend(collapse(child, kind)),
                    None => self.rebuild(child, out),
                },
            }
        }
    }
}

/// One token spanning every leaf of `term`. A word that matched no tokens
/// disappears.
fn collapse(term: &Term, kind: &str) -> Option<Token> {
    let leaves = term.tokens();
    let first = leaves.first()?;
    let text: String = leaves.iter().map(|t| t.text.as_str()).collect();
    Some(Token::new(text, kind, first.line, first.column))
}
