//! The parse tree.

use std::fmt;

use serde::Serialize;

use crate::token::{Position, Token};

/// What went wrong while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No alternative matched, or input remained after the root rule.
    Syntax,
    /// An "until" element ran out of input before its terminator.
    UnterminatedLiteral,
    /// Rule invocations nested deeper than the grammar allows.
    DepthExceeded,
    /// The parse deadline passed.
    TimedOut,
}

/// A parse failure attached to the Term of the rule that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermError {
    pub kind: ErrorKind,
    pub message: String,
    /// The token at which parsing stopped; `None` at end of input.
    pub token: Option<Token>,
}

impl TermError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, token: Option<Token>) -> Self {
        TermError {
            kind,
            message: message.into(),
            token,
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.token.as_ref().map(Token::position)
    }

    /// Where parsing stopped: `"text" (line, column)` or `end of input`.
    pub fn stopped_at(&self) -> String {
        match &self.token {
            Some(tok) => format!("{:?} {}", tok.text, tok.position()),
            None => "end of input".to_string(),
        }
    }
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A child of a Term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// A token consumed by a match element.
    Token(Token),
    /// A whitespace token skipped by the parser.
    Space(Token),
    /// A nested rule match.
    Term(Term),
}

impl Node {
    pub fn as_term(&self) -> Option<&Term> {
        match self {
            Node::Term(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(t) => Some(t),
            _ => None,
        }
    }
}

/// The result of matching a rule: its name and the tokens and sub-terms
/// it consumed, in source order.
///
/// A Term that carries an error has no elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    rule: String,
    elements: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<TermError>,
}

impl Term {
    pub(crate) fn new(rule: impl Into<String>) -> Self {
        Term {
            rule: rule.into(),
            elements: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn failed(rule: impl Into<String>, error: TermError) -> Self {
        Term {
            rule: rule.into(),
            elements: Vec::new(),
            error: Some(error),
        }
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.elements.push(node);
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn elements(&self) -> &[Node] {
        &self.elements
    }

    pub fn error(&self) -> Option<&TermError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Position of the token where parsing stopped, if this Term failed.
    pub fn position(&self) -> Option<Position> {
        self.error.as_ref().and_then(TermError::position)
    }

    /// All leaf text, whitespace included.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for tok in self.tokens() {
            out.push_str(&tok.text);
        }
        out
    }

    /// All leaf tokens depth-first, whitespace included.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out, true);
        out
    }

    /// Leaf text depth-first, skipping whitespace the parser stepped over.
    pub fn lexemes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out, false);
        out.into_iter().map(|t| t.text.as_str()).collect()
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>, with_space: bool) {
        for node in &self.elements {
            match node {
                Node::Token(tok) => out.push(tok),
                Node::Space(tok) if with_space => out.push(tok),
                Node::Space(_) => {}
                Node::Term(term) => term.collect_tokens(out, with_space),
            }
        }
    }

    /// Direct child Terms.
    pub fn subterms(&self) -> impl Iterator<Item = &Term> {
        self.elements.iter().filter_map(Node::as_term)
    }

    /// The first direct child Term produced by `rule`.
    pub fn child(&self, rule: &str) -> Option<&Term> {
        self.subterms().find(|t| t.rule == rule)
    }

    pub fn has_child(&self, rule: &str) -> bool {
        self.child(rule).is_some()
    }

    /// Every descendant Term produced by `rule`, depth-first, including
    /// matches nested inside other matches.
    pub fn find_all(&self, rule: &str) -> Vec<&Term> {
        let mut out = Vec::new();
        self.walk(rule, true, &mut out);
        out
    }

    /// Lexemes of every outermost descendant Term produced by `rule`.
    pub fn words_list(&self, rule: &str) -> Vec<Vec<&str>> {
        let mut found = Vec::new();
        self.walk(rule, false, &mut found);
        found.into_iter().map(Term::lexemes).collect()
    }

    fn walk<'a>(&'a self, rule: &str, nested: bool, out: &mut Vec<&'a Term>) {
        for term in self.subterms() {
            if term.rule == rule {
                out.push(term);
                if !nested {
                    continue;
                }
            }
            term.walk(rule, nested, out);
        }
    }

    /// Interchange JSON for this tree.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        for (i, node) in self.elements.iter().enumerate() {
            match node {
                Node::Token(tok) | Node::Space(tok) => {
                    writeln!(f, "{indent}[{i}]{:?}:{}", tok.text, tok.kind)?
                }
                Node::Term(term) => {
                    writeln!(f, "{indent}[{i}]{}", term.rule)?;
                    term.fmt_indented(f, depth + 1)?;
                }
            }
        }
        if let Some(err) = &self.error {
            writeln!(f, "{indent}ERROR at {}: {}", err.stopped_at(), err.message)?;
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.rule)?;
        self.fmt_indented(f, 1)
    }
}
