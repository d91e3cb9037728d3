//! Evaluation of parsed Terms through per-rule semantic functions.

use tracing::trace;

use crate::error::EvalError;
use crate::grammar::Grammar;
use crate::term::{Node, Term};

/// One evaluated child of a Term.
#[derive(Debug, Clone, PartialEq)]
pub enum Content<V> {
    /// The value of a child Term.
    Value(V),
    /// The text of a child token.
    Lexeme(String),
}

impl<V> Content<V> {
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Content::Value(v) => Some(v),
            Content::Lexeme(_) => None,
        }
    }

    pub fn as_lexeme(&self) -> Option<&str> {
        match self {
            Content::Lexeme(s) => Some(s),
            Content::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Content::Value(v) => Some(v),
            Content::Lexeme(_) => None,
        }
    }
}

/// Evaluation context handed to semantic functions.
pub struct Eval<'g, V> {
    grammar: &'g Grammar<V>,
}

impl<'g, V> Eval<'g, V> {
    pub fn new(grammar: &'g Grammar<V>) -> Self {
        Eval { grammar }
    }

    pub fn grammar(&self) -> &'g Grammar<V> {
        self.grammar
    }

    /// Evaluate `term` with its rule's semantic function.
    ///
    /// A rule without one whose Term has exactly one child Term (ignoring
    /// skipped whitespace and tokens) is an alias and evaluates to that
    /// child.
    pub fn evaluate(&self, term: &Term) -> Result<V, EvalError> {
        if let Some(err) = term.error() {
            return Err(EvalError::Unparsed {
                rule: term.rule().to_string(),
                message: err.message.clone(),
            });
        }
        let rule = self
            .grammar
            .try_lookup(term.rule())
            .ok_or_else(|| EvalError::NoEvaluator {
                rule: term.rule().to_string(),
            })?;

        if let Some(f) = rule.evaluator() {
            trace!(rule = term.rule(), "evaluating");
            return f(term, self);
        }

        match sole_child(term) {
            Some(child) => {
                trace!(rule = term.rule(), alias = child.rule(), "evaluating alias");
                self.evaluate(child)
            }
            None => Err(EvalError::NoEvaluator {
                rule: term.rule().to_string(),
            }),
        }
    }

    /// Children of `term` in order, skipping whitespace: child Terms
    /// evaluated, tokens as their text.
    pub fn contents(&self, term: &Term) -> Result<Vec<Content<V>>, EvalError> {
        let mut out = Vec::new();
        for node in term.elements() {
            match node {
                Node::Token(tok) => out.push(Content::Lexeme(tok.text.clone())),
                Node::Term(child) => out.push(Content::Value(self.evaluate(child)?)),
                Node::Space(_) => {}
            }
        }
        Ok(out)
    }

    /// Values of the direct child Terms, in order.
    pub fn values(&self, term: &Term) -> Result<Vec<V>, EvalError> {
        term.subterms().map(|child| self.evaluate(child)).collect()
    }
}

fn sole_child(term: &Term) -> Option<&Term> {
    let mut significant = term
        .elements()
        .iter()
        .filter(|node| !matches!(node, Node::Space(_)));
    match (significant.next(), significant.next()) {
        (Some(Node::Term(child)), None) => Some(child),
        _ => None,
    }
}

impl<V> Grammar<V> {
    /// Evaluate a parsed Term; see [`Eval::evaluate`].
    pub fn evaluate(&self, term: &Term) -> Result<V, EvalError> {
        Eval::new(self).evaluate(term)
    }
}
