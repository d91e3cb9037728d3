use thiserror::Error;

use crate::term::TermError;

/// Grammar construction errors.
///
/// These are programmer errors in a grammar definition. A grammar that
/// fails to build cannot be used for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A rule was declared with no alternatives.
    #[error("rule '{rule}' has no alternatives")]
    EmptyRule { rule: String },

    /// One of a rule's alternatives has no elements.
    #[error("alternative {index} of rule '{rule}' is empty")]
    EmptyProduction { rule: String, index: usize },

    /// A match element was given an empty value.
    #[error("rule '{rule}' has a match element with an empty value")]
    EmptyMatchValue { rule: String },

    /// An alternative starts with a reference to its own rule.
    #[error("rule '{rule}' is left-recursive")]
    LeftRecursion { rule: String },

    /// Rules reach each other through leftmost references without consuming input.
    #[error("left recursion through {cycle}")]
    IndirectLeftRecursion { cycle: String },

    /// A rule references a name that was never declared.
    #[error("rule '{referenced_by}' references undeclared rule '{rule}'")]
    UndeclaredRule { rule: String, referenced_by: String },

    /// The grammar's root rule was never declared.
    #[error("root rule '{rule}' is not declared")]
    UndeclaredRoot { rule: String },

    /// Two rules share a name.
    #[error("rule '{rule}' is declared more than once")]
    DuplicateRule { rule: String },
}

/// Failures evaluating a parsed Term.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The rule has no semantic function and is not a single-child alias.
    #[error("FATAL: no evaluator for rule '{rule}'")]
    NoEvaluator { rule: String },

    /// The Term carries a parse error.
    #[error("cannot evaluate '{rule}': {message}")]
    Unparsed { rule: String, message: String },

    /// A semantic function rejected its input.
    #[error("{message}")]
    Failed { rule: String, message: String },

    /// The surface text of a Term cannot be interpreted.
    #[error("invalid {rule} '{text}': {reason}")]
    InvalidText {
        rule: String,
        text: String,
        reason: String,
    },
}

impl EvalError {
    pub fn failed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Failed {
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn invalid_text(
        rule: impl Into<String>,
        text: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EvalError::InvalidText {
            rule: rule.into(),
            text: text.into(),
            reason: reason.into(),
        }
    }
}

/// Failures building words from a token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    /// The word grammar could not parse the token sequence.
    #[error("word building failed: {0}")]
    Parse(TermError),

    /// The token sequence kept changing for too many passes.
    #[error("word building did not settle after {passes} passes")]
    Diverged { passes: usize },

    /// A word rule is not declared in the word grammar.
    #[error("word rule '{rule}' is not declared in the grammar")]
    UnknownWordRule { rule: String },
}
