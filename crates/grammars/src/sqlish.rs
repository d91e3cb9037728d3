//! SQL-ish query translator.
//!
//! A query such as
//!
//! ```text
//! SELECT mainStar, orbitOrder, name
//! FROM stars
//! WHERE mainStar = :mainStar
//! ```
//!
//! becomes the parameters of a key-value store query:
//! `{"TableName": "stars", "KeyConditionExpression": "mainStar = :mainStar",
//! "ProjectionExpression": "mainStar,orbitOrder,name"}`.
//!
//! Translation runs in two tiers. A word grammar first collapses
//! multi-token lexemes (signed and fractional numbers, two-character
//! comparators, `:placeholders`, `a.b.c` paths, quoted strings and
//! comments) into single tokens. Escapes (`\\`, `\"`, `\'`) are
//! collapsed ahead of that, so an escaped quote never closes a string.
//! The clause grammar then parses the remaining non-whitespace words.

use std::sync::OnceLock;

use bnfkit_core::grammar::{lit, lit_until, many, optional, rule, token_type};
use bnfkit_core::token::kind;
use bnfkit_core::{
    Element, Grammar, GrammarError, ParseOptions, Term, TermError, Token, WordBuilder, WordError,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Token kind of a double-quoted string word.
pub const STRLIT_DQ: &str = "STRLIT-DQ";
/// Token kind of a single-quoted string word.
pub const STRLIT_SQ: &str = "STRLIT-SQ";

/// Failure to translate a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlishError {
    /// The word tier could not split the source.
    #[error("Word error: {0}")]
    Words(#[from] WordError),

    /// One of the two grammars is malformed.
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    /// The clause tier rejected the words.
    #[error("Syntax error: stopped at {}", .0.stopped_at())]
    Syntax(TermError),

    /// A required clause is absent from an accepted query.
    #[error("the {0} not found")]
    Missing(&'static str),

    /// The LIMIT count is not a non-negative 32-bit integer.
    #[error("invalid LIMIT count '{0}'")]
    InvalidLimit(String),
}

/// Query parameters produced from one SQL-ish sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryParams {
    pub table_name: String,
    pub key_condition_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Both tiers of the translator.
#[derive(Debug, Clone)]
pub struct Translator {
    escapes: WordBuilder,
    words: WordBuilder,
    clauses: Grammar,
}

static TRANSLATOR: OnceLock<Translator> = OnceLock::new();

/// The shared translator.
pub fn translator() -> &'static Translator {
    TRANSLATOR.get_or_init(|| {
        Translator::new().unwrap_or_else(|e| panic!("sql-ish grammars are malformed: {e}"))
    })
}

/// Translate `source` with the shared translator.
pub fn translate(source: &str) -> Result<QueryParams, SqlishError> {
    translator().translate(source)
}

impl Translator {
    pub fn new() -> Result<Self, SqlishError> {
        Ok(Translator {
            escapes: escape_builder()?,
            words: word_builder()?,
            clauses: clause_grammar()?,
        })
    }

    /// Significant words of `source`, whitespace and comments removed.
    pub fn words(&self, source: &str) -> Result<Vec<Token>, SqlishError> {
        self.words_with(source, &ParseOptions::default())
    }

    pub fn words_with(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> Result<Vec<Token>, SqlishError> {
        let grammar = self.words.grammar();
        Ok(self
            .words_raw_with(source, options)?
            .into_iter()
            .filter(|tok| !grammar.is_whitespace(tok))
            .collect())
    }

    /// Every word of `source`, whitespace and comments included.
    pub fn words_raw(&self, source: &str) -> Result<Vec<Token>, SqlishError> {
        self.words_raw_with(source, &ParseOptions::default())
    }

    pub fn words_raw_with(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> Result<Vec<Token>, SqlishError> {
        // Line comments run to a newline, so the last line always gets one.
        let mut text = String::with_capacity(source.len() + 1);
        text.push_str(source);
        text.push('\n');
        let escaped = self.escapes.tokenize_raw_with(&text, options)?;
        let mut words = self.words.build_words_with(&escaped, options)?;
        if words.last().is_some_and(|tok| tok.text == "\n") {
            words.pop();
        }
        Ok(words)
    }

    /// Clause tree of `source`. The Term carries the error when the
    /// clause tier rejects the words.
    pub fn parse(&self, source: &str) -> Result<Term, SqlishError> {
        self.parse_with(source, &ParseOptions::default())
    }

    pub fn parse_with(&self, source: &str, options: &ParseOptions) -> Result<Term, SqlishError> {
        let words = self.words_with(source, options)?;
        debug!(words = words.len(), "sql-ish words built");
        Ok(self.clauses.parse_tokens_with(&words, options))
    }

    pub fn translate(&self, source: &str) -> Result<QueryParams, SqlishError> {
        self.translate_with(source, &ParseOptions::default())
    }

    pub fn translate_with(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> Result<QueryParams, SqlishError> {
        let term = self.parse_with(source, options)?;
        if let Some(err) = term.error() {
            return Err(SqlishError::Syntax(err.clone()));
        }
        query_params(&term)
    }
}

/// Read the clause tree into query parameters.
fn query_params(term: &Term) -> Result<QueryParams, SqlishError> {
    let from = term
        .child("from-clause")
        .ok_or(SqlishError::Missing("from-clause"))?;
    let table_name = first_words(from, "table-name")
        .ok_or(SqlishError::Missing("table-name"))?
        .join("");

    let key = term
        .child("where-key-clause")
        .ok_or(SqlishError::Missing("where clause"))?;
    let key_condition_expression = first_words(key, "condition-expression")
        .ok_or(SqlishError::Missing("key condition"))?
        .join(" ");

    let projection_expression = term
        .child("select-clause")
        .and_then(|select| first_words(select, "key-list"))
        .map(|words| words.join(""));

    let filter_expression = term
        .child("filter-clause")
        .and_then(|filter| first_words(filter, "condition-expression"))
        .map(|words| words.join(" "));

    let limit = match term
        .child("limit-clause")
        .and_then(|clause| first_words(clause, "limit-count"))
    {
        Some(words) => {
            let count = words.join("");
            Some(count.parse::<u32>().map_err(|_| SqlishError::InvalidLimit(count))?)
        }
        None => None,
    };

    Ok(QueryParams {
        table_name,
        key_condition_expression,
        projection_expression,
        filter_expression,
        limit,
    })
}

fn first_words<'t>(term: &'t Term, rule: &str) -> Option<Vec<&'t str>> {
    term.words_list(rule).into_iter().next()
}

// ── Word tier ────────────────────────────────────────────────────────

fn escape_builder() -> Result<WordBuilder, SqlishError> {
    let grammar: Grammar = Grammar::builder("escapes")
        .rule("escapes", vec![vec![many("piece")]])
        .rule(
            "piece",
            vec![
                vec![rule("escaped-char")],
                vec![token_type(kind::IDENT)],
                vec![token_type(kind::NUMLIT)],
                vec![token_type(kind::PUNCT)],
                vec![token_type(kind::WS)],
            ],
        )
        .rule(
            "escaped-char",
            vec![
                vec![lit("\\"), lit("\\")],
                vec![lit("\\"), lit("\"")],
                vec![lit("\\"), lit("'")],
            ],
        )
        .whitespace_significant()
        .build()?;
    Ok(WordBuilder::new(grammar).word("escaped-char", kind::PUNCT)?)
}

fn word_builder() -> Result<WordBuilder, SqlishError> {
    let grammar: Grammar = Grammar::builder("words")
        .rule("words", vec![vec![many("word")]])
        .rule(
            "word",
            vec![
                vec![rule("num-literal")],
                vec![rule("comparison-operator")],
                vec![rule("attribute-value-placeholder")],
                vec![rule("attribute-path-name")],
                vec![rule("string-literal-dq")],
                vec![rule("string-literal-sq")],
                vec![rule("block-comment")],
                vec![rule("line-comment")],
                vec![token_type(kind::IDENT)],
                vec![token_type(kind::PUNCT)],
                vec![token_type(kind::WS)],
                vec![token_type(STRLIT_DQ)],
                vec![token_type(STRLIT_SQ)],
                vec![token_type(kind::LINE_COMMENT)],
                vec![token_type(kind::BLOCK_COMMENT)],
            ],
        )
        .rule(
            "num-literal",
            vec![vec![
                optional("sign"),
                token_type(kind::NUMLIT),
                optional("fraction-part"),
            ]],
        )
        .rule("fraction-part", vec![vec![lit("."), token_type(kind::NUMLIT)]])
        .rule("sign", vec![vec![lit("+")], vec![lit("-")]])
        .rule(
            "comparison-operator",
            vec![
                vec![lit("<"), lit("=")],
                vec![lit("<"), lit(">")],
                vec![lit(">"), lit("=")],
            ],
        )
        .rule(
            "attribute-value-placeholder",
            vec![
                vec![lit(":"), token_type(kind::IDENT)],
                vec![lit("#"), token_type(kind::IDENT)],
            ],
        )
        .rule(
            "attribute-path-name",
            vec![
                vec![token_type(kind::IDENT), lit("."), rule("attribute-path-name")],
                vec![token_type(kind::IDENT), lit("."), token_type(kind::IDENT)],
            ],
        )
        .rule("string-literal-dq", vec![vec![lit("\""), lit_until("\""), lit("\"")]])
        .rule("string-literal-sq", vec![vec![lit("'"), lit_until("'"), lit("'")]])
        .rule("block-comment", vec![vec![lit("/"), lit("*"), rule("block-comment-body")]])
        .rule(
            "block-comment-body",
            vec![
                vec![lit_until("*"), lit("*"), lit("/")],
                vec![lit_until("*"), lit("*"), rule("block-comment-body")],
            ],
        )
        .rule(
            "line-comment",
            vec![
                vec![lit("-"), lit("-"), lit_until("\n")],
                vec![lit("/"), lit("/"), lit_until("\n")],
            ],
        )
        .whitespace_significant()
        .build()?;

    let mut builder = WordBuilder::new(grammar);
    for (rule, word_kind) in [
        ("num-literal", kind::NUMLIT),
        ("comparison-operator", kind::PUNCT),
        ("attribute-value-placeholder", kind::IDENT),
        ("attribute-path-name", kind::IDENT),
        ("string-literal-dq", STRLIT_DQ),
        ("string-literal-sq", STRLIT_SQ),
        ("block-comment", kind::BLOCK_COMMENT),
        ("line-comment", kind::LINE_COMMENT),
    ] {
        builder = builder.word(rule, word_kind)?;
    }
    Ok(builder)
}

// ── Clause tier ──────────────────────────────────────────────────────

fn clause_grammar() -> Result<Grammar, GrammarError> {
    Grammar::builder("sqlish-query")
        .rule(
            "sqlish-query",
            vec![vec![
                Element::parse_ref("[select-clause]"),
                Element::parse_ref("from-clause"),
                Element::parse_ref("where-key-clause"),
                Element::parse_ref("[filter-clause]"),
                Element::parse_ref("[limit-clause]"),
            ]],
        )
        .rule("select-clause", vec![vec![lit("SELECT"), rule("key-list")]])
        .rule(
            "key-list",
            vec![
                vec![rule("column-name"), lit(","), rule("key-list")],
                vec![rule("column-name")],
            ],
        )
        .rule("column-name", vec![vec![token_type(kind::IDENT)]])
        .rule("from-clause", vec![vec![lit("FROM"), rule("table-name")]])
        .rule("table-name", vec![vec![token_type(kind::IDENT)]])
        .rule(
            "where-key-clause",
            vec![vec![lit("WHERE"), rule("condition-expression")]],
        )
        .rule(
            "filter-clause",
            vec![vec![lit("FILTER"), rule("condition-expression")]],
        )
        .rule("condition-expression", vec![vec![rule("or-expression")]])
        .rule(
            "or-expression",
            vec![
                vec![rule("and-expression"), lit("OR"), rule("condition-expression")],
                vec![rule("and-expression")],
            ],
        )
        .rule(
            "and-expression",
            vec![
                vec![rule("compare-expression"), lit("AND"), rule("condition-expression")],
                vec![rule("compare-expression")],
            ],
        )
        .rule(
            "compare-expression",
            vec![
                vec![lit("("), rule("condition-expression"), lit(")")],
                vec![token_type(kind::IDENT), rule("comparator"), rule("value")],
                vec![token_type(kind::IDENT), lit("BETWEEN"), rule("between-range")],
                vec![
                    token_type(kind::IDENT),
                    lit("IN"),
                    lit("("),
                    rule("value-list"),
                    lit(")"),
                ],
                vec![rule("function")],
                vec![lit("NOT"), rule("condition-expression")],
            ],
        )
        .rule(
            "comparator",
            vec![
                vec![lit("=")],
                vec![lit("<")],
                vec![lit("<=")],
                vec![lit(">")],
                vec![lit(">=")],
                vec![lit("<>")],
            ],
        )
        .rule(
            "function",
            vec![
                vec![lit("attribute_exists"), lit("("), rule("path"), lit(")")],
                vec![lit("attribute_not_exists"), lit("("), rule("path"), lit(")")],
                vec![
                    lit("attribute_type"),
                    lit("("),
                    rule("path"),
                    lit(","),
                    rule("attribute-type"),
                    lit(")"),
                ],
                vec![
                    lit("begins_with"),
                    lit("("),
                    rule("path"),
                    lit(","),
                    rule("value"),
                    lit(")"),
                ],
                vec![
                    lit("contains"),
                    lit("("),
                    rule("path"),
                    lit(","),
                    rule("value"),
                    lit(")"),
                ],
                vec![lit("size"), lit("("), rule("path"), lit(")")],
            ],
        )
        .rule("path", vec![vec![token_type(kind::IDENT)]])
        .rule("between-range", vec![vec![rule("value"), lit("AND"), rule("value")]])
        .rule(
            "value-list",
            vec![
                vec![rule("value"), lit(","), rule("value-list")],
                vec![rule("value")],
            ],
        )
        .rule(
            "value",
            vec![
                vec![token_type(kind::NUMLIT)],
                vec![token_type(STRLIT_DQ)],
                vec![token_type(STRLIT_SQ)],
                vec![token_type(kind::IDENT)],
            ],
        )
        .rule("limit-clause", vec![vec![lit("LIMIT"), rule("limit-count")]])
        .rule("limit-count", vec![vec![token_type(kind::NUMLIT)]])
        .rule(
            "attribute-type",
            ["S", "SS", "N", "NS", "B", "BS", "BOOL", "NULL", "L", "M"]
                .into_iter()
                .map(|name| vec![lit(name)])
                .collect(),
        )
        .build()
}
