use std::fmt;

use serde::Serialize;

/// Well-known token kind labels.
///
/// Kinds are plain strings so that word-building grammars can introduce
/// their own labels (`STRLIT-DQ`, `WS-BLOCK-COMMENT`, ...).
pub mod kind {
    /// A run of whitespace characters.
    pub const WS: &str = "WS";
    /// A line comment collapsed by a word-building grammar.
    pub const LINE_COMMENT: &str = "WS-LINE-COMMENT";
    /// A block comment collapsed by a word-building grammar.
    pub const BLOCK_COMMENT: &str = "WS-BLOCK-COMMENT";
    /// A run of letters and underscores (grammar profile).
    pub const WORD: &str = "WORD";
    /// An identifier: letter or underscore, then letters, digits or underscores.
    pub const IDENT: &str = "IDENT";
    /// A numeric literal run.
    pub const NUMLIT: &str = "NUMLIT";
    /// A single punctuation character.
    pub const PUNCT: &str = "PUNCT";
}

/// The token kinds treated as whitespace unless a grammar says otherwise.
pub fn default_whitespace_kinds() -> Vec<String> {
    vec![
        kind::WS.to_string(),
        kind::LINE_COMMENT.to_string(),
        kind::BLOCK_COMMENT.to_string(),
    ]
}

/// A 1-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.line, self.column)
    }
}

/// A lexical unit: source text, a kind label and the position of its first
/// character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub kind: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: impl Into<String>, line: u32, column: u32) -> Self {
        Token {
            text: text.into(),
            kind: kind.into(),
            line,
            column,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    /// True when this token's kind is one of `kinds`.
    pub fn is_whitespace_in(&self, kinds: &[String]) -> bool {
        kinds.iter().any(|k| *k == self.kind)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{} {}", self.text, self.kind, self.position())
    }
}
