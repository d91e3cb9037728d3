use std::fmt;

use crate::token::Token;

/// Which token field a [`MatchSpec`] compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Compare the token's text.
    Literal,
    /// Compare the token's kind label.
    TokenType,
}

/// A terminal matcher.
///
/// A plain spec matches exactly one token. An inverse spec ("until")
/// matches every token up to, but not including, the first token that
/// satisfies it. Comparison is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpec {
    pub kind: MatchKind,
    pub value: String,
    pub inverse: bool,
}

impl MatchSpec {
    fn new(kind: MatchKind, value: impl Into<String>, inverse: bool) -> Self {
        MatchSpec {
            kind,
            value: value.into(),
            inverse,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        MatchSpec::new(MatchKind::Literal, value, false)
    }

    pub fn literal_until(value: impl Into<String>) -> Self {
        MatchSpec::new(MatchKind::Literal, value, true)
    }

    pub fn token_type(value: impl Into<String>) -> Self {
        MatchSpec::new(MatchKind::TokenType, value, false)
    }

    pub fn token_type_until(value: impl Into<String>) -> Self {
        MatchSpec::new(MatchKind::TokenType, value, true)
    }

    /// The token field this spec compares.
    pub fn token_value<'t>(&self, token: &'t Token) -> &'t str {
        match self.kind {
            MatchKind::Literal => &token.text,
            MatchKind::TokenType => &token.kind,
        }
    }

    /// Case-insensitive comparison of the relevant token field with `value`.
    ///
    /// For an inverse spec this answers "is this the terminator".
    pub fn matches(&self, token: &Token) -> bool {
        let field = self.token_value(token);
        field == self.value || field.to_uppercase() == self.value.to_uppercase()
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverse {
            write!(f, "until ")?;
        }
        match self.kind {
            MatchKind::Literal => write!(f, "{:?}", self.value),
            MatchKind::TokenType => write!(f, "<{}>", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::kind;

    #[test]
    fn literal_matches_text_case_insensitively() {
        let spec = MatchSpec::literal("where");
        assert!(spec.matches(&Token::new("WHERE", kind::WORD, 1, 1)));
        assert!(spec.matches(&Token::new("Where", kind::WORD, 1, 1)));
        assert!(!spec.matches(&Token::new("wher", kind::WORD, 1, 1)));
    }

    #[test]
    fn case_folding_uses_upper_case() {
        // "ß" upper-cases to "SS" but "SS" lower-cases to "ss".
        let spec = MatchSpec::literal("STRASSE");
        assert!(spec.matches(&Token::new("straße", kind::WORD, 1, 1)));
        assert!(MatchSpec::literal("ß").matches(&Token::new("ss", kind::WORD, 1, 1)));
    }

    #[test]
    fn token_type_matches_kind_not_text() {
        let spec = MatchSpec::token_type("numlit");
        assert!(spec.matches(&Token::new("42", kind::NUMLIT, 1, 1)));
        assert!(!spec.matches(&Token::new("NUMLIT", kind::WORD, 1, 1)));
    }

    #[test]
    fn token_value_picks_the_compared_field() {
        let tok = Token::new("+", kind::PUNCT, 1, 1);
        assert_eq!(MatchSpec::literal("+").token_value(&tok), "+");
        assert_eq!(MatchSpec::token_type("PUNCT").token_value(&tok), "PUNCT");
    }

    #[test]
    fn display_forms() {
        assert_eq!(MatchSpec::literal("+").to_string(), "\"+\"");
        assert_eq!(MatchSpec::token_type("NUMLIT").to_string(), "<NUMLIT>");
        assert_eq!(MatchSpec::literal_until("*/").to_string(), "until \"*/\"");
        assert_eq!(MatchSpec::token_type_until("WS").to_string(), "until <WS>");
    }
}
