use crate::term::{ErrorKind, TermError};
use crate::token::Token;

/// Cap on the expectations listed in a syntax error message.
const MAX_EXPECTED: usize = 8;

/// The furthest point a failed element reached, and what it wanted there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Failure {
    pub at: usize,
    pub expected: Vec<String>,
}

impl Failure {
    pub fn new(at: usize, expected: impl Into<String>) -> Self {
        Failure {
            at,
            expected: vec![expected.into()],
        }
    }

    pub fn bare(at: usize) -> Self {
        Failure {
            at,
            expected: Vec::new(),
        }
    }

    /// Keep whichever failure got further. On a tie the expectations are
    /// combined, earlier ones first.
    pub fn merge(a: Option<Failure>, b: Option<Failure>) -> Option<Failure> {
        match (a, b) {
            (None, other) | (other, None) => other,
            (Some(a), Some(b)) if b.at > a.at => Some(b),
            (Some(mut a), Some(b)) if a.at == b.at => {
                for e in b.expected {
                    if !a.expected.contains(&e) {
                        a.expected.push(e);
                    }
                }
                Some(a)
            }
            (a, _) => a,
        }
    }

    pub fn into_error(self, tokens: &[Token]) -> TermError {
        let token = tokens.get(self.at).cloned();
        let found = match &token {
            Some(tok) => format!("unexpected {:?}", tok.text),
            None => "unexpected end of input".to_string(),
        };
        let message = if self.expected.is_empty() {
            format!("syntax error: {found}")
        } else {
            format!(
                "syntax error: {found}, expected {}",
                describe_expected(&self.expected)
            )
        };
        TermError::new(ErrorKind::Syntax, message, token)
    }
}

fn describe_expected(expected: &[String]) -> String {
    let shown = &expected[..expected.len().min(MAX_EXPECTED)];
    let mut out = match shown {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    };
    if expected.len() > MAX_EXPECTED {
        out.push_str(", ...");
    }
    out
}

/// Errors that end the whole parse instead of failing one alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fatal {
    /// An "until" element ran out of input. `at` is the token before the
    /// scanned body.
    Unterminated { at: usize, terminator: String },
    DepthExceeded { at: usize, limit: usize },
    TimedOut { at: usize },
}

impl Fatal {
    pub fn into_error(self, tokens: &[Token]) -> TermError {
        match self {
            Fatal::Unterminated { at, terminator } => TermError::new(
                ErrorKind::UnterminatedLiteral,
                format!("unterminated literal: no {terminator:?} before end of input"),
                tokens.get(at).cloned(),
            ),
            Fatal::DepthExceeded { at, limit } => TermError::new(
                ErrorKind::DepthExceeded,
                format!("rule nesting exceeded the limit of {limit}"),
                tokens.get(at).cloned(),
            ),
            Fatal::TimedOut { at } => TermError::new(
                ErrorKind::TimedOut,
                "parse deadline exceeded",
                tokens.get(at).cloned(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::kind;

    #[test]
    fn merge_keeps_the_furthest_failure() {
        let merged = Failure::merge(Some(Failure::new(2, "\"+\"")), Some(Failure::new(5, "\")\"")));
        assert_eq!(merged, Some(Failure::new(5, "\")\"")));

        let merged = Failure::merge(Some(Failure::new(7, "a")), Some(Failure::new(5, "b")));
        assert_eq!(merged, Some(Failure::new(7, "a")));
    }

    #[test]
    fn merge_combines_expectations_on_ties() {
        let merged = Failure::merge(Some(Failure::new(3, "\"+\"")), Some(Failure::new(3, "\"-\"")))
            .unwrap();
        assert_eq!(merged.expected, vec!["\"+\"", "\"-\""]);
    }

    #[test]
    fn syntax_message_lists_expectations() {
        let tokens = vec![Token::new(")", kind::PUNCT, 1, 5)];
        let mut failure = Failure::new(0, "\"+\"");
        failure.expected.push("\"-\"".into());
        failure.expected.push("end of input".into());
        let err = failure.into_error(&tokens);
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(
            err.message,
            "syntax error: unexpected \")\", expected \"+\", \"-\" or end of input"
        );
        assert_eq!(err.token.unwrap().column, 5);
    }

    #[test]
    fn failure_past_the_last_token_has_no_token() {
        let err = Failure::new(1, "<NUMLIT>").into_error(&[Token::new("+", kind::PUNCT, 1, 1)]);
        assert!(err.token.is_none());
        assert_eq!(err.stopped_at(), "end of input");
    }
}
