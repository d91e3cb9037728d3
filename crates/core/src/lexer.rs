//! Character-level tokenizer.
//!
//! A single left-to-right pass with one character of pushback: a character
//! that does not extend the open run finishes it and is looked at again from
//! the start state. The lexer never fails.

use tracing::trace;

use crate::token::{kind, Token};

/// Character classes used to split source text into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerProfile {
    /// Letter runs become `WORD`, digit runs `NUMLIT`, every other
    /// character is a one-character `PUNCT` token.
    #[default]
    Grammar,
    /// Front end for word-building grammars: `IDENT` runs may contain
    /// digits, `NUMLIT` runs may contain letters, punctuation is the ASCII
    /// punctuation set minus the backtick and anything else is dropped.
    /// Each newline is its own `WS` token so that line-oriented constructs
    /// can be terminated by it.
    Words,
}

impl LexerProfile {
    fn starts_word(self, c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn continues_word(self, c: char) -> bool {
        match self {
            LexerProfile::Grammar => c.is_ascii_alphabetic() || c == '_',
            LexerProfile::Words => c.is_ascii_alphanumeric() || c == '_',
        }
    }

    fn continues_number(self, c: char) -> bool {
        match self {
            LexerProfile::Grammar => c.is_ascii_digit(),
            LexerProfile::Words => c.is_ascii_alphanumeric(),
        }
    }

    fn is_punct(self, c: char) -> bool {
        match self {
            LexerProfile::Grammar => true,
            LexerProfile::Words => c.is_ascii_punctuation() && c != '`',
        }
    }

    fn splits_newlines(self) -> bool {
        self == LexerProfile::Words
    }

    fn word_kind(self) -> &'static str {
        match self {
            LexerProfile::Grammar => kind::WORD,
            LexerProfile::Words => kind::IDENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Whitespace,
    Word,
    Number,
}

/// Tokenize `source` with the grammar profile.
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with(source, LexerProfile::Grammar)
}

/// Tokenize `source` with the given character profile.
pub fn tokenize_with(source: &str, profile: LexerProfile) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut line: u32 = 1;
    let mut column: u32 = 1;

    let mut state = State::Start;
    let mut run = String::new();
    let mut run_line = line;
    let mut run_column = column;

    while pos < chars.len() {
        let c = chars[pos];

        if state != State::Start {
            let extends = match state {
                State::Whitespace => {
                    c.is_whitespace() && !(profile.splits_newlines() && c == '\n')
                }
                State::Word => profile.continues_word(c),
                State::Number => profile.continues_number(c),
                State::Start => false,
            };
            if extends {
                run.push(c);
                advance(c, &mut pos, &mut line, &mut column);
            } else {
                // Pushback: `c` is examined again from the start state.
                finish_run(&mut tokens, state, profile, &mut run, run_line, run_column);
                state = State::Start;
            }
            continue;
        }

        run_line = line;
        run_column = column;

        if c.is_whitespace() {
            if profile.splits_newlines() && c == '\n' {
                push(&mut tokens, "\n".to_string(), kind::WS, line, column);
                advance(c, &mut pos, &mut line, &mut column);
                continue;
            }
            state = State::Whitespace;
        } else if profile.starts_word(c) {
            state = State::Word;
        } else if c.is_ascii_digit() {
            state = State::Number;
        } else if profile.is_punct(c) {
            push(&mut tokens, c.to_string(), kind::PUNCT, line, column);
            advance(c, &mut pos, &mut line, &mut column);
            continue;
        } else {
            trace!(character = %c.escape_debug(), line, column, "skipping character");
            advance(c, &mut pos, &mut line, &mut column);
            continue;
        }

        run.push(c);
        advance(c, &mut pos, &mut line, &mut column);
    }

    if state != State::Start {
        finish_run(&mut tokens, state, profile, &mut run, run_line, run_column);
    }

    tokens
}

fn advance(c: char, pos: &mut usize, line: &mut u32, column: &mut u32) {
    *pos += 1;
    if c == '\n' {
        *line += 1;
        *column = 1;
    } else {
        *column += 1;
    }
}

fn finish_run(
    tokens: &mut Vec<Token>,
    state: State,
    profile: LexerProfile,
    run: &mut String,
    line: u32,
    column: u32,
) {
    let label = match state {
        State::Whitespace => kind::WS,
        State::Word => profile.word_kind(),
        State::Number => kind::NUMLIT,
        State::Start => return,
    };
    push(tokens, std::mem::take(run), label, line, column);
}

fn push(tokens: &mut Vec<Token>, text: String, label: &str, line: u32, column: u32) {
    trace!(text = %text.escape_debug(), kind = label, line, column, "token");
    tokens.push(Token::new(text, label, line, column));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.kind.as_str()).collect()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn grammar_profile_splits_runs_and_punctuation() {
        let tokens = tokenize("a1 + 22");
        assert_eq!(texts(&tokens), vec!["a", "1", " ", "+", " ", "22"]);
        assert_eq!(kinds(&tokens), vec!["WORD", "NUMLIT", "WS", "PUNCT", "WS", "NUMLIT"]);
    }

    #[test]
    fn exponent_letter_is_its_own_word() {
        let tokens = tokenize("1.5e+2");
        assert_eq!(texts(&tokens), vec!["1", ".", "5", "e", "+", "2"]);
    }

    #[test]
    fn concatenated_text_reproduces_source() {
        let source = "  (1 + 2)\n\t* foo_bar ; é";
        let joined: String = tokenize(source).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn empty_source_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize_with("", LexerProfile::Words).is_empty());
    }

    #[test]
    fn positions_follow_lines_and_columns() {
        let tokens = tokenize("1\n+ 2\n+3\n +4");
        let plus: Vec<_> = tokens
            .iter()
            .filter(|t| t.text == "+")
            .map(|t| (t.line, t.column))
            .collect();
        assert_eq!(plus, vec![(2, 1), (3, 1), (4, 2)]);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    }

    #[test]
    fn crlf_counts_as_one_line_break() {
        let tokens = tokenize("1\r\n+ 2\r\n+3");
        let last = tokens.last().unwrap();
        assert_eq!(last.text, "3");
        assert_eq!((last.line, last.column), (3, 2));
    }

    #[test]
    fn blank_lines_are_counted() {
        let tokens = tokenize("a\n\n\nb");
        let b = tokens.last().unwrap();
        assert_eq!((b.line, b.column), (4, 1));
    }

    #[test]
    fn words_profile_identifiers_and_numbers() {
        let tokens = tokenize_with("abc1 0x1F _x", LexerProfile::Words);
        let words: Vec<_> = tokens.iter().filter(|t| t.kind != kind::WS).collect();
        assert_eq!(words[0].text, "abc1");
        assert_eq!(words[0].kind, kind::IDENT);
        assert_eq!(words[1].text, "0x1F");
        assert_eq!(words[1].kind, kind::NUMLIT);
        assert_eq!(words[2].text, "_x");
        assert_eq!(words[2].kind, kind::IDENT);
    }

    #[test]
    fn words_profile_drops_unclassified_characters() {
        let tokens = tokenize_with("a`b é c", LexerProfile::Words);
        assert_eq!(texts(&tokens), vec!["a", "b", " ", " ", "c"]);
        let c = tokens.last().unwrap();
        assert_eq!(c.column, 7, "skipped characters still advance the column");
    }

    #[test]
    fn words_profile_emits_newlines_separately() {
        let tokens = tokenize_with("a  \n  b", LexerProfile::Words);
        assert_eq!(texts(&tokens), vec!["a", "  ", "\n", "  ", "b"]);
        assert_eq!(tokens[4].line, 2);
    }
}
