use std::time::Instant;

use tracing::{debug, trace};

use super::failure::{Failure, Fatal};
use super::ParseOptions;
use crate::grammar::{Element, Grammar, Repeat};
use crate::matcher::MatchSpec;
use crate::term::{Node, Term};
use crate::token::Token;

/// Outcome of trying one rule at one position.
pub(crate) enum Attempt {
    Matched { term: Term, consumed: usize },
    Failed(Failure),
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

/// Backtracking recursive descent over a token slice.
///
/// Tokens are never copied out of the slice except into the Term that
/// matched them. The furthest failure seen is tracked for error reporting.
pub(crate) struct Parser<'g, 't, V> {
    grammar: &'g Grammar<V>,
    tokens: &'t [Token],
    max_depth: usize,
    deadline: Option<Instant>,
    depth: usize,
    furthest: Option<Failure>,
}

impl<'g, 't, V> Parser<'g, 't, V> {
    pub fn new(grammar: &'g Grammar<V>, tokens: &'t [Token], options: &ParseOptions) -> Self {
        Parser {
            grammar,
            tokens,
            max_depth: options.max_depth.unwrap_or(grammar.config().max_depth),
            deadline: options.deadline,
            depth: 0,
            furthest: None,
        }
    }

    /// Parse the root rule; it must consume every token apart from
    /// trailing whitespace.
    pub fn parse_root(&mut self) -> Term {
        let root = self.grammar.root();
        match self.parse_rule(root, 0) {
            Err(fatal) => {
                debug!(rule = root, error = ?fatal, "parse aborted");
                Term::failed(root, fatal.into_error(self.tokens))
            }
            Ok(Attempt::Failed(failure)) => {
                debug!(rule = root, at = failure.at, "root rule did not match");
                Term::failed(root, failure.into_error(self.tokens))
            }
            Ok(Attempt::Matched { mut term, consumed }) => {
                let end = self.skip_whitespace(consumed, &mut term);
                if end == self.tokens.len() {
                    return term;
                }
                debug!(rule = root, consumed = end, total = self.tokens.len(), "input left over");
                Term::failed(root, Failure::new(end, "end of input").into_error(self.tokens))
            }
        }
    }

    /// Try every alternative of `name` at token index `start`.
    pub fn parse_rule(&mut self, name: &str, start: usize) -> Result<Attempt, Fatal> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Fatal::TimedOut { at: start });
            }
        }
        if self.depth >= self.max_depth {
            return Err(Fatal::DepthExceeded {
                at: start,
                limit: self.max_depth,
            });
        }

        self.depth += 1;
        let outer = self.furthest.take();
        let result = self.try_alternatives(name, start);
        let local = self.furthest.take();
        self.furthest = Failure::merge(outer, local.clone());
        self.depth -= 1;

        Ok(match result? {
            Some((term, consumed)) => Attempt::Matched { term, consumed },
            None => Attempt::Failed(local.unwrap_or_else(|| Failure::bare(start))),
        })
    }

    fn try_alternatives(&mut self, name: &str, start: usize) -> Result<Option<(Term, usize)>, Fatal> {
        let grammar = self.grammar;
        let rule = grammar.lookup(name);
        for (index, production) in rule.alternatives().iter().enumerate() {
            trace!(rule = name, alternative = index, start, depth = self.depth, "trying");
            if let Some((term, end)) = self.match_production(name, production, start)? {
                trace!(rule = name, alternative = index, start, end, "matched");
                return Ok(Some((term, end - start)));
            }
        }
        trace!(rule = name, start, "no alternative matched");
        Ok(None)
    }

    /// Match one alternative. Returns the Term and the index after it.
    fn match_production(
        &mut self,
        name: &str,
        production: &[Element],
        start: usize,
    ) -> Result<Option<(Term, usize)>, Fatal> {
        let mut term = Term::new(name);
        let mut pos = start;

        for element in production {
            match element {
                Element::Match(spec) if spec.inverse => {
                    pos = self.scan_until(spec, pos, &mut term)?;
                }
                Element::Match(spec) => {
                    pos = self.skip_whitespace(pos, &mut term);
                    match self.tokens.get(pos) {
                        Some(tok) if spec.matches(tok) => {
                            term.push(Node::Token(tok.clone()));
                            pos += 1;
                        }
                        _ => {
                            self.fail(pos, spec.to_string());
                            return Ok(None);
                        }
                    }
                }
                Element::Rule(r) => match r.repeat {
                    Repeat::Once => {
                        pos = self.skip_whitespace(pos, &mut term);
                        match self.parse_rule(&r.name, pos)? {
                            Attempt::Matched {
                                term: child,
                                consumed,
                            } => {
                                term.push(Node::Term(child));
                                pos += consumed;
                            }
                            Attempt::Failed(_) => return Ok(None),
                        }
                    }
                    Repeat::Optional => {
                        pos = self.skip_whitespace(pos, &mut term);
                        if let Attempt::Matched {
                            term: child,
                            consumed,
                        } = self.parse_rule(&r.name, pos)?
                        {
                            term.push(Node::Term(child));
                            pos += consumed;
                        }
                    }
                    Repeat::Many => loop {
                        pos = self.skip_whitespace(pos, &mut term);
                        match self.parse_rule(&r.name, pos)? {
                            Attempt::Matched {
                                term: child,
                                consumed,
                            } => {
                                term.push(Node::Term(child));
                                pos += consumed;
                                // A match that consumed nothing would repeat forever.
                                if consumed == 0 {
                                    break;
                                }
                            }
                            Attempt::Failed(_) => break,
                        }
                    },
                },
            }
        }

        Ok(Some((term, pos)))
    }

    /// Consume tokens up to, not including, the first one matching `spec`.
    fn scan_until(&self, spec: &MatchSpec, start: usize, term: &mut Term) -> Result<usize, Fatal> {
        let mut pos = start;
        loop {
            match self.tokens.get(pos) {
                Some(tok) if spec.matches(tok) => return Ok(pos),
                Some(tok) => {
                    term.push(Node::Token(tok.clone()));
                    pos += 1;
                }
                None => {
                    return Err(Fatal::Unterminated {
                        at: start.saturating_sub(1),
                        terminator: spec.value.clone(),
                    })
                }
            }
        }
    }

    fn skip_whitespace(&self, mut pos: usize, term: &mut Term) -> usize {
        while let Some(tok) = self.tokens.get(pos) {
            if !self.grammar.skips(tok) {
                break;
            }
            term.push(Node::Space(tok.clone()));
            pos += 1;
        }
        pos
    }

    fn fail(&mut self, at: usize, expected: String) {
        self.furthest = Failure::merge(self.furthest.take(), Some(Failure::new(at, expected)));
    }
}
