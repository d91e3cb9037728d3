//! Grammar definitions: elements, rules and the validated rule table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{EvalError, GrammarError};
use crate::eval::Eval;
use crate::matcher::MatchSpec;
use crate::term::Term;
use crate::token::{default_whitespace_kinds, Token};

/// A semantic function attached to a rule.
pub type SemanticFn<V> = Arc<dyn Fn(&Term, &Eval<'_, V>) -> Result<V, EvalError> + Send + Sync>;

/// One alternative of a rule: elements matched in sequence.
pub type Production = Vec<Element>;

// ──────────────────────────────────────────────
// Elements
// ──────────────────────────────────────────────

/// How many times a referenced rule may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    /// Zero or one match (`[name]`).
    Optional,
    /// Zero or more matches (`name*`).
    Many,
}

/// A reference to another rule by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRef {
    pub name: String,
    pub repeat: Repeat,
}

impl RuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        RuleRef {
            name: name.into(),
            repeat: Repeat::Once,
        }
    }

    pub fn optional(mut self) -> Self {
        self.repeat = Repeat::Optional;
        self
    }

    pub fn many(mut self) -> Self {
        self.repeat = Repeat::Many;
        self
    }

    /// Parse the bracket notation: `name*` repeats, `[name]` is optional,
    /// anything else is a plain reference.
    pub fn parse(notation: &str) -> Self {
        let notation = notation.trim();
        if let Some(name) = notation.strip_suffix('*') {
            RuleRef::new(name.trim()).many()
        } else if let Some(name) = notation
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            RuleRef::new(name.trim()).optional()
        } else {
            RuleRef::new(notation)
        }
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repeat {
            Repeat::Once => write!(f, "{}", self.name),
            Repeat::Optional => write!(f, "[{}]", self.name),
            Repeat::Many => write!(f, "{}*", self.name),
        }
    }
}

/// A production element: a rule reference or a terminal matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Rule(RuleRef),
    Match(MatchSpec),
}

impl Element {
    pub fn rule(name: impl Into<String>) -> Self {
        Element::Rule(RuleRef::new(name))
    }

    /// A rule reference in bracket notation, see [`RuleRef::parse`].
    pub fn parse_ref(notation: &str) -> Self {
        Element::Rule(RuleRef::parse(notation))
    }

    pub fn as_rule_ref(&self) -> Option<&RuleRef> {
        match self {
            Element::Rule(r) => Some(r),
            Element::Match(_) => None,
        }
    }
}

impl From<RuleRef> for Element {
    fn from(r: RuleRef) -> Self {
        Element::Rule(r)
    }
}

impl From<MatchSpec> for Element {
    fn from(m: MatchSpec) -> Self {
        Element::Match(m)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Rule(r) => r.fmt(f),
            Element::Match(m) => m.fmt(f),
        }
    }
}

// ── Element shorthands ───────────────────────────────────────────────

/// A reference that must match once.
pub fn rule(name: &str) -> Element {
    Element::rule(name)
}

/// A reference that may match zero or one time.
pub fn optional(name: &str) -> Element {
    RuleRef::new(name).optional().into()
}

/// A reference that may match any number of times.
pub fn many(name: &str) -> Element {
    RuleRef::new(name).many().into()
}

pub fn lit(text: &str) -> Element {
    MatchSpec::literal(text).into()
}

pub fn lit_until(text: &str) -> Element {
    MatchSpec::literal_until(text).into()
}

pub fn token_type(kind: &str) -> Element {
    MatchSpec::token_type(kind).into()
}

pub fn token_type_until(kind: &str) -> Element {
    MatchSpec::token_type_until(kind).into()
}

// ──────────────────────────────────────────────
// Rules
// ──────────────────────────────────────────────

/// A named rule: ordered alternatives and an optional semantic function.
pub struct Rule<V> {
    name: String,
    alternatives: Vec<Production>,
    evaluator: Option<SemanticFn<V>>,
}

impl<V> Rule<V> {
    /// Create a rule, rejecting empty alternatives, empty match values and
    /// alternatives that start with a reference to the rule itself.
    pub fn new(name: impl Into<String>, alternatives: Vec<Production>) -> Result<Self, GrammarError> {
        let name = name.into();
        if alternatives.is_empty() {
            return Err(GrammarError::EmptyRule { rule: name });
        }
        for (index, production) in alternatives.iter().enumerate() {
            let Some(first) = production.first() else {
                return Err(GrammarError::EmptyProduction { rule: name, index });
            };
            if matches!(first, Element::Rule(r) if r.name == name) {
                return Err(GrammarError::LeftRecursion { rule: name });
            }
            if production
                .iter()
                .any(|e| matches!(e, Element::Match(m) if m.value.is_empty()))
            {
                return Err(GrammarError::EmptyMatchValue { rule: name });
            }
        }
        Ok(Rule {
            name,
            alternatives,
            evaluator: None,
        })
    }

    pub fn with_evaluator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Term, &Eval<'_, V>) -> Result<V, EvalError> + Send + Sync + 'static,
    {
        self.evaluator = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alternatives(&self) -> &[Production] {
        &self.alternatives
    }

    pub fn evaluator(&self) -> Option<&SemanticFn<V>> {
        self.evaluator.as_ref()
    }

    fn references(&self) -> impl Iterator<Item = &RuleRef> {
        self.alternatives
            .iter()
            .flatten()
            .filter_map(Element::as_rule_ref)
    }
}

impl<V> Clone for Rule<V> {
    fn clone(&self) -> Self {
        Rule {
            name: self.name.clone(),
            alternatives: self.alternatives.clone(),
            evaluator: self.evaluator.clone(),
        }
    }
}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("alternatives", &self.alternatives)
            .field("evaluator", &self.evaluator.is_some())
            .finish()
    }
}

impl<V> fmt::Display for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :=", self.name)?;
        for (i, production) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, " |")?;
            }
            for element in production {
                write!(f, " {element}")?;
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Grammar
// ──────────────────────────────────────────────

/// Default nesting limit. Each level costs a few parser frames, and this
/// bound keeps a debug build inside a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Parser behaviour shared by every rule of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConfig {
    /// Skip whitespace tokens before each non-inverse element.
    pub skip_whitespace: bool,
    /// Token kinds treated as whitespace.
    pub whitespace_kinds: Vec<String>,
    /// Maximum nesting of rule invocations during a parse.
    pub max_depth: usize,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            skip_whitespace: true,
            whitespace_kinds: default_whitespace_kinds(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A validated rule table with a designated root rule.
///
/// `V` is the value type produced by the rules' semantic functions. Word
/// grammars that are only parsed use the default `()`.
pub struct Grammar<V = ()> {
    root: String,
    rules: BTreeMap<String, Rule<V>>,
    config: GrammarConfig,
}

impl<V> Grammar<V> {
    pub fn builder(root: impl Into<String>) -> GrammarBuilder<V> {
        GrammarBuilder {
            root: root.into(),
            rules: Vec::new(),
            errors: Vec::new(),
            config: GrammarConfig::default(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule<V>> {
        self.rules.values()
    }

    pub fn try_lookup(&self, name: &str) -> Option<&Rule<V>> {
        self.rules.get(name)
    }

    /// Look up a rule that is known to exist.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared. `build()` rejects grammars with
    /// dangling references, so this only fires when a caller names a rule
    /// that is not part of the grammar.
    pub fn lookup(&self, name: &str) -> &Rule<V> {
        self.rules
            .get(name)
            .unwrap_or_else(|| panic!("rule '{name}' is not declared in this grammar"))
    }

    /// True when the parser should skip `token` as whitespace.
    pub fn skips(&self, token: &Token) -> bool {
        self.config.skip_whitespace && token.is_whitespace_in(&self.config.whitespace_kinds)
    }

    /// True when `token` is of a whitespace kind, whether or not it is skipped.
    pub fn is_whitespace(&self, token: &Token) -> bool {
        token.is_whitespace_in(&self.config.whitespace_kinds)
    }
}

impl<V> Clone for Grammar<V> {
    fn clone(&self) -> Self {
        Grammar {
            root: self.root.clone(),
            rules: self.rules.clone(),
            config: self.config.clone(),
        }
    }
}

impl<V> fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("root", &self.root)
            .field("rules", &self.rules)
            .field("config", &self.config)
            .finish()
    }
}

impl<V> fmt::Display for Grammar<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(root) = self.rules.get(&self.root) {
            writeln!(f, "{root}")?;
        }
        for rule in self.rules.values().filter(|r| r.name != self.root) {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

/// Collects rules and validates them as a whole.
pub struct GrammarBuilder<V> {
    root: String,
    rules: Vec<Rule<V>>,
    errors: Vec<GrammarError>,
    config: GrammarConfig,
}

impl<V> GrammarBuilder<V> {
    /// Declare a rule without a semantic function.
    pub fn rule(mut self, name: &str, alternatives: Vec<Production>) -> Self {
        match Rule::new(name, alternatives) {
            Ok(rule) => self.rules.push(rule),
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Declare a rule with a semantic function.
    pub fn rule_with<F>(mut self, name: &str, alternatives: Vec<Production>, f: F) -> Self
    where
        F: Fn(&Term, &Eval<'_, V>) -> Result<V, EvalError> + Send + Sync + 'static,
    {
        match Rule::new(name, alternatives) {
            Ok(rule) => self.rules.push(rule.with_evaluator(f)),
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Declare an already constructed rule.
    pub fn add_rule(mut self, rule: Rule<V>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Turn off whitespace skipping: every token must be matched explicitly.
    pub fn whitespace_significant(mut self) -> Self {
        self.config.skip_whitespace = false;
        self
    }

    pub fn whitespace_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.whitespace_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Validate the rule table and produce the grammar.
    ///
    /// Reports the first problem found: a malformed rule, a duplicate
    /// name, an undeclared root or reference, or left recursion through
    /// any chain of leftmost references.
    pub fn build(self) -> Result<Grammar<V>, GrammarError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let order: Vec<String> = self.rules.iter().map(|r| r.name.clone()).collect();
        let mut rules = BTreeMap::new();
        for rule in self.rules {
            let name = rule.name.clone();
            if rules.insert(name.clone(), rule).is_some() {
                return Err(GrammarError::DuplicateRule { rule: name });
            }
        }

        if !rules.contains_key(&self.root) {
            return Err(GrammarError::UndeclaredRoot { rule: self.root });
        }

        for name in &order {
            let rule = &rules[name];
            if let Some(missing) = rule.references().find(|r| !rules.contains_key(&r.name)) {
                return Err(GrammarError::UndeclaredRule {
                    rule: missing.name.clone(),
                    referenced_by: name.clone(),
                });
            }
        }

        check_left_recursion(&rules)?;

        Ok(Grammar {
            root: self.root,
            rules,
            config: self.config,
        })
    }
}

// ──────────────────────────────────────────────
// Left recursion analysis
// ──────────────────────────────────────────────

fn element_nullable(element: &Element, nullable: &BTreeSet<&str>) -> bool {
    match element {
        Element::Rule(r) => r.repeat != Repeat::Once || nullable.contains(r.name.as_str()),
        // An inverse match succeeds without consuming when the terminator is next.
        Element::Match(m) => m.inverse,
    }
}

/// Rules that can match without consuming any token.
fn nullable_rules<V>(rules: &BTreeMap<String, Rule<V>>) -> BTreeSet<&str> {
    let mut nullable = BTreeSet::new();
    loop {
        let mut changed = false;
        for (name, rule) in rules {
            if nullable.contains(name.as_str()) {
                continue;
            }
            let derives_empty = rule
                .alternatives
                .iter()
                .any(|p| p.iter().all(|e| element_nullable(e, &nullable)));
            if derives_empty {
                nullable.insert(name.as_str());
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

/// For each rule, the rules it may invoke before consuming a token.
fn leftmost_edges<'a, V>(
    rules: &'a BTreeMap<String, Rule<V>>,
    nullable: &BTreeSet<&str>,
) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut edges = BTreeMap::new();
    for (name, rule) in rules {
        let mut targets = Vec::new();
        for production in &rule.alternatives {
            for element in production {
                if let Element::Rule(r) = element {
                    targets.push(r.name.as_str());
                }
                if !element_nullable(element, nullable) {
                    break;
                }
            }
        }
        edges.insert(name.as_str(), targets);
    }
    edges
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn find_cycle<'a>(
    node: &'a str,
    edges: &BTreeMap<&'a str, Vec<&'a str>>,
    marks: &mut BTreeMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<&'a str>> {
    match marks.get(node) {
        Some(Mark::Done) => return None,
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| *n == node)?;
            let mut cycle = path[start..].to_vec();
            cycle.push(node);
            return Some(cycle);
        }
        None => {}
    }
    marks.insert(node, Mark::Visiting);
    path.push(node);
    for &next in edges.get(node).into_iter().flatten() {
        if let Some(cycle) = find_cycle(next, edges, marks, path) {
            return Some(cycle);
        }
    }
    path.pop();
    marks.insert(node, Mark::Done);
    None
}

fn check_left_recursion<V>(rules: &BTreeMap<String, Rule<V>>) -> Result<(), GrammarError> {
    let nullable = nullable_rules(rules);
    let edges = leftmost_edges(rules, &nullable);
    let mut marks = BTreeMap::new();
    for &name in edges.keys() {
        let mut path = Vec::new();
        if let Some(cycle) = find_cycle(name, &edges, &mut marks, &mut path) {
            return Err(GrammarError::IndirectLeftRecursion {
                cycle: cycle.join(" -> "),
            });
        }
    }
    Ok(())
}
