use crate::error::GrammarError;
use std::collections::{HashMap, HashSet};
use std::{fmt, slice};

/// What a `Production` rewrites its key into.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Body {
    /// A set of literal tokens. May be empty: the symbol exists but matches nothing.
    Terminal(Vec<String>),
    /// Exactly two component symbols.
    Nonterminal { left: String, right: String },
}

/// A rule of a grammar in Chomsky Normal Form.
///
/// Several productions may share a key. That is how alternative derivations
/// under one symbol name are expressed (eg: `N -> DT N` and `N -> J N`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Production {
    pub key: String,
    pub body: Body,
}

impl Production {
    pub fn terminal<L: AsRef<str>>(key: impl Into<String>, literals: &[L]) -> Self {
        Production {
            key: key.into(),
            body: Body::Terminal(literals.iter().map(|l| l.as_ref().to_string()).collect()),
        }
    }

    pub fn nonterminal(
        key: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Production {
            key: key.into(),
            body: Body::Nonterminal { left: left.into(), right: right.into() },
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.body, Body::Terminal(_))
    }

    /// Literal set of a terminal production, empty for nonterminals.
    pub fn literals(&self) -> &[String] {
        match &self.body {
            Body::Terminal(literals) => literals,
            Body::Nonterminal { .. } => &[],
        }
    }

    /// Left and right component symbols of a nonterminal production.
    pub fn components(&self) -> Option<(&str, &str)> {
        match &self.body {
            Body::Nonterminal { left, right } => Some((left, right)),
            Body::Terminal(_) => None,
        }
    }

    fn validate(&self) -> Result<(), GrammarError> {
        if self.key.is_empty() {
            return Err(GrammarError::EmptyKey);
        }
        match self.components() {
            Some((left, right)) if left.is_empty() || right.is_empty() => {
                Err(GrammarError::EmptySymbol(self.key.clone()))
            }
            _ => Ok(()),
        }
    }

    // Same key and same body, terminal literals compared as sets
    fn same_rule(&self, other: &Production) -> bool {
        if self.key != other.key {
            return false;
        }
        match (&self.body, &other.body) {
            (Body::Terminal(a), Body::Terminal(b)) => {
                a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.body {
            Body::Nonterminal { left, right } => write!(f, "{} -> {} {}", self.key, left, right),
            Body::Terminal(literals) => {
                let alternatives = literals
                    .iter()
                    .map(|l| format!("{:?}", l))
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "{} -> {}", self.key, alternatives)
            }
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

/// An ordered, immutable collection of productions.
///
/// Lookups by literal token and by component pair go through indexes built
/// once on construction. Each index bucket keeps grammar definition order so
/// the first defined production is always the first match.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    productions: Vec<Production>,
    by_literal: HashMap<String, Vec<usize>>,
    by_pair: HashMap<String, HashMap<String, Vec<usize>>>,
}

/// Productions matching a lookup, in grammar definition order.
pub struct Matches<'g> {
    productions: &'g [Production],
    indexes: slice::Iter<'g, usize>,
}

impl<'g> Iterator for Matches<'g> {
    type Item = &'g Production;
    fn next(&mut self) -> Option<Self::Item> {
        self.indexes.next().map(|&idx| &self.productions[idx])
    }
}

impl Grammar {
    pub fn new(productions: Vec<Production>) -> Grammar {
        let mut by_literal: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_pair: HashMap<String, HashMap<String, Vec<usize>>> = HashMap::new();
        for (idx, production) in productions.iter().enumerate() {
            match &production.body {
                Body::Terminal(literals) => {
                    for literal in literals {
                        let bucket = by_literal.entry(literal.clone()).or_default();
                        // a literal repeated within one production still matches once
                        if bucket.last() != Some(&idx) {
                            bucket.push(idx);
                        }
                    }
                }
                Body::Nonterminal { left, right } => by_pair
                    .entry(left.clone())
                    .or_default()
                    .entry(right.clone())
                    .or_default()
                    .push(idx),
            }
        }
        Grammar { productions, by_literal, by_pair }
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Distinct production keys in the order they are first defined.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for production in &self.productions {
            if !keys.contains(&production.key()) {
                keys.push(production.key());
            }
        }
        keys
    }

    /// Terminal productions whose literal set contains `token`.
    pub fn matches_literal(&self, token: &str) -> Matches<'_> {
        let indexes = self.by_literal.get(token).map_or(&[][..], Vec::as_slice);
        Matches { productions: &self.productions, indexes: indexes.iter() }
    }

    /// Nonterminal productions rewriting into exactly `left` followed by `right`.
    pub fn matches_pair(&self, left: &str, right: &str) -> Matches<'_> {
        let indexes = self.by_pair.get(left)
            .and_then(|rights| rights.get(right))
            .map_or(&[][..], Vec::as_slice);
        Matches { productions: &self.productions, indexes: indexes.iter() }
    }
}

impl FromIterator<Production> for Grammar {
    fn from_iter<I: IntoIterator<Item = Production>>(iter: I) -> Self {
        Grammar::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}

///////////////////////////////////////////////////////////////////////////////

/// Builds a Grammar while checking each production is well formed.
///
/// Chained calls record the first problem found, which `into_grammar` reports.
/// Component symbols that no production defines are accepted, they never match.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    productions: Vec<Production>,
    error: Option<GrammarError>,
}

impl GrammarBuilder {
    /// Register a production, failing on malformed or repeated ones.
    pub fn try_push(&mut self, production: Production) -> Result<(), GrammarError> {
        production.validate()?;
        // A repeat would double every derivation that uses it
        if self.productions.iter().any(|p| p.same_rule(&production)) {
            return Err(GrammarError::DuplicateProduction(production.to_string()));
        }
        self.productions.push(production);
        Ok(())
    }

    fn push(&mut self, production: Production) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.try_push(production) {
            self.error = Some(e);
        }
    }

    pub fn production(mut self, production: Production) -> Self {
        self.push(production);
        self
    }

    pub fn terminal<L: AsRef<str>>(mut self, key: impl Into<String>, literals: &[L]) -> Self {
        self.push(Production::terminal(key, literals));
        self
    }

    pub fn rule(
        mut self,
        key: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.push(Production::nonterminal(key, left, right));
        self
    }

    pub fn into_grammar(self) -> Result<Grammar, GrammarError> {
        self.error.map_or(Ok(Grammar::new(self.productions)), Err)
    }
}

///////////////////////////////////////////////////////////////////////////////
