use crate::grammar::Production;
use std::fmt;

/// Shared handle to a parse node.
///
/// The chart hands the same sub-derivation to every parent built on top of
/// it. Nodes are never mutated so sharing is indistinguishable from owning
/// a private copy of the subtree.
#[cfg(not(feature = "parallel"))]
pub type ParseRef<'g> = std::rc::Rc<Parse<'g>>;
#[cfg(feature = "parallel")]
pub type ParseRef<'g> = std::sync::Arc<Parse<'g>>;

#[derive(Debug, PartialEq, Eq)]
pub enum Derivation<'g> {
    /// The token matched by a terminal production
    Leaf(String),
    /// Left and right sub-derivations of a nonterminal production
    Branch(ParseRef<'g>, ParseRef<'g>),
}

/// One concrete derivation step: the `Production` that licensed it plus
/// either the matched token or the two sub-derivations.
///
/// A `Parse` only refers to productions of the `Grammar` it was built from,
/// hence the `'g` lifetime.
#[derive(Debug, PartialEq, Eq)]
pub struct Parse<'g> {
    production: &'g Production,
    derivation: Derivation<'g>,
}

impl<'g> Parse<'g> {
    pub fn leaf(production: &'g Production, token: impl Into<String>) -> Self {
        Parse { production, derivation: Derivation::Leaf(token.into()) }
    }

    pub fn branch(production: &'g Production, left: ParseRef<'g>, right: ParseRef<'g>) -> Self {
        Parse { production, derivation: Derivation::Branch(left, right) }
    }

    pub fn key(&self) -> &'g str {
        self.production.key()
    }

    pub fn production(&self) -> &'g Production {
        self.production
    }

    pub fn derivation(&self) -> &Derivation<'g> {
        &self.derivation
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.derivation, Derivation::Leaf(_))
    }

    pub fn token(&self) -> Option<&str> {
        match &self.derivation {
            Derivation::Leaf(token) => Some(token.as_str()),
            Derivation::Branch(..) => None,
        }
    }

    pub fn children(&self) -> Option<(&Parse<'g>, &Parse<'g>)> {
        match &self.derivation {
            Derivation::Branch(left, right) => Some((&**left, &**right)),
            Derivation::Leaf(_) => None,
        }
    }

    /// Every production key in the tree, pre-order: self, left, right.
    /// Reads a derivation top-down and left-to-right.
    pub fn production_keys(&self) -> Vec<&'g str> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, keys: &mut Vec<&'g str>) {
        keys.push(self.key());
        if let Some((left, right)) = self.children() {
            left.collect_keys(keys);
            right.collect_keys(keys);
        }
    }

    /// Token spans of every node whose key is `key`.
    ///
    /// Nodes are visited post-order (left, right, self) so nested matches come
    /// out innermost first. Eg: for `N -> J N` over "big dog" the result is
    /// `[["dog"], ["big", "dog"]]`.
    pub fn production_terminals(&self, key: &str) -> Vec<Vec<&str>> {
        self.nodes_with_key(key)
            .into_iter()
            .flat_map(|node| node.terminal_spans())
            .collect()
    }

    /// Nodes whose key is `key`, post-order (left, right, self).
    pub fn nodes_with_key(&self, key: &str) -> Vec<&Parse<'g>> {
        let mut nodes = Vec::new();
        self.collect_nodes(key, &mut nodes);
        nodes
    }

    fn collect_nodes<'a>(&'a self, key: &str, nodes: &mut Vec<&'a Parse<'g>>) {
        if let Some((left, right)) = self.children() {
            left.collect_nodes(key, nodes);
            right.collect_nodes(key, nodes);
        }
        if self.key() == key {
            nodes.push(self);
        }
    }

    /// Token sequences spanned by this node: every concatenation of a left
    /// span with a right span, left part first.
    pub fn terminal_spans(&self) -> Vec<Vec<&str>> {
        match &self.derivation {
            Derivation::Leaf(token) => vec![vec![token.as_str()]],
            Derivation::Branch(left, right) => {
                let right_spans = right.terminal_spans();
                let mut spans = Vec::new();
                for left_span in left.terminal_spans() {
                    for right_span in &right_spans {
                        let mut span = left_span.clone();
                        span.extend(right_span.iter().copied());
                        spans.push(span);
                    }
                }
                spans
            }
        }
    }

    /// Leaf tokens left to right.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens = Vec::new();
        self.collect_tokens(&mut tokens);
        tokens
    }

    fn collect_tokens<'a>(&'a self, tokens: &mut Vec<&'a str>) {
        match &self.derivation {
            Derivation::Leaf(token) => tokens.push(token),
            Derivation::Branch(left, right) => {
                left.collect_tokens(tokens);
                right.collect_tokens(tokens);
            }
        }
    }

    /// Multi-line drawing of the tree.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_helper("", &mut out);
        out
    }

    fn pretty_helper(&self, level: &str, out: &mut String) {
        match &self.derivation {
            Derivation::Leaf(token) => {
                out.push_str(&format!("{}`-- {} ==> {:?}\n", level, self.key(), token));
            }
            Derivation::Branch(left, right) => {
                out.push_str(&format!("{}`-- {}\n", level, self.production));
                left.pretty_helper(&format!("{}  |", level), out);
                right.pretty_helper(&format!("{}   ", level), out);
            }
        }
    }
}

/// Bracketed form, eg: `(NP (DT the) (N dog))`
impl fmt::Display for Parse<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.derivation {
            Derivation::Leaf(token) => write!(f, "({} {})", self.key(), token),
            Derivation::Branch(left, right) => write!(f, "({} {} {})", self.key(), left, right),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Parse, ParseRef};
    use crate::grammar::Production;

    // "eats", "shoots" and "leaves" are all verbs here, regardless of panda habits
    struct Verbs {
        verb: Production,
        conjunction: Production,
        ccv: Production,
        vp0: Production,
        vp1: Production,
    }

    fn verbs() -> Verbs {
        Verbs {
            verb: Production::terminal("V", &["eats", "shoots", "leaves"]),
            conjunction: Production::terminal("CC", &["and"]),
            ccv: Production::nonterminal("CCV", "CC", "V"),
            vp0: Production::nonterminal("VP0", "V", "CCV"),
            vp1: Production::nonterminal("VP1", "V", "VP1b"),
        }
    }

    fn leaf<'g>(production: &'g Production, token: &str) -> ParseRef<'g> {
        ParseRef::new(Parse::leaf(production, token))
    }

    // (VP1 (V eats) (VP0 (V shoots) (CCV (CC and) (V leaves))))
    fn eats_shoots_and_leaves(g: &Verbs) -> Parse<'_> {
        let and_leaves = ParseRef::new(Parse::branch(
            &g.ccv, leaf(&g.conjunction, "and"), leaf(&g.verb, "leaves")));
        let shoots_and_leaves = ParseRef::new(Parse::branch(
            &g.vp0, leaf(&g.verb, "shoots"), and_leaves));
        Parse::branch(&g.vp1, leaf(&g.verb, "eats"), shoots_and_leaves)
    }

    #[test]
    fn terminals_missing_key() {
        let g = verbs();
        let tree = eats_shoots_and_leaves(&g);
        assert!(tree.production_terminals("NP").is_empty());
        assert!(tree.nodes_with_key("NP").is_empty());
    }

    #[test]
    fn terminals_by_key() {
        let g = verbs();
        let tree = eats_shoots_and_leaves(&g);
        assert_eq!(tree.production_terminals("V"), vec![vec!["eats"], vec!["shoots"], vec!["leaves"]]);
        assert_eq!(tree.production_terminals("CC"), vec![vec!["and"]]);
        assert_eq!(tree.production_terminals("CCV"), vec![vec!["and", "leaves"]]);
        assert_eq!(tree.production_terminals("VP0"), vec![vec!["shoots", "and", "leaves"]]);
        assert_eq!(tree.production_terminals("VP1"), vec![vec!["eats", "shoots", "and", "leaves"]]);
    }

    #[test]
    fn keys_pre_order() {
        let g = verbs();
        let tree = eats_shoots_and_leaves(&g);
        assert_eq!(tree.production_keys(), vec!["VP1", "V", "VP0", "V", "CCV", "CC", "V"]);
    }

    #[test]
    fn nested_matches_innermost_first() {
        // (N (J big) (N (J gray) (N dog)))
        let noun = Production::terminal("N", &["dog"]);
        let adj = Production::terminal("J", &["big", "gray"]);
        let jn = Production::nonterminal("N", "J", "N");
        let gray_dog = ParseRef::new(Parse::branch(
            &jn,
            ParseRef::new(Parse::leaf(&adj, "gray")),
            ParseRef::new(Parse::leaf(&noun, "dog"))));
        let tree = Parse::branch(&jn, ParseRef::new(Parse::leaf(&adj, "big")), gray_dog);
        assert_eq!(tree.production_terminals("N"),
                   vec![vec!["dog"], vec!["gray", "dog"], vec!["big", "gray", "dog"]]);
        let nodes = tree.nodes_with_key("N");
        assert_eq!(nodes.len(), 3);
        assert!(std::ptr::eq(*nodes.last().unwrap(), &tree));
    }

    #[test]
    fn leaf_accessors() {
        let verb = Production::terminal("V", &["eats"]);
        let leaf = Parse::leaf(&verb, "eats");
        assert!(leaf.is_leaf());
        assert_eq!(leaf.token(), Some("eats"));
        assert!(leaf.children().is_none());
        assert_eq!(leaf.production_keys(), vec!["V"]);
        assert_eq!(leaf.terminal_spans(), vec![vec!["eats"]]);
    }

    #[test]
    fn tokens_and_display() {
        let g = verbs();
        let tree = eats_shoots_and_leaves(&g);
        assert_eq!(tree.tokens(), vec!["eats", "shoots", "and", "leaves"]);
        assert_eq!(tree.to_string(), "(VP1 (V eats) (VP0 (V shoots) (CCV (CC and) (V leaves))))");
        assert!(tree.token().is_none());
        assert_eq!(tree.children().map(|(l, r)| (l.key(), r.key())), Some(("V", "VP0")));
    }

    #[test]
    fn pretty_drawing() {
        let g = verbs();
        let tree = eats_shoots_and_leaves(&g);
        let drawing = tree.pretty();
        assert_eq!(drawing.lines().count(), 7);
        assert!(drawing.starts_with("`-- VP1 -> V VP1b\n"));
        assert!(drawing.contains(r#"`-- V ==> "eats""#));
    }
}
