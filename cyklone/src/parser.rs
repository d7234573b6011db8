use crate::grammar::Grammar;
use crate::parse::{Parse, ParseRef};
use tracing::{debug, trace};

type Cell<'g> = Vec<ParseRef<'g>>;

/// Triangular CYK table over a token sequence.
///
/// `cell(start, end)` holds every derivation of exactly `tokens[start..end]`.
pub struct Chart<'g> {
    len: usize,
    // rows[width - 1][start] is the cell of span (start, start + width)
    rows: Vec<Vec<Cell<'g>>>,
}

impl<'g> Chart<'g> {
    /// Number of tokens the chart was built over.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Derivations of span `[start, end)`. Empty for empty or out of range spans.
    pub fn cell(&self, start: usize, end: usize) -> &[ParseRef<'g>] {
        if start >= end || end > self.len {
            return &[];
        }
        &self.rows[end - start - 1][start]
    }

    /// Derivations of the whole token sequence.
    pub fn parses(&self) -> &[ParseRef<'g>] {
        self.cell(0, self.len)
    }

    pub fn into_parses(mut self) -> Vec<ParseRef<'g>> {
        // the widest row has a single cell spanning everything
        self.rows.pop()
            .and_then(|row| row.into_iter().next())
            .unwrap_or_default()
    }

    /// Non-empty cells as `(start, end, derivations)`, narrowest spans first.
    pub fn spans(&self) -> impl Iterator<Item = (usize, usize, &[ParseRef<'g>])> {
        self.rows.iter().enumerate().flat_map(|(width, row)| {
            row.iter().enumerate()
                .filter(|(_, cell)| !cell.is_empty())
                .map(move |(start, cell)| (start, start + width + 1, cell.as_slice()))
        })
    }

    fn log_cells(&self) {
        for (start, end, cell) in self.spans() {
            let trees = cell.iter().map(|p| p.to_string()).collect::<Vec<_>>();
            debug!(start, end, "cell: {}", trees.join(" "));
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

/// CYK parser over a borrowed `Grammar`.
///
/// Finds every derivation of a token sequence in O(n^3 * g). Nothing is
/// cached between calls, so one parser may be reused for any number of inputs.
pub struct CykParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> CykParser<'g> {
    pub fn new(grammar: &'g Grammar) -> CykParser<'g> {
        CykParser { grammar }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// One leaf per terminal production that lists `token`.
    pub fn seed(&self, token: &str) -> Vec<ParseRef<'g>> {
        self.grammar.matches_literal(token)
            .map(|production| ParseRef::new(Parse::leaf(production, token)))
            .collect()
    }

    /// One branch per (left, right, production) where the production rewrites
    /// into the keys of left and right. Derivations of the same symbol over
    /// the same span are all kept, they are distinct parses.
    pub fn combine(&self, lefts: &[ParseRef<'g>], rights: &[ParseRef<'g>]) -> Vec<ParseRef<'g>> {
        let mut combined = Vec::new();
        for left in lefts {
            for right in rights {
                for production in self.grammar.matches_pair(left.key(), right.key()) {
                    combined.push(ParseRef::new(
                        Parse::branch(production, left.clone(), right.clone())));
                }
            }
        }
        combined
    }

    // Union over every split point of start < split < end
    fn fill(&self, rows: &[Vec<Cell<'g>>], start: usize, end: usize) -> Cell<'g> {
        let mut cell = Vec::new();
        for split in start + 1..end {
            let lefts = &rows[split - start - 1][start];
            let rights = &rows[end - split - 1][split];
            cell.extend(self.combine(lefts, rights));
        }
        trace!(start, end, derivations = cell.len(), "filled cell");
        cell
    }

    #[cfg(not(feature = "parallel"))]
    fn fill_row(&self, rows: &[Vec<Cell<'g>>], width: usize, len: usize) -> Vec<Cell<'g>> {
        (0..=len - width)
            .map(|start| self.fill(rows, start, start + width))
            .collect()
    }

    // Cells of one width only read narrower rows, so they fill independently
    #[cfg(feature = "parallel")]
    fn fill_row(&self, rows: &[Vec<Cell<'g>>], width: usize, len: usize) -> Vec<Cell<'g>> {
        use rayon::prelude::*;
        (0..=len - width)
            .into_par_iter()
            .map(|start| self.fill(rows, start, start + width))
            .collect()
    }

    /// Build the full table for `tokens`.
    pub fn chart<S: AsRef<str>>(&self, tokens: &[S]) -> Chart<'g> {
        let len = tokens.len();
        let mut rows = Vec::with_capacity(len);
        if len > 0 {
            rows.push(tokens.iter().map(|t| self.seed(t.as_ref())).collect());
            for width in 2..=len {
                let row = self.fill_row(&rows, width, len);
                rows.push(row);
            }
        }
        let chart = Chart { len, rows };
        debug!(tokens = len, parses = chart.parses().len(), "chart complete");
        if cfg!(feature = "debug") {
            chart.log_cells();
        }
        chart
    }

    /// Every derivation of the whole sequence. Empty when the grammar cannot
    /// derive it, and always empty for no tokens.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<ParseRef<'g>> {
        self.chart(tokens).into_parses()
    }

    /// Derivations of the whole sequence whose root key is one of `targets`.
    pub fn parse_matching<S, K>(&self, tokens: &[S], targets: &[K]) -> Vec<ParseRef<'g>>
        where S: AsRef<str>, K: AsRef<str>
    {
        self.parse(tokens)
            .into_iter()
            .filter(|p| targets.iter().any(|t| t.as_ref() == p.key()))
            .collect()
    }
}

/// Every derivation of `tokens` under `grammar`.
pub fn parses<'g, S: AsRef<str>>(tokens: &[S], grammar: &'g Grammar) -> Vec<ParseRef<'g>> {
    CykParser::new(grammar).parse(tokens)
}

/// Derivations of `tokens` rooted at one of `targets`.
pub fn matching_parses<'g, S, K>(tokens: &[S], grammar: &'g Grammar, targets: &[K]) -> Vec<ParseRef<'g>>
    where S: AsRef<str>, K: AsRef<str>
{
    CykParser::new(grammar).parse_matching(tokens, targets)
}

///////////////////////////////////////////////////////////////////////////////
