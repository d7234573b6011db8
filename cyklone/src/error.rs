use thiserror::Error;

/// Problems found while building a `Grammar`, either through the
/// `GrammarBuilder` or while reading the grammar text format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("production key is empty")]
    EmptyKey,
    #[error("'{0}' has an empty component symbol")]
    EmptySymbol(String),
    #[error("duplicate production: {0}")]
    DuplicateProduction(String),
    #[error("line {line}: unexpected character {found:?}")]
    UnexpectedChar { line: usize, found: char },
    #[error("line {line}: unfinished literal, missing close quote")]
    UnterminatedString { line: usize },
    #[error("line {line}: unexpected {found}, expected {expected}")]
    UnexpectedToken {
        line: usize,
        found: String,
        expected: &'static str,
    },
    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEnd { line: usize, expected: &'static str },
    #[error("line {line}: alternative '{alternative}' of '{key}' is not in Chomsky Normal Form")]
    NotChomskyNormal {
        line: usize,
        key: String,
        alternative: String,
    },
    #[error("line {line}: {source}")]
    Invalid {
        line: usize,
        source: Box<GrammarError>,
    },
}
