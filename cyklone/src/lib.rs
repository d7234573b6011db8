//! CYK parsing of grammars in Chomsky Normal Form.
//!
//! Every derivation of a token sequence is returned, ambiguous grammars
//! included. Parse trees can then be queried for the spans of any symbol.
//!
//! ```
//! # fn main() -> Result<(), cyklone::GrammarError> {
//! let grammar: cyklone::Grammar = r#"
//!     DT := "the" ;
//!     N  := "dog" | DT N ;
//! "#.parse()?;
//! let found = cyklone::parses(&["the", "dog"], &grammar);
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].to_string(), "(N (DT the) (N dog))");
//! # Ok(())
//! # }
//! ```

mod error;
pub use crate::error::GrammarError;

mod grammar;
pub use crate::grammar::{Body, Grammar, GrammarBuilder, Matches, Production};

mod grammar_text;

mod parse;
pub use crate::parse::{Derivation, Parse, ParseRef};

mod parser;
pub use crate::parser::{Chart, CykParser, matching_parses, parses};
