use crate::error::GrammarError;
use crate::grammar::{Grammar, GrammarBuilder, Production};
use std::iter::Peekable;
use std::{fmt, str};

// Grammar text format:
//
//   # comments run to end of line
//   DT := "the" | "a" ;
//   JJ := ;
//   NP := DT N | NP PP ;
//
// Quoted alternatives of a rule are collected into one terminal production,
// each identifier pair becomes its own nonterminal production.

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Literal(String),
    Assign,
    Alt,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Ident(id) => write!(f, "'{}'", id),
            Token::Literal(lit) => write!(f, "{:?}", lit),
            Token::Assign => write!(f, "':='"),
            Token::Alt => write!(f, "'|'"),
            Token::End => write!(f, "';'"),
        }
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || "_-<>.$@".contains(c)
}

struct GrammarTokenizer<I: Iterator<Item = char>> {
    input: Peekable<I>,
    line: usize,
}

impl<I: Iterator<Item = char>> GrammarTokenizer<I> {
    fn new(input: I) -> Self {
        GrammarTokenizer { input: input.peekable(), line: 1 }
    }

    fn quoted(&mut self, open: char) -> Result<Token, GrammarError> {
        let line = self.line;
        let mut literal = String::new();
        while let Some(ch) = self.input.next() {
            match ch {
                // backslash only escapes the quote and itself
                '\\' => match self.input.next() {
                    Some(escaped) if escaped == open || escaped == '\\' => literal.push(escaped),
                    Some(other) => {
                        literal.push('\\');
                        if other == '\n' {
                            self.line += 1;
                        }
                        literal.push(other);
                    }
                    None => break,
                },
                _ if ch == open => return Ok(Token::Literal(literal)),
                '\n' => {
                    self.line += 1;
                    literal.push(ch);
                }
                _ => literal.push(ch),
            }
        }
        Err(GrammarError::UnterminatedString { line })
    }

    fn next_token(&mut self) -> Result<Option<(usize, Token)>, GrammarError> {
        loop {
            let line = self.line;
            let token = match self.input.next() {
                None => return Ok(None),
                Some('\n') => {
                    self.line += 1;
                    continue;
                }
                Some(ws) if ws.is_whitespace() => continue,
                // Swallow comments until EOL
                Some('#') => {
                    while self.input.next_if(|&c| c != '\n').is_some() {}
                    continue;
                }
                Some('|') => Token::Alt,
                Some(';') => Token::End,
                Some(':') => match self.input.next_if_eq(&'=') {
                    Some(_) => Token::Assign,
                    None => return Err(GrammarError::UnexpectedChar { line, found: ':' }),
                },
                Some(open @ ('"' | '\'')) => self.quoted(open)?,
                Some(c) if is_symbol_char(c) => {
                    let mut id = c.to_string();
                    while let Some(c) = self.input.next_if(|&c| is_symbol_char(c)) {
                        id.push(c);
                    }
                    Token::Ident(id)
                }
                Some(found) => return Err(GrammarError::UnexpectedChar { line, found }),
            };
            return Ok(Some((line, token)));
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for GrammarTokenizer<I> {
    type Item = Result<(usize, Token), GrammarError>;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

///////////////////////////////////////////////////////////////////////////////

struct RuleReader<I: Iterator<Item = char>> {
    tokens: GrammarTokenizer<I>,
    builder: GrammarBuilder,
}

impl<I: Iterator<Item = char>> RuleReader<I> {
    fn expect_next(&mut self, expected: &'static str) -> Result<(usize, Token), GrammarError> {
        let line = self.tokens.line;
        self.tokens.next()
            .unwrap_or(Err(GrammarError::UnexpectedEnd { line, expected }))
    }

    // One alternative: a single literal or two component symbols
    fn classify(
        key: &str,
        line: usize,
        alternative: Vec<Token>,
        literals: &mut Vec<String>,
        pairs: &mut Vec<(String, String)>,
    ) -> Result<(), GrammarError> {
        let mut symbols = alternative.into_iter();
        match (symbols.next(), symbols.next(), symbols.next()) {
            (Some(Token::Literal(lit)), None, _) => literals.push(lit),
            (Some(Token::Ident(left)), Some(Token::Ident(right)), None) => pairs.push((left, right)),
            (first, second, third) => {
                let alternative = [first, second, third].into_iter()
                    .flatten()
                    .chain(symbols)
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                return Err(GrammarError::NotChomskyNormal {
                    line,
                    key: key.to_string(),
                    alternative,
                });
            }
        }
        Ok(())
    }

    // Ident := alternatives ;
    fn read_rule(&mut self, line: usize, key: String) -> Result<(), GrammarError> {
        match self.expect_next("':='")? {
            (_, Token::Assign) => (),
            (line, found) => return Err(GrammarError::UnexpectedToken {
                line, found: found.to_string(), expected: "':='" }),
        }
        let mut literals = Vec::new();
        let mut pairs = Vec::new();
        let mut alternative = Vec::new();
        let mut empty_body = true;
        loop {
            let (at, token) = self.expect_next("';'")?;
            match token {
                Token::Ident(_) | Token::Literal(_) => {
                    empty_body = false;
                    alternative.push(token);
                }
                // `JJ := ;` is a terminal that matches nothing
                Token::End if empty_body => break,
                Token::Alt | Token::End => {
                    empty_body = false;
                    let done = token == Token::End;
                    let alt = std::mem::take(&mut alternative);
                    Self::classify(&key, at, alt, &mut literals, &mut pairs)?;
                    if done {
                        break;
                    }
                }
                Token::Assign => return Err(GrammarError::UnexpectedToken {
                    line: at, found: token.to_string(), expected: "symbol, literal or ';'" }),
            }
        }

        let mut productions = Vec::new();
        if !literals.is_empty() || pairs.is_empty() {
            productions.push(Production::terminal(key.as_str(), &literals));
        }
        for (left, right) in pairs {
            productions.push(Production::nonterminal(key.as_str(), left, right));
        }
        for production in productions {
            self.builder.try_push(production)
                .map_err(|e| GrammarError::Invalid { line, source: Box::new(e) })?;
        }
        Ok(())
    }

    fn read(mut self) -> Result<Grammar, GrammarError> {
        while let Some(next) = self.tokens.next() {
            match next? {
                (line, Token::Ident(key)) => self.read_rule(line, key)?,
                (line, found) => return Err(GrammarError::UnexpectedToken {
                    line, found: found.to_string(), expected: "rule name" }),
            }
        }
        self.builder.into_grammar()
    }
}

/// Reads a grammar written as `Key := "literal" | Left Right ;` rules.
impl str::FromStr for Grammar {
    type Err = GrammarError;
    fn from_str(src: &str) -> Result<Grammar, GrammarError> {
        RuleReader {
            tokens: GrammarTokenizer::new(src.chars()),
            builder: GrammarBuilder::default(),
        }.read()
    }
}

///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{GrammarTokenizer, Token};
    use crate::error::GrammarError;
    use crate::grammar::{Body, Grammar, Production};

    fn tokenize(src: &str) -> Result<Vec<Token>, GrammarError> {
        GrammarTokenizer::new(src.chars()).map(|t| t.map(|(_, tok)| tok)).collect()
    }

    #[test]
    fn tokenizer_basics() {
        let tokens = tokenize("NP := DT N | \"the\" ; # trailing comment").unwrap();
        assert_eq!(tokens, vec![
            Token::Ident("NP".to_string()),
            Token::Assign,
            Token::Ident("DT".to_string()),
            Token::Ident("N".to_string()),
            Token::Alt,
            Token::Literal("the".to_string()),
            Token::End,
        ]);
    }

    #[test]
    fn tokenizer_quotes() {
        let tokens = tokenize(r#"'don\'t' "say \"hi\"" '' "a b""#).unwrap();
        assert_eq!(tokens, vec![
            Token::Literal("don't".to_string()),
            Token::Literal("say \"hi\"".to_string()),
            Token::Literal("".to_string()),
            Token::Literal("a b".to_string()),
        ]);
        assert_eq!(tokenize("\n\n\"open"), Err(GrammarError::UnterminatedString { line: 3 }));
    }

    #[test]
    fn tokenizer_keeps_other_backslashes() {
        let tokens = tokenize(r#""a\b" 'c:\\d' "\"" "x\'y" "end\\""#).unwrap();
        assert_eq!(tokens, vec![
            Token::Literal("a\\b".to_string()),
            Token::Literal("c:\\d".to_string()),
            Token::Literal("\"".to_string()),
            Token::Literal("x\\'y".to_string()),
            Token::Literal("end\\".to_string()),
        ]);
    }

    #[test]
    fn backslash_literal_matches_token() {
        let g: Grammar = r#"T := "a\b" ;"#.parse().unwrap();
        assert_eq!(g.productions(), &[Production::terminal("T", &["a\\b"])]);
        assert_eq!(crate::parser::parses(&["a\\b"], &g).len(), 1);
        assert!(crate::parser::parses(&["ab"], &g).is_empty());
    }

    #[test]
    fn tokenizer_bad_chars() {
        assert_eq!(tokenize("A : B"), Err(GrammarError::UnexpectedChar { line: 1, found: ':' }));
        assert_eq!(tokenize("A := (B C) ;"), Err(GrammarError::UnexpectedChar { line: 1, found: '(' }));
    }

    #[test]
    fn read_grammar() {
        let g: Grammar = r#"
            # determiners
            DT := "the" | "that" | "a" ;
            JJ := ;
            N  := "book" | "flight" | DT N ;
            VP := V NP | VP PP ;
        "#.parse().unwrap();
        assert_eq!(g.productions(), &[
            Production::terminal("DT", &["the", "that", "a"]),
            Production::terminal("JJ", &[] as &[&str]),
            Production::terminal("N", &["book", "flight"]),
            Production::nonterminal("N", "DT", "N"),
            Production::nonterminal("VP", "V", "NP"),
            Production::nonterminal("VP", "VP", "PP"),
        ]);
        assert!(matches!(&g.productions()[1].body, Body::Terminal(l) if l.is_empty()));
    }

    #[test]
    fn rules_span_lines() {
        let g: Grammar = "S :=\n  NP VP\n  | S PP\n;".parse().unwrap();
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn rejects_non_cnf() {
        let unit = "S := NP ;".parse::<Grammar>();
        assert_eq!(unit.unwrap_err(), GrammarError::NotChomskyNormal {
            line: 1, key: "S".to_string(), alternative: "'NP'".to_string() });

        let long = "\nS := NP VP PP ;".parse::<Grammar>();
        assert_eq!(long.unwrap_err(), GrammarError::NotChomskyNormal {
            line: 2, key: "S".to_string(), alternative: "'NP' 'VP' 'PP'".to_string() });

        let mixed = "S := \"go\" VP ;".parse::<Grammar>();
        assert!(matches!(mixed, Err(GrammarError::NotChomskyNormal { .. })));

        let empty_alt = "S := \"go\" | ;".parse::<Grammar>();
        assert!(matches!(empty_alt, Err(GrammarError::NotChomskyNormal { .. })));
    }

    #[test]
    fn rejects_bad_structure() {
        assert_eq!("\"the\" := DT ;".parse::<Grammar>().unwrap_err(), GrammarError::UnexpectedToken {
            line: 1, found: "\"the\"".to_string(), expected: "rule name" });
        assert_eq!("S NP VP ;".parse::<Grammar>().unwrap_err(), GrammarError::UnexpectedToken {
            line: 1, found: "'NP'".to_string(), expected: "':='" });
        assert_eq!("S := NP VP".parse::<Grammar>().unwrap_err(), GrammarError::UnexpectedEnd {
            line: 1, expected: "';'" });
        assert!(matches!("S := NP := VP ;".parse::<Grammar>(),
                         Err(GrammarError::UnexpectedToken { .. })));
    }

    #[test]
    fn rejects_duplicates_with_line() {
        let dup = "NP := DT N ;\nNP := DT N ;".parse::<Grammar>().unwrap_err();
        assert_eq!(dup, GrammarError::Invalid {
            line: 2,
            source: Box::new(GrammarError::DuplicateProduction("NP -> DT N".to_string())),
        });
        assert_eq!(dup.to_string(), "line 2: duplicate production: NP -> DT N");
    }

    #[test]
    fn empty_source() {
        let g: Grammar = "  # nothing here\n".parse().unwrap();
        assert!(g.is_empty());
    }
}
