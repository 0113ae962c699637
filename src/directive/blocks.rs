//! Grouping of top-level tokens into blocks and directive segments.
//!
//! A directive file is a sequence of blocks. Each block has keys (site
//! addresses) followed by a braced body; a leading block without keys
//! holds the global options. A file with a single block may omit the
//! braces around its body.

use super::dispenser::Dispenser;
use super::error::{Location, ParseError};
use super::lexer::Token;

/// One directive with its arguments and nested block.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment(Vec<Token>);

impl Segment {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }

    /// Name of the directive (first token).
    pub fn directive(&self) -> &str {
        self.0.first().map_or("", |t| t.text.as_str())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn location(&self) -> Location {
        self.0.first().map(Token::location).unwrap_or_default()
    }

    pub fn dispenser(&self) -> Dispenser {
        Dispenser::new(self.0.clone())
    }
}

/// A top-level block of a directive file.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerBlock {
    pub keys: Vec<String>,
    pub segments: Vec<Segment>,
    pub location: Location,
}

impl ServerBlock {
    pub fn is_global_options(&self) -> bool {
        self.keys.is_empty()
    }
}

fn syntax(token: &Token, message: &str) -> ParseError {
    ParseError::Syntax {
        at: token.location(),
        message: message.to_string(),
    }
}

fn on_same_line(a: &Token, b: &Token) -> bool {
    a.file == b.file && a.line + a.line_breaks() == b.line
}

/// Index of the brace closing the one at `open`.
fn matching_brace(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_open_brace() {
            depth += 1;
        } else if token.is_close_brace() {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn check_balanced(tokens: &[Token]) -> Result<(), ParseError> {
    let mut open: Vec<&Token> = Vec::new();
    for token in tokens {
        if token.is_open_brace() {
            open.push(token);
        } else if token.is_close_brace() && open.pop().is_none() {
            return Err(syntax(token, "unexpected '}'"));
        }
    }
    match open.last() {
        Some(token) => Err(syntax(token, "unexpected EOF, expecting '}'")),
        None => Ok(()),
    }
}

fn split_segments(body: Vec<Token>) -> Vec<Segment> {
    let mut d = Dispenser::new(body);
    let mut segments = Vec::new();
    while d.next() {
        segments.push(Segment(d.next_segment()));
    }
    segments
}

/// Group a token stream into blocks.
pub fn parse_server_blocks(tokens: Vec<Token>) -> Result<Vec<ServerBlock>, ParseError> {
    let mut blocks: Vec<ServerBlock> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let location = tokens[i].location();
        let mut keys = Vec::new();

        while !tokens[i].is_open_brace() {
            let token = &tokens[i];
            if token.is_close_brace() {
                return Err(syntax(token, "unexpected '}'"));
            }
            keys.extend(
                token
                    .text
                    .split(',')
                    .filter(|k| !k.is_empty())
                    .map(str::to_string),
            );
            i += 1;
            match tokens.get(i) {
                Some(next) if on_same_line(token, next) => {}
                Some(_) if token.text.ends_with(',') => {}
                _ => break,
            }
        }

        if keys.is_empty() && !blocks.is_empty() {
            return Err(syntax(
                &tokens[i],
                "a block without keys holds global options and must come first",
            ));
        }

        let body = match tokens.get(i) {
            Some(open) if open.is_open_brace() => {
                let close = matching_brace(&tokens, i)
                    .ok_or_else(|| syntax(open, "unexpected EOF, expecting '}'"))?;
                let body = tokens[i + 1..close].to_vec();
                i = close + 1;
                body
            }
            _ => {
                if !blocks.is_empty() {
                    return Err(ParseError::Syntax {
                        at: location,
                        message: "only a file with a single block may omit its braces".to_string(),
                    });
                }
                let body = tokens[i..].to_vec();
                check_balanced(&body)?;
                i = tokens.len();
                body
            }
        };

        blocks.push(ServerBlock {
            keys,
            segments: split_segments(body),
            location,
        });
    }

    Ok(blocks)
}
