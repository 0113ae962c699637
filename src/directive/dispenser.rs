//! Cursor over a token stream with block nesting awareness.
//!
//! # Responsibilities
//! - Step through tokens by directive, by argument (same line) and by block
//! - Track the current block nesting depth
//! - Carve out sub-streams ("segments") for delegation to modules
//! - Build located syntax errors for the current token
//!
//! # Design Decisions
//! - The cursor starts before the first token; `next()` must be called first
//! - Arguments end at a line break; a newline inside a quoted token does not
//!   count as one
//! - A `{` may only open a block on the line of its directive, a `}` only
//!   closes a block when it ends its line

use std::fmt;

use super::error::{Location, ParseError};
use super::lexer::{tokenize, Token};

/// A token cursor used by every directive parser.
#[derive(Debug, Clone)]
pub struct Dispenser {
    tokens: Vec<Token>,
    cursor: isize,
    nesting: usize,
}

impl Dispenser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: -1,
            nesting: 0,
        }
    }

    /// Tokenize `input` and wrap the tokens in a dispenser.
    pub fn from_source(input: &str, file: &str) -> Result<Self, ParseError> {
        Ok(Self::new(tokenize(input, file)?))
    }

    fn current(&self) -> Option<&Token> {
        usize::try_from(self.cursor)
            .ok()
            .and_then(|i| self.tokens.get(i))
    }

    /// The current token, if the cursor is on one.
    pub fn token(&self) -> Option<&Token> {
        self.current()
    }

    /// Text of the current token, or `""` outside the stream.
    pub fn val(&self) -> &str {
        self.current().map_or("", |t| t.text.as_str())
    }

    /// Current block nesting depth.
    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// Advance to the next token regardless of line.
    pub fn next(&mut self) -> bool {
        if self.cursor < self.tokens.len() as isize - 1 {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Step back one token.
    pub fn prev(&mut self) -> bool {
        if self.cursor > -1 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    fn next_is_on_same_line(&self) -> bool {
        let Ok(i) = usize::try_from(self.cursor) else {
            return !self.tokens.is_empty();
        };
        match (self.tokens.get(i), self.tokens.get(i + 1)) {
            (Some(cur), Some(next)) => {
                cur.file == next.file && cur.line + cur.line_breaks() == next.line
            }
            _ => false,
        }
    }

    fn next_on_same_line(&mut self) -> bool {
        if self.next_is_on_same_line() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Advance to the next argument on the current line.
    ///
    /// Refuses to step onto a block-opening `{`.
    pub fn next_arg(&mut self) -> bool {
        if !self.next_on_same_line() {
            return false;
        }
        if self.current().is_some_and(Token::is_open_brace) {
            self.cursor -= 1;
            return false;
        }
        true
    }

    /// Advance to the first token of the next line.
    pub fn next_line(&mut self) -> bool {
        if self.cursor < 0 {
            return self.next();
        }
        while self.next_is_on_same_line() {
            self.cursor += 1;
        }
        self.next()
    }

    /// Step into or through a block opened at `initial_nesting`.
    ///
    /// Typical use:
    ///
    /// ```ignore
    /// let nesting = d.nesting();
    /// while d.next_block(nesting) {
    ///     match d.val() { ... }
    /// }
    /// ```
    ///
    /// Returns false when the block ends, when the directive has no block,
    /// or when the block is empty.
    pub fn next_block(&mut self, initial_nesting: usize) -> bool {
        if self.nesting > initial_nesting {
            if !self.next() {
                return false;
            }
            let ends_line = !self.next_is_on_same_line();
            if let Some(token) = self.current() {
                if token.is_close_brace() && ends_line {
                    self.nesting -= 1;
                } else if token.is_open_brace() && ends_line {
                    self.nesting += 1;
                }
            }
            return self.nesting > initial_nesting;
        }

        if !self.next_on_same_line() {
            return false;
        }
        if !self.current().is_some_and(Token::is_open_brace) {
            self.cursor -= 1;
            return false;
        }
        self.next();
        if self.current().is_some_and(Token::is_close_brace) {
            return false;
        }
        self.nesting += 1;
        true
    }

    /// Collect all remaining arguments on the current line.
    pub fn remaining_args(&mut self) -> Vec<String> {
        let mut args = Vec::new();
        while self.next_arg() {
            args.push(self.val().to_string());
        }
        args
    }

    /// Read exactly `count` arguments; any more or fewer yields `None`.
    pub fn all_args(&mut self, count: usize) -> Option<Vec<String>> {
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            if !self.next_arg() {
                return None;
            }
            args.push(self.val().to_string());
        }
        if self.next_arg() {
            self.prev();
            return None;
        }
        Some(args)
    }

    /// Collect the current token, its arguments and its whole block.
    ///
    /// The cursor is left on the closing brace of the block (or on the last
    /// argument when there is no block).
    pub fn next_segment(&mut self) -> Vec<Token> {
        let mut segment: Vec<Token> = self.current().cloned().into_iter().collect();
        while self.next_arg() {
            segment.extend(self.current().cloned());
        }

        let mut opened_block = false;
        let nesting = self.nesting;
        while self.next_block(nesting) {
            if !opened_block {
                // next_block consumed the opening brace; include it
                self.cursor -= 1;
                segment.extend(self.current().cloned());
                self.cursor += 1;
                opened_block = true;
            }
            segment.extend(self.current().cloned());
        }
        if opened_block {
            segment.extend(self.current().cloned());
        }
        segment
    }

    /// A fresh dispenser over the segment starting at the current token.
    pub fn new_from_next_segment(&mut self) -> Dispenser {
        Dispenser::new(self.next_segment())
    }

    /// Location of the current token, falling back to the nearest one.
    pub fn location(&self) -> Location {
        self.current()
            .or_else(|| {
                if self.cursor < 0 {
                    self.tokens.first()
                } else {
                    self.tokens.last()
                }
            })
            .map(Token::location)
            .unwrap_or_default()
    }

    /// A syntax error located at the current token.
    pub fn err(&self, message: impl fmt::Display) -> ParseError {
        ParseError::Syntax {
            at: self.location(),
            message: message.to_string(),
        }
    }

    /// A syntax error for a missing or superfluous argument.
    pub fn arg_err(&self) -> ParseError {
        if self.current().is_some_and(Token::is_open_brace) {
            return self.err("unexpected token '{', expecting argument");
        }
        self.err(format!(
            "wrong argument count or unexpected line ending after '{}'",
            self.val()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispenser(input: &str) -> Dispenser {
        Dispenser::from_source(input, "test").unwrap()
    }

    #[test]
    fn test_next_arg_stops_at_line_end() {
        let mut d = dispenser("dir a b\nother c");
        assert!(d.next());
        assert_eq!(d.val(), "dir");
        assert_eq!(d.remaining_args(), ["a", "b"]);
        assert!(!d.next_arg());
        assert!(d.next());
        assert_eq!(d.val(), "other");
    }

    #[test]
    fn test_next_arg_does_not_enter_block() {
        let mut d = dispenser("dir arg {\n  sub\n}");
        d.next();
        assert!(d.next_arg());
        assert!(!d.next_arg());
        assert_eq!(d.val(), "arg");
    }

    #[test]
    fn test_quoted_newline_does_not_end_line() {
        let mut d = dispenser("dir \"multi\nline\" after");
        d.next();
        assert_eq!(d.remaining_args(), ["multi\nline", "after"]);
    }

    #[test]
    fn test_next_block_walks_nested_entries() {
        let mut d = dispenser("outer {\n  a 1\n  inner {\n    b\n  }\n  c\n}\nnext");
        d.next();
        let nesting = d.nesting();
        let mut seen = Vec::new();
        while d.next_block(nesting) {
            seen.push(d.val().to_string());
            if d.val() == "inner" {
                let inner = d.nesting();
                while d.next_block(inner) {
                    seen.push(format!("inner:{}", d.val()));
                }
            } else {
                d.remaining_args();
            }
        }
        assert_eq!(seen, ["a", "inner", "inner:b", "c"]);
        assert_eq!(d.nesting(), 0);
        assert!(d.next());
        assert_eq!(d.val(), "next");
    }

    #[test]
    fn test_empty_block() {
        let mut d = dispenser("dir {\n}\nnext");
        d.next();
        assert!(!d.next_block(0));
        assert_eq!(d.nesting(), 0);
        assert!(d.next());
        assert_eq!(d.val(), "next");
    }

    #[test]
    fn test_no_block() {
        let mut d = dispenser("dir a\nnext");
        d.next();
        d.next_arg();
        assert!(!d.next_block(0));
        assert_eq!(d.val(), "a");
    }

    #[test]
    fn test_all_args() {
        let mut d = dispenser("size 1MB");
        d.next();
        assert_eq!(d.all_args(1), Some(vec!["1MB".to_string()]));

        let mut d = dispenser("size 1MB 2MB");
        d.next();
        assert_eq!(d.all_args(1), None);

        let mut d = dispenser("size");
        d.next();
        assert_eq!(d.all_args(1), None);
    }

    #[test]
    fn test_next_segment_includes_block() {
        let mut d = dispenser("wrappers {\n  mod x {\n    k v\n  }\n  other\n}");
        d.next();
        assert!(d.next_block(0));
        assert_eq!(d.val(), "mod");
        let segment: Vec<String> = d.next_segment().into_iter().map(|t| t.text).collect();
        assert_eq!(segment, ["mod", "x", "{", "k", "v", "}"]);
        assert!(d.next_block(0));
        assert_eq!(d.val(), "other");
        assert!(!d.next_block(0));
    }

    #[test]
    fn test_segment_without_block() {
        let mut d = dispenser("wrappers {\n  plain\n  second\n}");
        d.next();
        d.next_block(0);
        let mut sub = d.new_from_next_segment();
        assert!(sub.next());
        assert_eq!(sub.val(), "plain");
        assert!(!sub.next());
        assert!(d.next_block(0));
        assert_eq!(d.val(), "second");
    }

    #[test]
    fn test_errors_are_located() {
        let mut d = dispenser("first\n  second arg");
        d.next();
        d.next();
        let err = d.err("bad thing");
        assert_eq!(err.to_string(), "test:2:3 - Error during parsing: bad thing");

        d.next_arg();
        let err = d.arg_err();
        assert!(err.to_string().contains("unexpected line ending after 'arg'"));
    }

    #[test]
    fn test_arg_err_on_open_brace() {
        let mut d = dispenser("dir {\n}");
        d.next();
        d.next();
        assert!(d.arg_err().to_string().contains("expecting argument"));
    }
}
