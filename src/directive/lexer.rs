//! Tokenizer for directive files.
//!
//! # Responsibilities
//! - Split input into whitespace-separated words
//! - Track file, line and column for every token
//! - Handle `"double quoted"` and `` `backtick` `` tokens, which may span lines
//! - Drop `#` comments
//!
//! # Design Decisions
//! - Braces are ordinary words; they only delimit blocks when standing alone
//! - Inside double quotes only `\"` and an escaped newline are unescaped;
//!   any other backslash is kept verbatim

use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use super::error::{Location, ParseError};

/// A single word of a directive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub file: Arc<str>,
    pub line: usize,
    pub column: usize,
    pub text: String,
    /// True when the token came from a quoted string.
    pub quoted: bool,
}

impl Token {
    pub fn location(&self) -> Location {
        Location {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
        }
    }

    pub fn is_open_brace(&self) -> bool {
        !self.quoted && self.text == "{"
    }

    pub fn is_close_brace(&self) -> bool {
        !self.quoted && self.text == "}"
    }

    /// Newlines embedded in the token text (quoted tokens only).
    pub(crate) fn line_breaks(&self) -> usize {
        self.text.matches('\n').count()
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    file: Arc<str>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_blank(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_blank();
        let Some(&first) = self.chars.peek() else {
            return Ok(None);
        };

        let line = self.line;
        let column = self.column + 1;
        let (text, quoted) = match first {
            '"' => (self.double_quoted(line, column)?, true),
            '`' => (self.backtick_quoted(line, column)?, true),
            _ => (self.bare_word(), false),
        };

        Ok(Some(Token {
            file: self.file.clone(),
            line,
            column,
            text,
            quoted,
        }))
    }

    fn bare_word(&mut self) -> String {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                break;
            }
            text.push(c);
            self.bump();
        }
        text
    }

    fn double_quoted(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        self.bump();
        let mut text = String::new();
        let mut escaped = false;
        loop {
            let Some(c) = self.bump() else {
                return Err(self.unterminated(line, column));
            };
            if escaped {
                if c != '"' && c != '\n' {
                    text.push('\\');
                }
                text.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '"' => return Ok(text),
                _ => text.push(c),
            }
        }
    }

    fn backtick_quoted(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(text),
                Some(c) => text.push(c),
                None => return Err(self.unterminated(line, column)),
            }
        }
    }

    fn unterminated(&self, line: usize, column: usize) -> ParseError {
        ParseError::Syntax {
            at: Location {
                file: self.file.clone(),
                line,
                column,
            },
            message: "unterminated quoted string".to_string(),
        }
    }
}

/// Split `input` into tokens, attributing them to `file`.
pub fn tokenize(input: &str, file: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: input.chars().peekable(),
        file: Arc::from(file),
        line: 1,
        column: 0,
    };

    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_words_and_positions() {
        let tokens = tokenize("servers :443 {\n  protocol {\n", "Edgefile").unwrap();
        assert_eq!(texts(&tokens), ["servers", ":443", "{", "protocol", "{"]);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 9));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
        assert_eq!(&*tokens[3].file, "Edgefile");
        assert!(tokens[2].is_open_brace());
    }

    #[test]
    fn test_comments_are_dropped() {
        let tokens = tokenize("# leading\nidle 5s # trailing\nwrite#not-a-comment", "f").unwrap();
        assert_eq!(texts(&tokens), ["idle", "5s", "write#not-a-comment"]);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_quoted_tokens() {
        let tokens = tokenize(r#"say "hello \"world\"" `raw \n` "{""#, "f").unwrap();
        assert_eq!(texts(&tokens), ["say", "hello \"world\"", "raw \\n", "{"]);
        assert!(tokens[1].quoted);
        assert!(!tokens[3].is_open_brace());
    }

    #[test]
    fn test_multiline_quoted_token() {
        let tokens = tokenize("a \"one\ntwo\" b\nc", "f").unwrap();
        assert_eq!(texts(&tokens), ["a", "one\ntwo", "b", "c"]);
        assert_eq!(tokens[1].line_breaks(), 1);
        assert_eq!(tokens[2].line, 2);
        assert_eq!(tokens[3].line, 3);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = tokenize("a\n  \"open", "f").unwrap_err();
        assert_eq!(err.location().line, 2);
        assert_eq!(err.location().column, 3);
        assert!(err.to_string().contains("unterminated"));
    }
}
