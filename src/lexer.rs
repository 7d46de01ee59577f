//! Character-level scanner for the database format.
//!
//! The lexer keeps exactly one character of lookahead (`current`) and the
//! column it was read from. A boundary marker (`@`) only starts a record when
//! it sits in column 1; anywhere else it is ordinary text.
//!
//! ## Tokens
//!
//! [`Lexer::read_token`] dispatches on the first significant character:
//!
//! ```text
//! "..."      quoted value, backslash pairs kept verbatim, quotes included
//! {...}      braced value, nesting honoured, outer braces included
//! @type key  bare identifier, ends at , { } = or whitespace
//! #          concatenation, returned as " # " (no concatenation is done)
//! ```
//!
//! Quoted and braced values are unterminated when they run into end of input
//! or a boundary marker in column 1. Stopping at the boundary keeps one broken
//! value from swallowing every record after it. For the same reason no token
//! ever starts on a boundary marker; record types are read with
//! [`Lexer::read_entry_type`] instead.

use thiserror::Error;

/// Character that starts a record when found in column 1.
pub const BOUNDARY: char = '@';

const EXCERPT_LEN: usize = 40;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected start of the next record")]
    UnexpectedBoundary,
    #[error("unterminated quoted value starting {0:?}")]
    UnterminatedQuote(String),
    #[error("unterminated braced value starting {0:?}")]
    UnterminatedBrace(String),
    #[error("unexpected character {ch:?} after {text:?}")]
    UnexpectedChar { ch: char, text: String },
}

pub struct Lexer<'a> {
    chars: std::str::Chars<'a>,
    current: Option<char>,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned on the first character of `input`.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Self {
            chars: input.chars(),
            current: None,
            column: 0,
        };
        lexer.advance();
        lexer
    }

    pub fn current(&self) -> Option<char> {
        self.current
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn at_eof(&self) -> bool {
        self.current.is_none()
    }

    /// True when the current character is a boundary marker in column 1.
    pub fn at_boundary(&self) -> bool {
        self.current == Some(BOUNDARY) && self.column == 1
    }

    /// Move to the next character. Line breaks reset the column to 0, so the
    /// first character of every line is read in column 1.
    pub fn advance(&mut self) {
        self.current = self.chars.next();
        match self.current {
            Some('\r' | '\n') => self.column = 0,
            Some(_) => self.column += 1,
            None => {}
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.current.is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Skip whitespace, then `expected` if it is the next character.
    pub fn skip_char(&mut self, expected: char) {
        self.skip_whitespace();
        if self.current == Some(expected) {
            self.advance();
        }
    }

    /// Collect everything up to the next boundary marker or end of input.
    pub fn read_until_boundary(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.current {
            if self.at_boundary() {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    /// Read a record type, boundary marker included (`@article`).
    pub fn read_entry_type(&mut self) -> String {
        let mut entry_type = String::new();
        if self.at_boundary() {
            entry_type.push(BOUNDARY);
            self.advance();
        }
        self.read_bare(&mut entry_type);
        entry_type
    }

    /// Read one token.
    ///
    /// With a `terminator`, whitespace after the token is skipped and the
    /// terminator consumed. If something other than the terminator or a
    /// closing brace follows, another token is read and appended to the same
    /// text: a missing comma before the closing brace of an entry is
    /// tolerated this way. A boundary marker or end of input also ends the
    /// token, leaving the caller to decide what an entry cut short means.
    /// Hitting either before anything was read is an error.
    pub fn read_token(&mut self, terminator: Option<char>) -> Result<String, LexError> {
        let mut token = String::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.current else {
                return non_empty(token, LexError::UnexpectedEof);
            };
            if self.at_boundary() {
                return non_empty(token, LexError::UnexpectedBoundary);
            }
            match c {
                '"' => self.read_quoted(&mut token)?,
                '{' => self.read_braced(&mut token)?,
                '#' => {
                    token.push_str(" # ");
                    self.advance();
                }
                c if c == BOUNDARY || c.is_alphanumeric() => self.read_bare(&mut token),
                ch => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        text: excerpt(&token),
                    });
                }
            }

            let Some(terminator) = terminator else {
                return Ok(token);
            };
            self.skip_whitespace();
            match self.current {
                Some(c) if c == terminator => {
                    self.advance();
                    return Ok(token);
                }
                None | Some('}') => return Ok(token),
                Some(_) if self.at_boundary() => return Ok(token),
                _ => {}
            }
        }
    }

    fn read_quoted(&mut self, token: &mut String) -> Result<(), LexError> {
        let start = token.len();
        token.push('"');
        self.advance();
        loop {
            match self.current {
                Some('"') => {
                    token.push('"');
                    self.advance();
                    return Ok(());
                }
                Some(_) if self.at_boundary() => {
                    return Err(LexError::UnterminatedQuote(excerpt(&token[start..])));
                }
                Some('\\') => {
                    token.push('\\');
                    self.advance();
                    if let Some(escaped) = self.current {
                        token.push(escaped);
                        self.advance();
                    }
                }
                Some(c) => {
                    token.push(c);
                    self.advance();
                }
                None => return Err(LexError::UnterminatedQuote(excerpt(&token[start..]))),
            }
        }
    }

    fn read_braced(&mut self, token: &mut String) -> Result<(), LexError> {
        let start = token.len();
        let mut depth = 1usize;
        token.push('{');
        self.advance();
        loop {
            match self.current {
                Some(_) if self.at_boundary() => {
                    return Err(LexError::UnterminatedBrace(excerpt(&token[start..])));
                }
                Some(c) => {
                    token.push(c);
                    self.advance();
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return Ok(());
                            }
                        }
                        _ => {}
                    }
                }
                None => return Err(LexError::UnterminatedBrace(excerpt(&token[start..]))),
            }
        }
    }

    fn read_bare(&mut self, token: &mut String) {
        while let Some(c) = self.current {
            if matches!(c, ',' | '}' | '{' | '=') || c.is_whitespace() {
                break;
            }
            token.push(c);
            self.advance();
        }
    }
}

fn non_empty(token: String, otherwise: LexError) -> Result<String, LexError> {
    if token.is_empty() {
        Err(otherwise)
    } else {
        Ok(token)
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_LEN).collect()
}
