// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL lexer
//!
//! Splits statement text into [`Token`]s. Whitespace and comments are
//! skipped. The lexer never fails: anything it cannot classify becomes a
//! [`TokenKind::Unexpected`] token, and unterminated quoted literals run to
//! the end of the input as a single unexpected token.

use crate::token::{Token, TokenKind};

/// Iterator over the significant tokens of a text
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.text[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace and comments
    fn skip_hidden(&mut self) {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => self.eat_while(char::is_whitespace),
                (Some('-'), Some('-')) => self.eat_while(|c| c != '\n'),
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    match self.text[self.pos..].find("*/") {
                        Some(offset) => self.pos += offset + 2,
                        None => self.pos = self.text.len(),
                    }
                }
                _ => return,
            }
        }
    }

    /// Scan a literal closed by `quote`, where a doubled quote is an escape
    fn quoted(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        loop {
            match self.bump() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.bump();
                    } else {
                        return kind;
                    }
                }
                Some(_) => {}
                None => return TokenKind::Unexpected,
            }
        }
    }

    fn number(&mut self) -> TokenKind {
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let save = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.eat_while(|c| c.is_ascii_digit());
            } else {
                self.pos = save;
            }
        }
        TokenKind::NumericLiteral
    }

    fn word(&mut self, start: usize) -> TokenKind {
        self.eat_while(is_identifier_part);
        TokenKind::keyword(&self.text[start..self.pos]).unwrap_or(TokenKind::Identifier)
    }

    fn next_kind(&mut self, start: usize, first: char) -> TokenKind {
        match first {
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '*' => TokenKind::Asterisk,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '/' => TokenKind::Solidus,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Equals,
            '?' => TokenKind::QuestionMark,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.number(),
            '.' => TokenKind::Period,
            '|' if self.peek() == Some('|') => {
                self.bump();
                TokenKind::Concat
            }
            '<' => match self.peek() {
                Some('>') => {
                    self.bump();
                    TokenKind::NotEquals
                }
                Some('=') => {
                    self.bump();
                    TokenKind::LessEquals
                }
                _ => TokenKind::Less,
            },
            '>' if self.peek() == Some('=') => {
                self.bump();
                TokenKind::GreaterEquals
            }
            '>' => TokenKind::Greater,
            '!' if self.peek() == Some('=') => {
                self.bump();
                TokenKind::NotEquals
            }
            ':' if self.peek() == Some(':') => {
                self.bump();
                TokenKind::DoubleColon
            }
            ':' => TokenKind::Colon,
            '\'' => self.quoted('\'', TokenKind::StringLiteral),
            '"' => self.quoted('"', TokenKind::Quoted),
            '`' => self.quoted('`', TokenKind::Quoted),
            '@' if self.peek().is_some_and(|c| c == '@' || is_identifier_part(c)) => {
                self.eat_while(|c| c == '@' || is_identifier_part(c));
                TokenKind::BatchVariable
            }
            '$' if self.peek() == Some('{') => match self.text[self.pos..].find('}') {
                Some(offset) => {
                    self.pos += offset + 1;
                    TokenKind::ClientVariable
                }
                None => {
                    self.pos = self.text.len();
                    TokenKind::Unexpected
                }
            },
            c if c.is_ascii_digit() => self.number(),
            c if is_identifier_start(c) => self.word(start),
            _ => TokenKind::Unexpected,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_hidden();
        let start = self.pos;
        let first = self.bump()?;
        let kind = self.next_kind(start, first);
        Some(Token::new(kind, start, self.pos))
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Tokenize a whole text
pub fn tokenize(text: &str) -> Vec<Token> {
    Lexer::new(text).collect()
}
