//! The meta-grammar scanner (spec.md §4.1): a hand-written, context-sensitive
//! lexer driven by an explicit [`ModeStack`] rather than a single-mode
//! regex-DFA table. `logos` (which the teacher uses for Dewy source text
//! itself) assumes one mode per token definition and can't express "a `'`
//! means something different once we're inside a charset body than it does
//! in a rule body" without duplicating every token per mode; a mode stack
//! expresses that directly, the way `plotnik-compiler`'s scanner for
//! recursive string interpolation modes does.
//!
//! Scan failures are immediately fatal (`ScanError`), unlike the teacher's
//! garbage-token coalescing: a meta-grammar that can't be tokenized can't be
//! compiled, so there is nothing useful to recover and resynchronize on.

mod mode;
mod token;

pub use mode::{Mode, ModeStack};
pub use token::{SpannedToken, TokenKind, TokenTag};

use crate::diagnostics::Span;
use crate::error::ScanError;

pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    modes: ModeStack,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0, modes: ModeStack::new() }
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    pub fn push_mode(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    pub fn pop_mode(&mut self) -> Mode {
        self.modes.pop()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_char_at(&self, skip: usize) -> Option<char> {
        self.rest().chars().nth(skip)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn fail(&self, offset: usize, reason: impl Into<String>) -> ScanError {
        ScanError { offset, reason: reason.into() }
    }

    /// Non-mutating lookahead: scans up to `k` tokens ahead from a snapshot
    /// of the current position and mode stack, leaving `self` untouched.
    pub fn peek(&self, k: usize) -> Result<Vec<SpannedToken>, ScanError> {
        let mut shadow = Scanner { source: self.source, pos: self.pos, modes: self.modes.clone() };
        shadow.push_mode(Mode::Peek);
        let mut out = Vec::with_capacity(k);
        for _ in 0..k {
            match shadow.next_token()? {
                Some(tok) => out.push(tok),
                None => break,
            }
        }
        Ok(out)
    }

    pub fn next_token(&mut self) -> Result<Option<SpannedToken>, ScanError> {
        let Some(c) = self.peek_char() else {
            return Ok(None);
        };

        if c.is_whitespace() {
            return Ok(Some(self.scan_whitespace()));
        }
        if c == '/' && self.peek_char_at(1) == Some('/') {
            return Ok(Some(self.scan_line_comment()));
        }

        match self.mode() {
            Mode::SingleQuoteString => return self.scan_string_body('\'').map(Some),
            Mode::DoubleQuoteString => return self.scan_string_body('"').map(Some),
            Mode::CaselessString => return self.scan_string_body('`').map(Some),
            _ => {}
        }

        let start = self.pos;
        let kind = match c {
            '#' => {
                self.bump();
                if self.peek_char() == Some('$') {
                    self.bump();
                    TokenKind::Dollar
                } else if self.peek_char().is_some_and(|c| c.is_alphabetic() || c == '_') {
                    let mut name = String::new();
                    while let Some(c) = self.peek_char() {
                        if c.is_alphanumeric() || c == '_' {
                            name.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    TokenKind::Ident(name)
                } else {
                    TokenKind::Hashtag
                }
            }
            '\'' => {
                self.bump();
                TokenKind::SingleQuote
            }
            '"' => {
                self.bump();
                TokenKind::DoubleQuote
            }
            '\\' => {
                self.bump();
                match self.bump() {
                    Some(esc) => TokenKind::Escape(esc),
                    None => return Err(self.fail(start, "dangling escape at end of input")),
                }
            }
            '0'..='9' => self.scan_number(),
            'ϵ' => {
                self.bump();
                TokenKind::Epsilon
            }
            '\u{3be}' /* ξ */ => {
                self.bump();
                TokenKind::Anyset
            }
            '&' => {
                self.bump();
                TokenKind::Ampersand
            }
            '.' => {
                self.bump();
                TokenKind::Period
            }
            '*' => {
                self.bump();
                TokenKind::Star
            }
            '+' => {
                self.bump();
                TokenKind::Plus
            }
            '?' => {
                self.bump();
                TokenKind::Question
            }
            '~' => {
                self.bump();
                TokenKind::Tilde
            }
            ';' => {
                self.bump();
                TokenKind::Semicolon
            }
            '|' => {
                self.bump();
                TokenKind::VerticalBar
            }
            '-' => {
                self.bump();
                TokenKind::Minus
            }
            '/' => {
                self.bump();
                TokenKind::ForwardSlash
            }
            '>' => {
                self.bump();
                TokenKind::Greater
            }
            '<' => {
                self.bump();
                TokenKind::Less
            }
            '=' => {
                self.bump();
                TokenKind::Equals
            }
            '(' => {
                self.bump();
                TokenKind::LeftParen
            }
            ')' => {
                self.bump();
                TokenKind::RightParen
            }
            '[' => {
                self.bump();
                TokenKind::LeftBracket
            }
            ']' => {
                self.bump();
                TokenKind::RightBracket
            }
            '{' => {
                self.bump();
                TokenKind::LeftBrace
            }
            '}' => {
                self.bump();
                TokenKind::RightBrace
            }
            other => {
                self.bump();
                TokenKind::Char(other)
            }
        };

        Ok(Some(SpannedToken::new(kind, Span::new(start, self.pos))))
    }

    fn scan_whitespace(&mut self) -> SpannedToken {
        let start = self.pos;
        while self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
        SpannedToken::new(TokenKind::Whitespace, Span::new(start, self.pos))
    }

    fn scan_line_comment(&mut self) -> SpannedToken {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        SpannedToken::new(TokenKind::Comment, Span::new(start, self.pos))
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;
        if self.peek_char() == Some('0')
            && matches!(self.peek_char_at(1), Some('x') | Some('X'))
        {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let value = u32::from_str_radix(&self.source[digits_start..self.pos], 16).unwrap_or(0);
            return TokenKind::HexNumber(value);
        }
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let value: u64 = self.source[start..self.pos].parse().unwrap_or(0);
        TokenKind::DecNumber(value)
    }

    /// Scans the interior of a quoted string literal one character (or
    /// escape) at a time; the quote/backtick tokens that open and close the
    /// string are scanned through the ordinary `root`-mode match arms above,
    /// with mode push/pop driven by the parser that consumes them.
    fn scan_string_body(&mut self, closing: char) -> Result<SpannedToken, ScanError> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if c == closing => {
                let kind = match closing {
                    '\'' => TokenKind::SingleQuote,
                    '"' => TokenKind::DoubleQuote,
                    _ => TokenKind::Char(closing),
                };
                self.bump();
                Ok(SpannedToken::new(kind, Span::new(start, self.pos)))
            }
            Some('\\') => {
                self.bump();
                match self.bump() {
                    Some(esc) => Ok(SpannedToken::new(TokenKind::Escape(esc), Span::new(start, self.pos))),
                    None => Err(self.fail(start, "dangling escape inside string literal")),
                }
            }
            Some(c) => {
                self.bump();
                Ok(SpannedToken::new(TokenKind::Char(c), Span::new(start, self.pos)))
            }
            None => Err(self.fail(start, "unterminated string literal")),
        }
    }
}

#[cfg(test)]
mod scanner_tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut s = Scanner::new(src);
        let mut out = Vec::new();
        while let Some(tok) = s.next_token().expect("scan ok") {
            if matches!(tok.kind, TokenKind::Whitespace) {
                continue;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn scans_punctuation() {
        assert_eq!(
            kinds("* + ? | ~ ;"),
            vec![
                TokenKind::Star,
                TokenKind::Plus,
                TokenKind::Question,
                TokenKind::VerticalBar,
                TokenKind::Tilde,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn scans_hashtag_ident_and_dollar() {
        assert_eq!(
            kinds("#expr #$ #"),
            vec![
                TokenKind::Ident("expr".to_string()),
                TokenKind::Dollar,
                TokenKind::Hashtag,
            ]
        );
    }

    #[test]
    fn scans_numbers() {
        assert_eq!(kinds("0x1F 42"), vec![TokenKind::HexNumber(0x1F), TokenKind::DecNumber(42)]);
    }

    #[test]
    fn scans_epsilon_and_anyset_symbols() {
        assert_eq!(kinds("ϵ ξ"), vec![TokenKind::Epsilon, TokenKind::Anyset]);
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(kinds("// a comment\n*"), vec![TokenKind::Star]);
    }

    #[test]
    fn dangling_escape_is_a_scan_error() {
        let mut s = Scanner::new("\\");
        assert!(s.next_token().is_err());
    }

    #[test]
    fn peek_does_not_advance_real_position() {
        let mut s = Scanner::new("* + ?");
        let peeked = s.peek(2).expect("peek ok");
        assert_eq!(peeked.len(), 2);
        assert_eq!(peeked[0].kind, TokenKind::Star);
        assert_eq!(s.position(), 0);
        let first = s.next_token().expect("scan ok").expect("token");
        assert_eq!(first.kind, TokenKind::Star);
    }

    #[test]
    fn string_body_respects_mode() {
        let mut s = Scanner::new("a\\n'");
        s.push_mode(Mode::SingleQuoteString);
        let a = s.next_token().expect("ok").expect("tok");
        assert_eq!(a.kind, TokenKind::Char('a'));
        let esc = s.next_token().expect("ok").expect("tok");
        assert_eq!(esc.kind, TokenKind::Escape('n'));
        let close = s.next_token().expect("ok").expect("tok");
        assert_eq!(close.kind, TokenKind::SingleQuote);
    }
}
