//! The meta-parser (spec.md §4.2): recursive descent over the token stream,
//! one rule at a time, building a [`MetaAst`] per rule body. Precedence is
//! expressed the way `plotnik-compiler`'s expression parser layers its
//! matchers — tightest-binding first, each tier calling down to the next.

mod ast;
mod fold;
mod lower;

pub use ast::MetaAst;
pub use fold::fold_to_fixpoint;
pub use lower::lower_rule;

use dewy_cc_core::Charset;

use crate::diagnostics::Span;
use crate::error::ParseError;
use crate::scanner::{Mode, Scanner, SpannedToken, TokenKind, TokenTag};

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub head: String,
    pub body: MetaAst,
    pub span: Span,
}

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    lookahead: Vec<SpannedToken>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { scanner: Scanner::new(source), lookahead: Vec::new() }
    }

    pub fn parse_grammar(&mut self) -> Result<Vec<Rule>, ParseError> {
        let mut rules = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek_tag()?.is_none() {
                break;
            }
            rules.push(self.parse_rule()?);
        }
        Ok(rules)
    }

    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        let start = self.current_offset();
        let head = self.expect_hashtag_ident("expected a rule head, e.g. `#name`")?;
        self.skip_trivia()?;
        self.expect(TokenTag::Equals, "expected `=` after rule head")?;
        self.scanner.push_mode(Mode::RuleBody);
        self.skip_trivia()?;
        let mut body = self.parse_alt()?;
        fold_to_fixpoint(&mut body);
        self.skip_trivia()?;
        self.expect(TokenTag::Semicolon, "expected `;` to close a rule")?;
        self.scanner.pop_mode();
        let end = self.current_offset();
        Ok(Rule { head, body, span: Span::new(start, end) })
    }

    // --- precedence tiers, tightest first ---

    fn parse_alt(&mut self) -> Result<MetaAst, ParseError> {
        let mut left = self.parse_setop()?;
        loop {
            self.skip_trivia()?;
            match self.peek_tag()? {
                Some(TokenTag::VerticalBar) => {
                    self.bump()?;
                    self.skip_trivia()?;
                    let right = self.parse_setop()?;
                    left = match left {
                        MetaAst::Or(mut items) => {
                            items.push(right);
                            MetaAst::Or(items)
                        }
                        other => MetaAst::Or(vec![other, right]),
                    };
                }
                Some(TokenTag::Greater) => {
                    self.bump()?;
                    self.skip_trivia()?;
                    let right = self.parse_setop()?;
                    left = MetaAst::GreaterThan(Box::new(left), Box::new(right));
                }
                Some(TokenTag::Less) => {
                    self.bump()?;
                    self.skip_trivia()?;
                    let right = self.parse_setop()?;
                    left = MetaAst::LessThan(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_setop(&mut self) -> Result<MetaAst, ParseError> {
        let mut left = self.parse_cat()?;
        loop {
            self.skip_trivia()?;
            let op = match self.peek_tag()? {
                Some(TokenTag::Minus) => Some(TokenTag::Minus),
                Some(TokenTag::ForwardSlash) => Some(TokenTag::ForwardSlash),
                Some(TokenTag::Ampersand) => Some(TokenTag::Ampersand),
                _ => None,
            };
            let Some(op) = op else { break };
            self.bump()?;
            self.skip_trivia()?;
            let right = self.parse_cat()?;
            left = match op {
                TokenTag::Minus => MetaAst::Reject(Box::new(left), Box::new(right)),
                TokenTag::ForwardSlash => MetaAst::Nofollow(Box::new(left), Box::new(right)),
                TokenTag::Ampersand => MetaAst::Intersect(Box::new(left), Box::new(right)),
                _ => unreachable!(),
            };
        }
        Ok(left)
    }

    fn parse_cat(&mut self) -> Result<MetaAst, ParseError> {
        let mut items = vec![self.parse_postfix()?];
        loop {
            self.skip_trivia_no_eof()?;
            if !self.starts_atom()? {
                break;
            }
            items.push(self.parse_postfix()?);
        }
        if items.len() == 1 {
            Ok(items.into_iter().next().unwrap())
        } else {
            Ok(MetaAst::Cat(items))
        }
    }

    fn parse_postfix(&mut self) -> Result<MetaAst, ParseError> {
        let mut node = self.parse_atom()?;
        loop {
            match self.peek_tag()? {
                Some(TokenTag::Star) => {
                    self.bump()?;
                    node = MetaAst::Star(Box::new(node), None);
                }
                Some(TokenTag::Plus) => {
                    self.bump()?;
                    node = MetaAst::Plus(Box::new(node), None);
                }
                Some(TokenTag::Question) => {
                    self.bump()?;
                    node = MetaAst::Option(Box::new(node));
                }
                Some(TokenTag::Period) => {
                    self.bump()?;
                    node = MetaAst::Capture(Box::new(node));
                }
                Some(TokenTag::Tilde) => {
                    self.bump()?;
                    node = MetaAst::Compliment(Box::new(node));
                }
                Some(TokenTag::DecNumber) => {
                    let count = match self.bump()?.kind {
                        TokenKind::DecNumber(n) => n as u32,
                        _ => unreachable!(),
                    };
                    match self.peek_tag()? {
                        Some(TokenTag::Star) => {
                            self.bump()?;
                            node = MetaAst::Star(Box::new(node), Some(count));
                        }
                        Some(TokenTag::Plus) => {
                            self.bump()?;
                            node = MetaAst::Plus(Box::new(node), Some(count));
                        }
                        _ => {
                            node = MetaAst::Count(Box::new(node), count);
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<MetaAst, ParseError> {
        self.skip_trivia()?;
        let offset = self.current_offset();
        let Some(tag) = self.peek_tag()? else {
            return Err(self.fail(offset, "unexpected end of input while parsing an expression"));
        };
        match tag {
            TokenTag::Epsilon => {
                self.bump()?;
                Ok(MetaAst::Eps)
            }
            TokenTag::Anyset => {
                self.bump()?;
                Ok(MetaAst::Charset(Charset::anyset()))
            }
            TokenTag::HexNumber => {
                let tok = self.bump()?;
                let TokenKind::HexNumber(cp) = tok.kind else { unreachable!() };
                Ok(MetaAst::Charset(Charset::single(cp)))
            }
            TokenTag::Ident => {
                let tok = self.bump()?;
                let TokenKind::Ident(name) = tok.kind else { unreachable!() };
                Ok(MetaAst::Identifier(name))
            }
            TokenTag::Char => {
                let tok = self.bump()?;
                let TokenKind::Char(c) = tok.kind else { unreachable!() };
                if c == '`' {
                    self.parse_caseless_string()
                } else {
                    Ok(MetaAst::Charset(Charset::single(c as u32)))
                }
            }
            TokenTag::Escape => {
                let tok = self.bump()?;
                let TokenKind::Escape(c) = tok.kind else { unreachable!() };
                Ok(MetaAst::Charset(Charset::single(c as u32)))
            }
            TokenTag::SingleQuote => self.parse_quoted_string('\''),
            TokenTag::DoubleQuote => self.parse_quoted_string('"'),
            TokenTag::LeftBracket => self.parse_charset_body(),
            TokenTag::LeftBrace => {
                self.bump()?;
                self.skip_trivia()?;
                self.expect(TokenTag::RightBrace, "expected `}` to close `{}`")?;
                Ok(MetaAst::Eps)
            }
            TokenTag::LeftParen => {
                self.bump()?;
                self.skip_trivia()?;
                let inner = self.parse_alt()?;
                self.skip_trivia()?;
                self.expect(TokenTag::RightParen, "expected `)` to close a group")?;
                Ok(inner)
            }
            other => Err(self.fail(offset, format!("unexpected token while parsing an expression: {other:?}"))),
        }
    }

    fn parse_quoted_string(&mut self, quote: char) -> Result<MetaAst, ParseError> {
        let mode = if quote == '\'' { Mode::SingleQuoteString } else { Mode::DoubleQuoteString };
        self.bump()?; // opening quote
        self.scanner.push_mode(mode);
        let mut chars = Vec::new();
        loop {
            let tok = self.bump()?;
            match tok.kind {
                TokenKind::SingleQuote if quote == '\'' => break,
                TokenKind::DoubleQuote if quote == '"' => break,
                TokenKind::Char(c) => chars.push(c),
                TokenKind::Escape(c) => chars.push(unescape(c)),
                other => {
                    return Err(self.fail(tok.span.start, format!("unexpected token in string literal: {other:?}")));
                }
            }
        }
        self.scanner.pop_mode();
        if chars.is_empty() {
            Ok(MetaAst::Eps)
        } else {
            Ok(MetaAst::String(chars))
        }
    }

    fn parse_caseless_string(&mut self) -> Result<MetaAst, ParseError> {
        self.scanner.push_mode(Mode::CaselessString);
        let mut chars = Vec::new();
        loop {
            let tok = self.bump()?;
            match tok.kind {
                TokenKind::Char('`') => break,
                TokenKind::Char(c) => chars.push(c),
                TokenKind::Escape(c) => chars.push(unescape(c)),
                other => {
                    return Err(self.fail(tok.span.start, format!("unexpected token in caseless string: {other:?}")));
                }
            }
        }
        self.scanner.pop_mode();
        if chars.is_empty() {
            Ok(MetaAst::Eps)
        } else {
            Ok(MetaAst::Caseless(chars))
        }
    }

    fn parse_charset_body(&mut self) -> Result<MetaAst, ParseError> {
        self.bump()?; // `[`
        self.scanner.push_mode(Mode::CharsetBody);
        let mut set = Charset::empty();
        let negate_start = self.current_offset();
        let negate = if self.peek_tag()? == Some(TokenTag::Tilde) {
            self.bump()?;
            true
        } else {
            false
        };
        let _ = negate_start;
        loop {
            self.skip_trivia()?;
            if self.peek_tag()? == Some(TokenTag::RightBracket) {
                self.bump()?;
                break;
            }
            let lo = self.charset_literal_char()?;
            self.skip_trivia()?;
            let member = if self.peek_tag()? == Some(TokenTag::Minus) {
                self.bump()?;
                self.skip_trivia()?;
                let hi = self.charset_literal_char()?;
                Charset::range(lo.min(hi), lo.max(hi))
            } else {
                Charset::single(lo)
            };
            set = set.union(&member);
        }
        self.scanner.pop_mode();
        if negate {
            set = set.complement();
        }
        Ok(MetaAst::Charset(set))
    }

    fn charset_literal_char(&mut self) -> Result<u32, ParseError> {
        let tok = self.bump()?;
        match tok.kind {
            TokenKind::Char(c) => Ok(c as u32),
            TokenKind::Escape(c) => Ok(unescape(c) as u32),
            TokenKind::HexNumber(cp) => Ok(cp),
            TokenKind::DecNumber(n) => Ok(n as u32),
            other => Err(self.fail(tok.span.start, format!("expected a character inside `[...]`, found {other:?}"))),
        }
    }

    fn starts_atom(&mut self) -> Result<bool, ParseError> {
        Ok(matches!(
            self.peek_tag()?,
            Some(
                TokenTag::Epsilon
                    | TokenTag::Anyset
                    | TokenTag::HexNumber
                    | TokenTag::Ident
                    | TokenTag::Char
                    | TokenTag::Escape
                    | TokenTag::SingleQuote
                    | TokenTag::DoubleQuote
                    | TokenTag::LeftBracket
                    | TokenTag::LeftBrace
                    | TokenTag::LeftParen
            )
        ))
    }

    // --- token plumbing ---

    fn fill(&mut self, n: usize) -> Result<(), ParseError> {
        while self.lookahead.len() <= n {
            match self.scanner.next_token().map_err(|e| ParseError { offset: e.offset, reason: e.reason })? {
                Some(tok) => self.lookahead.push(tok),
                None => break,
            }
        }
        Ok(())
    }

    fn peek_tag(&mut self) -> Result<Option<TokenTag>, ParseError> {
        self.fill(0)?;
        Ok(self.lookahead.first().map(|t| t.tag()))
    }

    fn bump(&mut self) -> Result<SpannedToken, ParseError> {
        self.fill(0)?;
        if self.lookahead.is_empty() {
            let offset = self.scanner.position();
            return Err(self.fail(offset, "unexpected end of input"));
        }
        Ok(self.lookahead.remove(0))
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            self.fill(0)?;
            match self.lookahead.first().map(|t| t.tag()) {
                Some(TokenTag::Whitespace) | Some(TokenTag::Comment) => {
                    self.lookahead.remove(0);
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Like [`Self::skip_trivia`] but tolerant of end-of-input (used inside
    /// `parse_cat`'s lookahead check, where running out of tokens just means
    /// "no more concatenation terms" rather than a parse error).
    fn skip_trivia_no_eof(&mut self) -> Result<(), ParseError> {
        self.skip_trivia()
    }

    fn expect(&mut self, tag: TokenTag, message: &str) -> Result<SpannedToken, ParseError> {
        self.skip_trivia()?;
        let offset = self.current_offset();
        if self.peek_tag()? == Some(tag) {
            self.bump()
        } else {
            Err(self.fail(offset, message))
        }
    }

    fn expect_hashtag_ident(&mut self, message: &str) -> Result<String, ParseError> {
        self.skip_trivia()?;
        let offset = self.current_offset();
        match self.peek_tag()? {
            Some(TokenTag::Ident) => {
                let tok = self.bump()?;
                match tok.kind {
                    TokenKind::Ident(name) => Ok(name),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.fail(offset, message)),
        }
    }

    fn current_offset(&self) -> usize {
        self.lookahead.first().map(|t| t.span.start).unwrap_or_else(|| self.scanner.position())
    }

    fn fail(&self, offset: usize, reason: impl Into<String>) -> ParseError {
        ParseError { offset, reason: reason.into() }
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    fn parse_one(src: &str) -> MetaAst {
        let mut p = Parser::new(src);
        let mut rules = p.parse_grammar().expect("parse ok");
        assert_eq!(rules.len(), 1);
        rules.remove(0).body
    }

    #[test]
    fn parses_concatenation() {
        let ast = parse_one("#r = 'a' 'b';");
        assert_eq!(ast, MetaAst::Cat(vec![MetaAst::String(vec!['a']), MetaAst::String(vec!['b'])]));
    }

    #[test]
    fn parses_kleene_star() {
        let ast = parse_one("#r = 'a'*;");
        assert_eq!(ast, MetaAst::Star(Box::new(MetaAst::String(vec!['a'])), None));
    }

    #[test]
    fn parses_alternation() {
        let ast = parse_one("#r = 'a' | 'b';");
        assert_eq!(ast, MetaAst::Or(vec![MetaAst::String(vec!['a']), MetaAst::String(vec!['b'])]));
    }

    #[test]
    fn parses_identifier_reference() {
        let ast = parse_one("#r = #other;");
        assert_eq!(ast, MetaAst::Identifier("other".to_string()));
    }

    #[test]
    fn parses_charset_range_and_negation() {
        let ast = parse_one("#r = [a-z];");
        assert_eq!(ast, MetaAst::Charset(Charset::range('a' as u32, 'z' as u32)));
    }

    #[test]
    fn constant_folds_charset_reject() {
        let ast = parse_one("#r = [a-z] - [m-q];");
        let expected =
            Charset::range('a' as u32, 'z' as u32).difference(&Charset::range('m' as u32, 'q' as u32));
        assert_eq!(ast, MetaAst::Charset(expected));
    }

    #[test]
    fn parses_multiple_rules() {
        let mut p = Parser::new("#a = 'x'; #b = 'y';");
        let rules = p.parse_grammar().expect("parse ok");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].head, "a");
        assert_eq!(rules[1].head, "b");
    }

    #[test]
    fn missing_semicolon_is_a_parse_error() {
        let mut p = Parser::new("#a = 'x'");
        assert!(p.parse_grammar().is_err());
    }
}
