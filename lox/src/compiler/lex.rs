use std::rc::Rc;

use crate::common::source::Source;
use crate::common::span::Span;
use crate::common::value::Value;
use crate::compiler::syntax::{Diagnostics, Syntax};
use crate::compiler::token::{Token, TokenKind};

/// Scans a source into an ordered token stream terminated by `EOF`: an
/// index-into-source cursor, whitespace and comments eaten ahead of each
/// token, and per-token-kind classification functions.
pub struct Lexer {
    source: Rc<Source>,
    start: usize,
    current: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Scans `source` to completion. Scan errors are reported into the
    /// returned `Diagnostics` rather than aborting -- the scanner always
    /// produces a well-formed (if incomplete) token stream ending in
    /// `EOF`.
    pub fn lex(source: Rc<Source>) -> (Vec<Token>, Diagnostics) {
        let mut lexer = Lexer { source, start: 0, current: 0, tokens: vec![] };
        let mut diagnostics = Diagnostics::new();

        while !lexer.at_end() {
            lexer.start = lexer.current;
            lexer.scan_token(&mut diagnostics);
        }

        let eof_span = Span::point(&lexer.source, lexer.current);
        lexer.tokens.push(Token::new(TokenKind::Eof, String::new(), None, eof_span));
        (lexer.tokens, diagnostics)
    }

    fn at_end(&self) -> bool {
        self.current >= self.source.contents.len()
    }

    fn rest(&self) -> &str {
        &self.source.contents[self.current..]
    }

    fn advance(&mut self) -> char {
        let c = self.rest().chars().next().expect("advance past end of source");
        self.current += c.len_utf8();
        c
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    /// Consumes the next character if it matches `expected`, returning
    /// whether it did -- used for the one-or-two character operators.
    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != Some(expected) {
            return false;
        }
        self.current += expected.len_utf8();
        true
    }

    fn lexeme(&self) -> String {
        self.source.contents[self.start..self.current].to_string()
    }

    fn span(&self) -> Span {
        Span::new(&self.source, self.start, self.current - self.start)
    }

    fn push(&mut self, kind: TokenKind) {
        self.push_literal(kind, None);
    }

    fn push_literal(&mut self, kind: TokenKind, literal: Option<Value>) {
        let lexeme = self.lexeme();
        let span = self.span();
        self.tokens.push(Token::new(kind, lexeme, literal, span));
    }

    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let c = self.advance();

        match c {
            ' ' | '\t' | '\r' | '\n' => {},
            '/' if self.peek() == Some('/') => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            },
            '(' => self.push(TokenKind::LeftParen),
            ')' => self.push(TokenKind::RightParen),
            '{' => self.push(TokenKind::LeftBrace),
            '}' => self.push(TokenKind::RightBrace),
            ',' => self.push(TokenKind::Comma),
            '.' => self.push(TokenKind::Dot),
            '-' => self.push(TokenKind::Minus),
            '+' => self.push(TokenKind::Plus),
            ';' => self.push(TokenKind::Semicolon),
            '*' => self.push(TokenKind::Star),
            '/' => self.push(TokenKind::Slash),
            '!' => {
                let kind = if self.matches('=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.push(kind);
            },
            '=' => {
                let kind = if self.matches('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.push(kind);
            },
            '<' => {
                let kind = if self.matches('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.push(kind);
            },
            '>' => {
                let kind =
                    if self.matches('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.push(kind);
            },
            '"' => self.string(diagnostics),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            unknown => {
                diagnostics.push(Syntax::error(
                    format!("Unexpected character '{}'", unknown),
                    String::new(),
                    self.span(),
                ));
            },
        }
    }

    /// Strings are double-quoted, may span lines, and do not support
    /// escapes. An unterminated string is reported and scanning
    /// continues from end-of-source.
    fn string(&mut self, diagnostics: &mut Diagnostics) {
        while self.peek().is_some_and(|c| c != '"') {
            self.advance();
        }

        if self.at_end() {
            diagnostics.push(Syntax::error("Unterminated string.", String::new(), self.span()));
            return;
        }

        self.advance(); // closing quote
        let contents = self.source.contents[self.start + 1..self.current - 1].to_string();
        self.push_literal(TokenKind::String, Some(Value::string(contents)));
    }

    /// `digit+ (. digit+)?` -- a leading or trailing dot without digits
    /// on both sides is not part of the number.
    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // the '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.lexeme();
        let value: f64 = text.parse().expect("scanned number literal must parse as f64");
        self.push_literal(TokenKind::Number, Some(Value::Number(value)));
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`, reclassified into a keyword token if the
    /// lexeme matches one.
    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }

        let text = self.lexeme();
        match TokenKind::keyword(&text) {
            Some(TokenKind::True) => self.push_literal(TokenKind::True, Some(Value::Boolean(true))),
            Some(TokenKind::False) => {
                self.push_literal(TokenKind::False, Some(Value::Boolean(false)))
            },
            Some(TokenKind::Nil) => self.push_literal(TokenKind::Nil, Some(Value::Nil)),
            Some(kind) => self.push(kind),
            None => self.push(TokenKind::Identifier),
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn doesnt_crash(s in "\\PC*") {
            let (_, _) = Lexer::lex(Rc::new(Source::source(s)));
        }

        #[test]
        fn numbers_always_lex_as_a_single_token_or_fewer(s in "[0-9]+(\\.[0-9]+)?") {
            let (tokens, diagnostics) = Lexer::lex(Rc::new(Source::source(s)));
            prop_assert!(!diagnostics.had_error());
            prop_assert!(tokens.len() <= 2); // the number, plus EOF
        }
    }

    fn lex(src: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = Lexer::lex(Rc::new(Source::source(src)));
        assert!(!diagnostics.had_error(), "unexpected scan errors: {:?}", diagnostics.errors());
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn ends_with_single_eof() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex("   \n  "), vec![TokenKind::Eof]);
    }

    #[test]
    fn punctuation_and_operators() {
        use TokenKind::*;
        assert_eq!(
            lex("(){};,+-*!===<=>=!=<>/."),
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, Semicolon, Comma, Plus, Minus, Star,
                BangEqual, EqualEqual, LessEqual, GreaterEqual, BangEqual, Less, Greater, Slash,
                Dot, Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        // `.5` has no digits before the dot, so the dot starts a fresh
        // digit run: `.`, `5`. `5.` has no digit after the dot, so the
        // trailing dot is never absorbed into the number either: `5`, `.`.
        let (tokens, _) = Lexer::lex(Rc::new(Source::source("123 45.67 .5 5.")));
        let literals: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Number)
            .map(|t| t.literal.clone().unwrap())
            .collect();
        assert_eq!(
            literals,
            vec![
                Value::Number(123.0),
                Value::Number(45.67),
                Value::Number(5.0),
                Value::Number(5.0),
            ]
        );
    }

    #[test]
    fn trailing_dot_is_not_absorbed_into_the_number() {
        use TokenKind::*;
        // `5.` lexes as `Number(5)` followed by a separate `Dot`, not a
        // single `5.` literal -- same token stream as `5 .` with the
        // whitespace removed.
        assert_eq!(lex("5."), vec![Number, Dot, Eof]);
        assert_eq!(lex("5 ."), vec![Number, Dot, Eof]);
    }

    #[test]
    fn keywords_vs_identifiers() {
        use TokenKind::*;
        assert_eq!(lex("and class orchid or"), vec![And, Class, Identifier, Or, Eof]);
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(lex("// a comment\n1"), vec![TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn string_literal() {
        let (tokens, diagnostics) = Lexer::lex(Rc::new(Source::source("\"hello\nworld\"")));
        assert!(!diagnostics.had_error());
        assert_eq!(tokens[0].literal, Some(Value::string("hello\nworld")));
    }

    #[test]
    fn unterminated_string_reports_and_continues() {
        let (tokens, diagnostics) = Lexer::lex(Rc::new(Source::source("\"oops")));
        assert!(diagnostics.had_error());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn token_spans_match_lexemes() {
        let (tokens, _) = Lexer::lex(Rc::new(Source::source("foo = 12")));
        for token in &tokens {
            if token.kind == TokenKind::Eof {
                continue;
            }
            assert_eq!(token.span.lexeme(), token.lexeme);
        }
    }
}
