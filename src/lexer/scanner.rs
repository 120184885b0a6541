//! Lexer/Scanner for Dylang source code.

use crate::error::LexerError;
use crate::lexer::token::{Token, TokenKind};
use crate::span::Span;

/// The scanner transforms source text into a stream of tokens.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
    start_pos: usize,
    start_line: usize,
    start_column: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scan all tokens from the source.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.scan_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Scan the next token.
    pub fn scan_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace_and_comments();
        self.mark_start();

        let Some((_, c)) = self.advance() else {
            return Ok(Token::eof(self.current_pos, self.line, self.column));
        };

        match c {
            '(' => Ok(self.make_token(TokenKind::OpenParen)),
            ')' => Ok(self.make_token(TokenKind::CloseParen)),
            '{' => Ok(self.make_token(TokenKind::OpenBrace)),
            '}' => Ok(self.make_token(TokenKind::CloseBrace)),
            '[' => Ok(self.make_token(TokenKind::OpenBracket)),
            ']' => Ok(self.make_token(TokenKind::CloseBracket)),
            ':' => Ok(self.make_token(TokenKind::Colon)),
            ',' => Ok(self.make_token(TokenKind::Comma)),
            '.' => Ok(self.make_token(TokenKind::Dot)),

            '+' => {
                if self.match_char('+') {
                    Ok(self.make_token(TokenKind::Increment))
                } else {
                    Ok(self.make_token(TokenKind::BinaryOperator('+')))
                }
            }
            '-' => {
                if self.match_char('-') {
                    Ok(self.make_token(TokenKind::Decrement))
                } else {
                    Ok(self.make_token(TokenKind::BinaryOperator('-')))
                }
            }
            '*' => Ok(self.make_token(TokenKind::BinaryOperator('*'))),
            '/' => Ok(self.make_token(TokenKind::BinaryOperator('/'))),
            '%' => Ok(self.make_token(TokenKind::Modulo)),

            '=' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::ComparisonOperator("==".to_string())))
                } else {
                    Ok(self.make_token(TokenKind::Equals))
                }
            }
            '!' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::ComparisonOperator("!=".to_string())))
                } else {
                    Err(LexerError::UnexpectedChar(c, self.current_span()))
                }
            }
            '<' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::ComparisonOperator("<=".to_string())))
                } else {
                    Ok(self.make_token(TokenKind::ComparisonOperator("<".to_string())))
                }
            }
            '>' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::ComparisonOperator(">=".to_string())))
                } else {
                    Ok(self.make_token(TokenKind::ComparisonOperator(">".to_string())))
                }
            }
            '&' => {
                if self.match_char('&') {
                    Ok(self.make_token(TokenKind::LogicalOperator("&&".to_string())))
                } else {
                    Err(LexerError::UnexpectedChar(c, self.current_span()))
                }
            }
            '|' => {
                if self.match_char('|') {
                    Ok(self.make_token(TokenKind::LogicalOperator("||".to_string())))
                } else {
                    Err(LexerError::UnexpectedChar(c, self.current_span()))
                }
            }

            '"' => self.scan_string(),

            c if c.is_ascii_digit() => self.scan_number(c),
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(c),

            _ => Err(LexerError::UnexpectedChar(c, self.current_span())),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                Some('/') => {
                    if self.peek_next() == Some('/') {
                        while self.peek().is_some() && self.peek() != Some('\n') {
                            self.advance();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Scan a string literal. The body is emitted raw: escape sequences
    /// are interpreted later, by the printing built-ins.
    fn scan_string(&mut self) -> Result<Token, LexerError> {
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    return Err(LexerError::UnterminatedString(self.current_span()));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                    value.push('\n');
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(self.make_token(TokenKind::String(value)))
    }

    /// Scan a number: a run of decimal digits. The source dialect has no
    /// fractional form, but the value is a double.
    fn scan_number(&mut self, first: char) -> Result<Token, LexerError> {
        let mut value = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let n: f64 = value
            .parse()
            .map_err(|_| LexerError::InvalidNumber(value.clone(), self.current_span()))?;
        Ok(self.make_token(TokenKind::Number(n)))
    }

    fn scan_identifier(&mut self, first: char) -> Result<Token, LexerError> {
        let mut value = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // `for` followed by a single space and `range` fuses into the
        // compound ForRange keyword.
        if value == "for" && self.peek() == Some(' ') {
            if let Some(rest) = self.lookahead_identifier_after_space() {
                if rest == "range" {
                    self.advance(); // the space
                    for _ in 0..rest.len() {
                        self.advance();
                    }
                    return Ok(self.make_token(TokenKind::ForRange));
                }
            }
        }

        let kind = TokenKind::keyword(&value).unwrap_or(TokenKind::Identifier(value));
        Ok(self.make_token(kind))
    }

    /// Peek the identifier that would follow a single space at the
    /// current position, without consuming anything.
    fn lookahead_identifier_after_space(&self) -> Option<String> {
        let mut iter = self.source[self.current_pos..].chars();
        if iter.next() != Some(' ') {
            return None;
        }
        let mut ident = String::new();
        for c in iter {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
            } else {
                break;
            }
        }
        if ident.is_empty() {
            None
        } else {
            Some(ident)
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            self.column += 1;
            Some((pos, c))
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn mark_start(&mut self) {
        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    fn current_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.current_span())
    }
}
