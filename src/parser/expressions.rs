//! Expression parsing: precedence climbing.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};

impl Parser {
    /// Parse an expression at the lowest precedence (assignment).
    pub(crate) fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    /// Assignment is right-associative; the target must be an identifier.
    fn assignment(&mut self) -> ParseResult<Expr> {
        let left = self.logical()?;

        if self.check(&TokenKind::Equals) {
            if !matches!(left.kind, ExprKind::Identifier(_)) {
                return Err(ParserError::InvalidAssignmentTarget(self.current_span()));
            }
            self.advance();
            let value = self.assignment()?;
            let span = left.span;
            return Ok(Expr::new(
                ExprKind::Assignment {
                    target: Box::new(left),
                    value: Box::new(value),
                },
                span,
            ));
        }

        Ok(left)
    }

    fn logical(&mut self) -> ParseResult<Expr> {
        let mut left = self.comparison()?;

        while let TokenKind::LogicalOperator(lexeme) = &self.peek().kind {
            let op = if lexeme == "&&" {
                BinaryOp::And
            } else {
                BinaryOp::Or
            };
            self.advance();
            let right = self.comparison()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.additive()?;

        while let TokenKind::ComparisonOperator(lexeme) = &self.peek().kind {
            let op = BinaryOp::from_comparison(lexeme).expect("comparison lexeme");
            self.advance();
            let right = self.additive()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.multiplicative()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::BinaryOperator('+') => BinaryOp::Add,
                TokenKind::BinaryOperator('-') => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.unary()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::BinaryOperator('*') => BinaryOp::Multiply,
                TokenKind::BinaryOperator('/') => BinaryOp::Divide,
                TokenKind::Modulo => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// Prefix `++`/`--` bind here; postfix forms follow a primary chain.
    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match &self.peek().kind {
            TokenKind::Increment => Some(UnaryOp::Increment),
            TokenKind::Decrement => Some(UnaryOp::Decrement),
            _ => None,
        };
        if let Some(op) = op {
            let span = self.advance().span;
            let operand = self.call()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    operand: Box::new(operand),
                    op,
                    prefix: true,
                },
                span,
            ));
        }

        let expr = self.call()?;

        let op = match &self.peek().kind {
            TokenKind::Increment => Some(UnaryOp::Increment),
            TokenKind::Decrement => Some(UnaryOp::Decrement),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let span = expr.span;
            return Ok(Expr::new(
                ExprKind::Unary {
                    operand: Box::new(expr),
                    op,
                    prefix: false,
                },
                span,
            ));
        }

        Ok(expr)
    }

    /// Repeated `(args)` applications on any callable.
    fn call(&mut self) -> ParseResult<Expr> {
        let mut callee = self.member()?;

        while self.check(&TokenKind::OpenParen) {
            self.advance();
            let mut args = Vec::new();
            if !self.check(&TokenKind::CloseParen) {
                loop {
                    args.push(self.expression()?);
                    if self.check(&TokenKind::CloseParen) {
                        break;
                    }
                    self.expect(&TokenKind::Comma, "',' or ')' in argument list")?;
                }
            }
            self.expect(&TokenKind::CloseParen, "')' after arguments")?;
            let span = callee.span;
            callee = Expr::new(
                ExprKind::Call {
                    callee: Box::new(callee),
                    args,
                },
                span,
            );
        }

        Ok(callee)
    }

    /// Repeated `.ident` dereferences.
    fn member(&mut self) -> ParseResult<Expr> {
        let mut object = self.primary()?;

        while self.match_token(&TokenKind::Dot) {
            let property = self.expect_identifier("identifier after '.'")?;
            let span = object.span;
            object = Expr::new(
                ExprKind::Member {
                    object: Box::new(object),
                    property,
                },
                span,
            );
        }

        Ok(object)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        let span = token.span;
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::new(ExprKind::NumberLit(n), span)),
            TokenKind::Identifier(name) => Ok(Expr::new(ExprKind::Identifier(name), span)),
            TokenKind::String(s) => Ok(Expr::new(ExprKind::StringLit(s), span)),
            TokenKind::True => Ok(Expr::new(ExprKind::BoolLit(true), span)),
            TokenKind::False => Ok(Expr::new(ExprKind::BoolLit(false), span)),
            TokenKind::OpenBracket => self.array_literal(span),
            TokenKind::OpenBrace => self.map_literal(span),
            TokenKind::OpenParen => {
                let expr = self.expression()?;
                self.expect(&TokenKind::CloseParen, "')' after expression in parentheses")?;
                Ok(expr)
            }
            TokenKind::Funct => {
                // Anonymous function expression
                let params = self.parameter_list()?;
                let body = self.block()?;
                Ok(Expr::new(ExprKind::Function { params, body }, span))
            }
            other => Err(ParserError::unexpected_token(
                "expression",
                format!("{}", other),
                span,
            )),
        }
    }

    fn array_literal(&mut self, span: crate::span::Span) -> ParseResult<Expr> {
        let mut elements = Vec::new();
        if !self.check(&TokenKind::CloseBracket) {
            loop {
                elements.push(self.expression()?);
                if self.check(&TokenKind::CloseBracket) {
                    break;
                }
                self.expect(&TokenKind::Comma, "',' or ']' in array literal")?;
            }
        }
        self.expect(&TokenKind::CloseBracket, "']' to end an array literal")?;
        Ok(Expr::new(ExprKind::ArrayLit(elements), span))
    }

    fn map_literal(&mut self, span: crate::span::Span) -> ParseResult<Expr> {
        let mut pairs = Vec::new();
        if !self.check(&TokenKind::CloseBrace) {
            loop {
                let key = self.expression()?;
                self.expect(&TokenKind::Colon, "':' after key in map literal")?;
                let value = self.expression()?;
                pairs.push((key, value));
                if self.check(&TokenKind::CloseBrace) {
                    break;
                }
                self.expect(&TokenKind::Comma, "',' or '}' in map literal")?;
            }
        }
        self.expect(&TokenKind::CloseBrace, "'}' to end a map literal")?;
        Ok(Expr::new(ExprKind::MapLit(pairs), span))
    }
}
