//! Statement parsing.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};

impl Parser {
    /// Parse one statement, dispatching on the leading token. Returns
    /// `None` for a stray `else` (its `if` already consumed the branch).
    pub(crate) fn statement(&mut self) -> ParseResult<Option<Stmt>> {
        match &self.peek().kind {
            TokenKind::Import => self.import_statement().map(Some),
            TokenKind::Funct => self.function_declaration().map(Some),
            TokenKind::Return => self.return_statement().map(Some),
            TokenKind::Try => self.try_statement().map(Some),
            TokenKind::Break => {
                let span = self.advance().span;
                Ok(Some(Stmt::new(StmtKind::Break, span)))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                Ok(Some(Stmt::new(StmtKind::Continue, span)))
            }
            TokenKind::Let | TokenKind::Var | TokenKind::Const => {
                self.var_declaration().map(Some)
            }
            TokenKind::If => self.if_statement().map(Some),
            TokenKind::ForRange => self.for_range_statement().map(Some),
            TokenKind::While => self.while_statement().map(Some),
            TokenKind::Else => {
                self.advance();
                Ok(None)
            }
            TokenKind::OpenBrace => {
                let span = self.current_span();
                let statements = self.block()?;
                Ok(Some(Stmt::new(StmtKind::Block(statements), span)))
            }
            _ => {
                let expr = self.expression()?;
                let span = expr.span;
                Ok(Some(Stmt::new(StmtKind::Expression(expr), span)))
            }
        }
    }

    /// `let|var|const name = expr`. The three keywords behave
    /// identically except that const flags the binding constant.
    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance();
        let constant = keyword.kind == TokenKind::Const;

        let name = self.expect_identifier("identifier in variable declaration")?;
        self.expect(&TokenKind::Equals, "'=' after identifier in variable declaration")?;
        let initializer = self.expression()?;

        Ok(Stmt::new(
            StmtKind::VarDeclaration {
                name,
                initializer,
                constant,
            },
            keyword.span,
        ))
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        self.expect(&TokenKind::OpenParen, "'(' after 'if'")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::CloseParen, "')' after if condition")?;
        let then_branch = self.block()?;

        let else_branch = if self.match_token(&TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        self.expect(&TokenKind::OpenParen, "'(' after 'while'")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::CloseParen, "')' after while condition")?;
        let body = self.block()?;

        Ok(Stmt::new(StmtKind::While { condition, body }, span))
    }

    /// `for range(i, N) { ... }`
    fn for_range_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        self.expect(&TokenKind::OpenParen, "'(' after 'for range'")?;
        let iter_var = self.expect_identifier("identifier in for loop")?;
        self.expect(&TokenKind::Comma, "',' after identifier in for loop")?;
        let count = self.expression()?;
        self.expect(&TokenKind::CloseParen, "')' after for loop range")?;
        let body = self.block()?;

        Ok(Stmt::new(
            StmtKind::ForRange {
                iter_var,
                count,
                body,
            },
            span,
        ))
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let name = self.expect_identifier("function name after 'funct'")?;
        let params = self.parameter_list()?;
        let body = self.block()?;

        Ok(Stmt::new(
            StmtKind::Function(FunctionDecl {
                name,
                params,
                body,
                span,
            }),
            span,
        ))
    }

    pub(crate) fn parameter_list(&mut self) -> ParseResult<Vec<String>> {
        self.expect(&TokenKind::OpenParen, "'(' before parameters")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::CloseParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if self.check(&TokenKind::CloseParen) {
                    break;
                }
                self.expect(&TokenKind::Comma, "',' or ')' in parameter list")?;
            }
        }
        self.expect(&TokenKind::CloseParen, "')' after parameters")?;
        Ok(params)
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let value = self.expression()?;
        Ok(Stmt::new(StmtKind::Return(value), span))
    }

    fn try_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let try_block = self.block()?;

        self.expect(&TokenKind::Catch, "'catch' after try block")?;
        self.expect(&TokenKind::OpenParen, "'(' after 'catch'")?;
        let error_var = self.expect_identifier("error variable name in catch clause")?;
        self.expect(&TokenKind::CloseParen, "')' after error variable")?;
        let catch_block = self.block()?;

        Ok(Stmt::new(
            StmtKind::Try {
                try_block,
                catch_block,
                error_var,
            },
            span,
        ))
    }

    fn import_statement(&mut self) -> ParseResult<Stmt> {
        let span = self.advance().span;
        let path = match &self.peek().kind {
            TokenKind::String(path) => {
                let path = path.clone();
                self.advance();
                path
            }
            _ => {
                return Err(ParserError::unexpected_token(
                    "string path after 'import'",
                    format!("{}", self.peek().kind),
                    self.current_span(),
                ))
            }
        };
        self.expect(&TokenKind::As, "'as' after import path")?;
        let alias = self.expect_identifier("identifier alias after 'as'")?;

        Ok(Stmt::new(StmtKind::Import { path, alias }, span))
    }

    /// Parse a brace-delimited block into its statement list.
    pub(crate) fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&TokenKind::OpenBrace, "'{' to start a block")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::CloseBrace) && !self.is_at_end() {
            if let Some(stmt) = self.statement()? {
                statements.push(stmt);
            }
        }
        self.expect(&TokenKind::CloseBrace, "'}' to end a block")?;
        Ok(statements)
    }
}
