use std::rc::Rc;

use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// `tokens` must end with `TokenKind::Eof`, as produced by the lexer.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(mut self) -> Result<Program, Vec<Error>> {
        let mut errors = Vec::new();
        let mut statements = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            match self.parse_stmt() {
                Ok(s) => statements.push(s),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // guarantee progress — if nothing was consumed, force-advance
            // to prevent an infinite loop on unrecognised tokens
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Program { statements })
        } else {
            tracing::debug!(count = errors.len(), "parsing failed");
            Err(errors)
        }
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> Result<Statement, Error> {
        let stmt = match self.peek_kind() {
            TokenKind::Let    => self.parse_let()?,
            TokenKind::Return => self.parse_return()?,
            _ => Statement::Expression(self.parse_expr()?),
        };
        // the terminating `;` is optional
        self.matches(TokenKind::Semicolon);
        Ok(stmt)
    }

    fn parse_let(&mut self) -> Result<Statement, Error> {
        let span = self.span();
        self.expect(TokenKind::Let)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        Ok(Statement::Let { name, value, span })
    }

    fn parse_return(&mut self) -> Result<Statement, Error> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::Semicolon) || self.check(TokenKind::RBrace) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Ok(Statement::Return { value, span })
    }

    fn parse_block(&mut self) -> Result<BlockStatement, Error> {
        let span = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(BlockStatement { statements, span })
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────
    //
    // Lowest to highest: `== !=`, `< >`, `+ -`, `* /`, prefix `! -`,
    // then postfix call `(` and index `[`.

    fn parse_expr(&mut self) -> Result<Expression, Error> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq   => InfixOp::Eq,
                TokenKind::BangEq => InfixOp::NotEq,
                _ => break,
            };
            left = self.finish_infix(left, op, Self::parse_comparison)?;
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_addition()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => InfixOp::Lt,
                TokenKind::Gt => InfixOp::Gt,
                _ => break,
            };
            left = self.finish_infix(left, op, Self::parse_addition)?;
        }
        Ok(left)
    }

    fn parse_addition(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_multiplication()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => InfixOp::Add,
                TokenKind::Minus => InfixOp::Sub,
                _ => break,
            };
            left = self.finish_infix(left, op, Self::parse_multiplication)?;
        }
        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star  => InfixOp::Mul,
                TokenKind::Slash => InfixOp::Div,
                _ => break,
            };
            left = self.finish_infix(left, op, Self::parse_unary)?;
        }
        Ok(left)
    }

    /// Consume the operator token and parse the right operand at the next
    /// tighter level, which makes every binary operator left-associative.
    fn finish_infix(
        &mut self,
        left: Expression,
        op: InfixOp,
        next: fn(&mut Self) -> Result<Expression, Error>,
    ) -> Result<Expression, Error> {
        let span = self.span();
        self.advance();
        let right = next(self)?;
        Ok(Expression::Infix { left: Box::new(left), op, right: Box::new(right), span })
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Bang  => PrefixOp::Not,
            TokenKind::Minus => PrefixOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::Prefix { op, operand: Box::new(operand), span })
    }

    fn parse_postfix(&mut self) -> Result<Expression, Error> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                // call: expr(args)
                TokenKind::LParen => {
                    let span = self.span();
                    self.advance();
                    let args = self.parse_expr_list(TokenKind::RParen)?;
                    expr = Expression::Call { callee: Box::new(expr), args, span };
                }

                // index: expr[i]
                TokenKind::LBracket => {
                    let span = self.span();
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expression::Index { left: Box::new(expr), index: Box::new(index), span };
                }

                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Int(v)   => { self.advance(); Ok(Expression::Integer(v, span)) }
            TokenKind::Str(s)   => { self.advance(); Ok(Expression::Str(s, span)) }
            TokenKind::True     => { self.advance(); Ok(Expression::Boolean(true, span)) }
            TokenKind::False    => { self.advance(); Ok(Expression::Boolean(false, span)) }
            TokenKind::Ident(n) => { self.advance(); Ok(Expression::Identifier(n, span)) }

            // grouped expression
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            // array literal
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_expr_list(TokenKind::RBracket)?;
                Ok(Expression::Array(items, span))
            }

            TokenKind::If => self.parse_if(),
            TokenKind::Fn => self.parse_function(),

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_if(&mut self) -> Result<Expression, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let consequence = self.parse_block()?;
        let alternative = if self.matches(TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Expression::If { condition: Box::new(condition), consequence, alternative, span })
    }

    fn parse_function(&mut self) -> Result<Expression, Error> {
        let span = self.span();
        self.expect(TokenKind::Fn)?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            params.push(self.expect_ident()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Expression::Function { params, body: Rc::new(body), span })
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_expr_list(&mut self, close: TokenKind) -> Result<Vec<Expression>, Error> {
        let mut items = Vec::new();
        while !self.check(close.clone()) && !self.is_at_end() {
            items.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(close)?;
        Ok(items)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Ident(s) => { self.advance(); Ok(s) }
            ref k if k.is_keyword() => Err(self.error_at(&tok, &format!(
                "expected identifier, found keyword {k:?}"
            ))),
            _ => Err(self.error_at(&tok, &format!("expected identifier, found {:?}", tok.kind))),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_at(&self, tok: &Token, msg: &str) -> Error {
        Error::new(ErrorCode::P001, tok.line, tok.column, msg)
    }

    /// Skip tokens until we find something that looks like a new statement.
    /// Used after a parse error to attempt recovery.
    fn recover(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Semicolon => { self.advance(); break; }
                TokenKind::Eof | TokenKind::Let | TokenKind::Return => break,
                _ => { self.advance(); }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
