//! Recursive-descent parser producing statement trees.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::error::ParseError;
use crate::eval::expr::Expr;
use crate::eval::ops::{BinaryOp, UnaryOp};
use crate::eval::stmt::{FunctionDef, Stmt};
use crate::value::Value;

use super::lexer::{tokenize, Token, TokenKind};

pub(crate) struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    source_name: &'src str,
    function_depth: u32,
}

type ParseResult<T> = Result<T, ParseError>;

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, source_name: &'src str) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
            source_name,
            function_depth: 0,
        }
    }

    pub(crate) fn parse_program(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_eof() {
                return Ok(body);
            }
            body.push(self.parse_stmt()?);
        }
    }

    /// Parse a single expression that must span the whole input.
    pub(crate) fn parse_standalone_expr(&mut self) -> ParseResult<Expr> {
        self.skip_newlines();
        let expr = self.parse_expr()?;
        self.skip_newlines();
        if let Some(token) = self.peek() {
            return Err(self.error_at(token, format!("unexpected '{}'", token.text)));
        }
        Ok(expr)
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let Some(token) = self.peek() else {
            return Err(self.error_eof("expected statement"));
        };
        let line = token.line;
        let stmt = match token.kind {
            TokenKind::KwDef => return self.parse_def(),
            TokenKind::KwIf => return self.parse_if(),
            TokenKind::KwWhile => return self.parse_while(),
            TokenKind::KwReturn => {
                self.bump();
                if self.function_depth == 0 {
                    return Err(self.error_line(line, "'return' outside function"));
                }
                let expr = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Stmt::Return { expr, line }
            }
            TokenKind::KwPrint => {
                self.bump();
                let expr = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Stmt::Print { expr, line }
            }
            TokenKind::KwRaise => {
                self.bump();
                Stmt::Raise {
                    expr: self.parse_expr()?,
                    line,
                }
            }
            TokenKind::KwExec => {
                self.bump();
                Stmt::Exec {
                    expr: self.parse_expr()?,
                    line,
                }
            }
            TokenKind::Ident if self.peek_nth(1).map(|t| t.kind) == Some(TokenKind::Assign) => {
                let target = SmolStr::new(token.text);
                self.bump();
                self.bump();
                Stmt::Assign {
                    target,
                    value: self.parse_expr()?,
                    line,
                }
            }
            _ => Stmt::Expr {
                expr: self.parse_expr()?,
                line,
            },
        };
        self.expect_stmt_end()?;
        Ok(stmt)
    }

    fn parse_def(&mut self) -> ParseResult<Stmt> {
        let line = self.bump_line();
        let name = self.expect_ident("function name")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.eat(TokenKind::RParen) {
            loop {
                let param = self.expect_ident("parameter name")?;
                if params.contains(&param) {
                    return Err(self.error_line(line, format!("duplicate parameter '{param}'")));
                }
                params.push(param);
                if self.eat(TokenKind::RParen) {
                    break;
                }
                self.expect(TokenKind::Comma, "',' or ')'")?;
            }
        }
        self.expect_stmt_end()?;
        self.function_depth += 1;
        let body = self.parse_block(&[TokenKind::KwEnd], "def", line);
        self.function_depth -= 1;
        let body = body?;
        self.bump();
        self.expect_stmt_end()?;
        let def = FunctionDef {
            name,
            params,
            body,
            source: SmolStr::new(self.source_name),
            line,
        };
        Ok(Stmt::Def {
            def: Arc::new(def),
            line,
        })
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.bump_line();
        let condition = self.parse_expr()?;
        self.expect_stmt_end()?;
        let then_block = self.parse_block(&[TokenKind::KwElse, TokenKind::KwEnd], "if", line)?;
        let else_block = if self.eat(TokenKind::KwElse) {
            self.expect_stmt_end()?;
            self.parse_block(&[TokenKind::KwEnd], "if", line)?
        } else {
            Vec::new()
        };
        self.bump();
        self.expect_stmt_end()?;
        Ok(Stmt::If {
            condition,
            then_block,
            else_block,
            line,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.bump_line();
        let condition = self.parse_expr()?;
        self.expect_stmt_end()?;
        let body = self.parse_block(&[TokenKind::KwEnd], "while", line)?;
        self.bump();
        self.expect_stmt_end()?;
        Ok(Stmt::While {
            condition,
            body,
            line,
        })
    }

    /// Parse statements up to (not including) one of `terminators`.
    fn parse_block(
        &mut self,
        terminators: &[TokenKind],
        opener: &str,
        opener_line: u32,
    ) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                None => {
                    return Err(self.error_eof(format!(
                        "expected 'end' to close '{opener}' from line {opener_line}"
                    )))
                }
                Some(token) if terminators.contains(&token.kind) => return Ok(body),
                Some(_) => body.push(self.parse_stmt()?),
            }
        }
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::KwOr) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(TokenKind::KwAnd) {
            let right = self.parse_not()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.eat(TokenKind::KwNot) {
            let expr = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.peek().and_then(|token| comparison_op(token.kind)) {
            self.bump();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().map(|token| token.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|token| token.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.eat(TokenKind::Minus) {
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.bump() else {
            return Err(self.error_eof("expected expression"));
        };
        match token.kind {
            TokenKind::IntLiteral => token
                .text
                .parse::<i64>()
                .map(|value| Expr::Literal(Value::Int(value)))
                .map_err(|_| self.error_at(token, "integer literal too large")),
            TokenKind::StringLiteral => Ok(Expr::Literal(Value::Str(unescape(token.text)))),
            TokenKind::KwTrue => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::KwFalse => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::KwNone => Ok(Expr::Literal(Value::None)),
            TokenKind::Ident => {
                let name = SmolStr::new(token.text);
                if !self.eat(TokenKind::LParen) {
                    return Ok(Expr::Name(name));
                }
                let mut args = Vec::new();
                if !self.eat(TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.eat(TokenKind::RParen) {
                            break;
                        }
                        self.expect(TokenKind::Comma, "',' or ')'")?;
                    }
                }
                Ok(Expr::Call { name, args })
            }
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Error => Err(self.error_at(token, format!("unexpected character '{}'", token.text))),
            TokenKind::Newline => Err(self.error_at(token, "expected expression")),
            _ => Err(self.error_at(token, format!("unexpected '{}'", token.text))),
        }
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_nth(&self, n: usize) -> Option<Token<'src>> {
        self.tokens.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<Token<'src>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn bump_line(&mut self) -> u32 {
        self.bump().map_or(0, |token| token.line)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().map(|token| token.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<()> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(self.error_at(token, format!("expected {what}, found '{}'", token.text.escape_default()))),
            None => Err(self.error_eof(format!("expected {what}"))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<SmolStr> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.pos += 1;
                Ok(SmolStr::new(token.text))
            }
            Some(token) => Err(self.error_at(token, format!("expected {what}"))),
            None => Err(self.error_eof(format!("expected {what}"))),
        }
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_stmt_end(&self) -> bool {
        matches!(self.peek().map(|token| token.kind), None | Some(TokenKind::Newline))
    }

    fn expect_stmt_end(&mut self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) if token.kind == TokenKind::Newline => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(self.error_at(
                token,
                format!("expected end of line, found '{}'", token.text),
            )),
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(TokenKind::Newline) {}
    }

    fn error_at(&self, token: Token<'_>, message: impl Into<SmolStr>) -> ParseError {
        ParseError::new(self.source_name, token.line, message)
    }

    fn error_line(&self, line: u32, message: impl Into<SmolStr>) -> ParseError {
        ParseError::new(self.source_name, line, message)
    }

    fn error_eof(&self, message: impl Into<SmolStr>) -> ParseError {
        let line = self.tokens.last().map_or(1, |token| {
            token.line + u32::from(token.kind == TokenKind::Newline)
        });
        ParseError::new(self.source_name, line, message)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::Ne),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::Le),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::Ge),
        _ => None,
    }
}

fn unescape(literal: &str) -> SmolStr {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    SmolStr::new(out)
}
