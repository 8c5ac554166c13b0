//! Parser for the dsviz console language
//!
//! Converts tokens into a Program (sequence of statements) by recursive
//! descent. Expression precedence, loosest first:
//! `||`, `&&`, `== !=`, `< <= > >=`, `+ -`, `* / %`, unary `- !`,
//! postfix (call, method call, index), primary.

use crate::ast::{BinaryOp, Block, Expr, FunctionDef, Program, Stmt, UnaryOp, Value};
use crate::lexer::{Operator, Token};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token: {0:?}")]
    UnexpectedToken(Token),
    #[error("Expected {expected}, found {found:?}")]
    Expected { expected: &'static str, found: Token },
    #[error("Methods can only be called on a named entity")]
    InvalidReceiver,
}

/// Parser state
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    /// Consume and return the current token
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if we're at the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn check_op(&self, op: Operator) -> bool {
        self.peek() == Some(&Token::Operator(op))
    }

    fn check_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s == word)
    }

    /// Consume `token` or fail naming what was expected
    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some(t) if t == token => Ok(()),
            Some(found) => Err(ParseError::Expected { expected, found }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(found) => Err(ParseError::Expected { expected, found }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&Token::Newline) {
            self.pos += 1;
        }
    }

    fn skip_separators(&mut self) {
        while self.check(&Token::Newline) || self.check(&Token::Semicolon) {
            self.pos += 1;
        }
    }

    /// Parse the entire input into a Program
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        self.skip_separators();
        while !self.is_at_end() {
            statements.push(self.parse_stmt()?);
            self.end_of_statement()?;
            self.skip_separators();
        }
        Ok(Program::new(statements))
    }

    /// A statement must be followed by a separator, `}` or the end
    fn end_of_statement(&self) -> Result<(), ParseError> {
        match self.peek() {
            None | Some(Token::Newline) | Some(Token::Semicolon) | Some(Token::RBrace) => Ok(()),
            Some(t) => Err(ParseError::UnexpectedToken(t.clone())),
        }
    }

    // === Statements ===

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let keyword = match self.peek() {
            Some(Token::Ident(word)) => word.clone(),
            _ => return self.parse_simple(),
        };
        match keyword.as_str() {
            "while" => self.parse_while(),
            "for" => self.parse_for(),
            "if" => self.parse_if(),
            "define" => self.parse_define(),
            "return" => self.parse_return(),
            _ => self.parse_simple(),
        }
    }

    /// Assignment or expression
    fn parse_simple(&mut self) -> Result<Stmt, ParseError> {
        if let (Some(Token::Ident(name)), Some(Token::Operator(Operator::Assign))) =
            (self.peek(), self.peek_at(1))
        {
            let name = name.clone();
            self.pos += 2;
            let value = self.parse_expr()?;
            return Ok(Stmt::Assign { name, value });
        }
        Ok(Stmt::Expr(self.parse_expr()?))
    }

    /// Comma-separated simple statements, as in a for-loop header
    fn parse_simple_list(&mut self, end: Token) -> Result<Block, ParseError> {
        let mut stmts = Vec::new();
        while !self.check(&end) {
            stmts.push(self.parse_simple()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        Ok(Rc::from(stmts))
    }

    /// `{ statements }`
    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.skip_newlines();
        self.expect(Token::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        self.skip_separators();
        while !self.check(&Token::RBrace) {
            if self.is_at_end() {
                return Err(ParseError::UnexpectedEof);
            }
            stmts.push(self.parse_stmt()?);
            self.end_of_statement()?;
            self.skip_separators();
        }
        self.advance();
        Ok(Rc::from(stmts))
    }

    fn parse_condition(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen, "')'")?;
        Ok(cond)
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let cond = self.parse_condition()?;
        let body = self.parse_block()?;
        Ok(Stmt::While { cond, body })
    }

    /// `for (init; cond; step) { body }`, each header part optional
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.expect(Token::LParen, "'('")?;
        let init = self.parse_simple_list(Token::Semicolon)?;
        self.expect(Token::Semicolon, "';'")?;
        let cond = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(Token::Semicolon, "';'")?;
        let step = self.parse_simple_list(Token::RParen)?;
        self.expect(Token::RParen, "')'")?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    /// `if (cond) { ... } else { ... }`; `else if` chains nest
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let cond = self.parse_condition()?;
        let then_branch = self.parse_block()?;

        // `else` may sit on the next line
        let save = self.pos;
        self.skip_newlines();
        let else_branch = if self.check_keyword("else") {
            self.advance();
            if self.check_keyword("if") {
                Some(Rc::from(vec![self.parse_if()?]))
            } else {
                Some(self.parse_block()?)
            }
        } else {
            self.pos = save;
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// `define name(a, b) { body }`
    fn parse_define(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.expect_ident("function name")?;
        self.expect(Token::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            params.push(self.expect_ident("parameter name")?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(Token::RParen, "')'")?;
        let body = self.parse_block()?;
        Ok(Stmt::Define(Rc::new(FunctionDef { name, params, body })))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        match self.peek() {
            None | Some(Token::Newline) | Some(Token::Semicolon) | Some(Token::RBrace) => {
                Ok(Stmt::Return(None))
            }
            Some(_) => Ok(Stmt::Return(Some(self.parse_expr()?))),
        }
    }

    // === Expressions ===

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    /// One left-associative precedence level
    fn binary_level(
        &mut self,
        ops: &[(Operator, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut lhs = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.check_op(token.clone()) {
                    self.advance();
                    self.skip_newlines();
                    let rhs = next(self)?;
                    lhs = Expr::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&[(Operator::Or, BinaryOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(&[(Operator::And, BinaryOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[(Operator::Eq, BinaryOp::Eq), (Operator::Ne, BinaryOp::Ne)],
            Self::parse_comparison,
        )
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[
                (Operator::Lt, BinaryOp::Lt),
                (Operator::Le, BinaryOp::Le),
                (Operator::Gt, BinaryOp::Gt),
                (Operator::Ge, BinaryOp::Ge),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[(Operator::Plus, BinaryOp::Add), (Operator::Minus, BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[
                (Operator::Star, BinaryOp::Mul),
                (Operator::Slash, BinaryOp::Div),
                (Operator::Percent, BinaryOp::Rem),
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = if self.check_op(Operator::Minus) {
            UnaryOp::Neg
        } else if self.check_op(Operator::Not) {
            UnaryOp::Not
        } else {
            return self.parse_postfix();
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    let Expr::Variable(name) = expr else {
                        return Err(ParseError::UnexpectedToken(Token::LParen));
                    };
                    self.advance();
                    let args = self.parse_list(Token::RParen)?;
                    expr = Expr::Call { name, args };
                }
                Some(Token::Dot) => {
                    let Expr::Variable(receiver) = expr else {
                        return Err(ParseError::InvalidReceiver);
                    };
                    self.advance();
                    let method = self.expect_ident("method name")?;
                    self.expect(Token::LParen, "'('")?;
                    let args = self.parse_list(Token::RParen)?;
                    expr = Expr::MethodCall {
                        receiver,
                        method,
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated expressions up to and including `end`
    fn parse_list(&mut self, end: Token) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        self.skip_newlines();
        while !self.check(&end) {
            items.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
            self.skip_newlines();
        }
        match end {
            Token::RParen => self.expect(end, "')'")?,
            _ => self.expect(end, "']'")?,
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance().ok_or(ParseError::UnexpectedEof)?;
        match token {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "nil" => Expr::Literal(Value::Nil),
                _ => Expr::Variable(name),
            }),
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::LBracket => Ok(Expr::List(self.parse_list(Token::RBracket)?)),
            other => Err(ParseError::UnexpectedToken(other)),
        }
    }
}

/// Parse tokens into a program
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse()
}
