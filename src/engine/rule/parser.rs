//! Recursive-descent parser for rule expressions
//!
//! ```text
//! expression    := operand comparator operand
//! operand       := literal | function_call | field_path | list | map
//! function_call := NAME '(' [ operand (',' operand)* ] ')'
//! field_path    := IDENT ('.' IDENT)*
//! list          := '[' [ operand (',' operand)* ] ']'
//! map           := '{' [ key ':' operand (',' key ':' operand)* ] '}'
//! comparator    := '==' | '!=' | '<' | '<=' | '>' | '>=' | 'in' | 'contains'
//! ```
//!
//! A rule made of a single operand is shorthand for `operand == true`.

use super::ast::{CompareOp, Expression, Operand};
use super::lexer::tokenize;
use super::token::{Token, TokenKind};
use crate::engine::error::{ParseError, RuleError};
use serde_json::Value;

/// Parse rule text into a single comparison expression
pub fn parse(input: &str) -> Result<Expression, RuleError> {
    let tokens = tokenize(input)?;
    log::debug!(
        "Tokens: {:?}",
        tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>()
    );
    let mut parser = Parser::new(tokens);
    Ok(parser.expression()?)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    fn peek(&self) -> &Token {
        // tokenize always terminates the sequence with Eof
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        token
    }

    fn error(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::new(token.position, expected, token.describe())
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let left = self.operand()?;
        if self.peek().kind == TokenKind::Eof {
            // A lone operand must resolve to `true`
            return Ok(Expression {
                left,
                op: CompareOp::Eq,
                right: Operand::Literal(Value::Bool(true)),
            });
        }
        let op = self.comparator()?;
        let right = self.operand()?;

        match &self.peek().kind {
            TokenKind::Eof => Ok(Expression { left, op, right }),
            TokenKind::Logical(_) => Err(self.error("end of rule (compound rules are not supported)")),
            _ => Err(self.error("end of rule")),
        }
    }

    fn comparator(&mut self) -> Result<CompareOp, ParseError> {
        let TokenKind::Operator(op) = self.peek().kind.clone() else {
            return Err(self.error("comparator"));
        };
        self.advance();
        Ok(op)
    }

    fn operand(&mut self) -> Result<Operand, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::String(s) => {
                self.advance();
                Ok(Operand::Literal(Value::String(s)))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Operand::Literal(Value::Number(n)))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Operand::Literal(Value::Bool(b)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Operand::Literal(Value::Null))
            }
            TokenKind::FunctionName(name) => {
                self.advance();
                self.function_call(name)
            }
            TokenKind::Identifier(text) => {
                self.advance();
                field_path(&text, token.position)
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.operand_list(TokenKind::RBracket, "']'")?;
                Ok(Operand::List(items))
            }
            TokenKind::LBrace => {
                self.advance();
                self.map_literal()
            }
            _ => Err(self.error("operand")),
        }
    }

    fn function_call(&mut self, name: String) -> Result<Operand, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.operand_list(TokenKind::RParen, "')'")?;
        Ok(Operand::FunctionCall { name, args })
    }

    /// Comma-separated operands up to and including `close`
    fn operand_list(&mut self, close: TokenKind, closing: &str) -> Result<Vec<Operand>, ParseError> {
        let mut items = Vec::new();
        if self.peek().kind == close {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.operand()?);
            if self.peek().kind == TokenKind::Comma {
                self.advance();
                continue;
            }
            self.expect(close, &format!("',' or {}", closing))?;
            return Ok(items);
        }
    }

    fn map_literal(&mut self) -> Result<Operand, ParseError> {
        let mut entries = Vec::new();
        if self.peek().kind == TokenKind::RBrace {
            self.advance();
            return Ok(Operand::Map(entries));
        }
        loop {
            let key = match self.peek().kind.clone() {
                TokenKind::String(s) | TokenKind::Identifier(s) => s,
                _ => return Err(self.error("map key")),
            };
            self.advance();
            self.expect(TokenKind::Colon, "':'")?;
            entries.push((key, self.operand()?));

            if self.peek().kind == TokenKind::Comma {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RBrace, "',' or '}'")?;
            return Ok(Operand::Map(entries));
        }
    }
}

fn field_path(text: &str, position: usize) -> Result<Operand, ParseError> {
    let mut segments: Vec<String> = text.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(ParseError::new(
            position,
            "field path segment",
            format!("'{}'", text),
        ));
    }

    // The first segment is a candidate snapshot id, even on its own
    let snapshot_ref = segments.remove(0);
    Ok(Operand::FieldPath {
        snapshot_ref: Some(snapshot_ref),
        segments,
    })
}
