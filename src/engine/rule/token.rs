// SPDX-License-Identifier: MIT

//! Token definitions for rule text

use super::ast::CompareOp;
use serde_json::Number;

/// A lexical unit with its raw text and byte offset in the rule
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

/// The kind of a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Names
    Identifier(String),   // resource.sku, S1.tags
    FunctionName(String), // identifier immediately followed by '('

    // Literals
    String(String),
    Number(Number),
    Boolean(bool),
    Null,

    // Comparators, including the `in` and `contains` keywords
    Operator(CompareOp),
    // `and` / `or`, recognised only so they can be rejected with a clear error
    Logical(String),

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    Comma,    // ,
    Colon,    // :

    Eof,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Description used in parse errors
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of rule".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}
