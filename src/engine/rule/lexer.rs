//! Rule text tokenizer

use super::ast::CompareOp;
use super::token::{Token, TokenKind};
use crate::engine::error::LexError;
use serde_json::Number;

/// Tokenize rule text; the result always ends with an `Eof` token
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            cursor: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).map(|(_, c)| *c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor + offset).map(|(_, c)| *c)
    }

    /// Byte offset of the cursor
    fn offset(&self) -> usize {
        self.chars
            .get(self.cursor)
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.cursor += 1;
        }

        let start = self.offset();
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        let punctuation = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            _ => None,
        };
        if let Some(kind) = punctuation {
            self.cursor += 1;
            return Ok(Token::new(kind, c.to_string(), start));
        }

        match c {
            '\'' | '"' => self.string(c, start),
            '=' | '!' | '<' | '>' => self.operator(c, start),
            '-' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number(start),
            c if c.is_ascii_digit() => self.number(start),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.word(start)),
            other => Err(LexError::new(
                start,
                format!("unexpected character '{}'", other),
            )),
        }
    }

    fn operator(&mut self, first: char, start: usize) -> Result<Token, LexError> {
        let has_eq = self.peek_at(1) == Some('=');
        let (op, len) = match (first, has_eq) {
            ('=', true) => (CompareOp::Eq, 2),
            ('!', true) => (CompareOp::NotEq, 2),
            ('<', true) => (CompareOp::Lte, 2),
            ('>', true) => (CompareOp::Gte, 2),
            ('<', false) => (CompareOp::Lt, 1),
            ('>', false) => (CompareOp::Gt, 1),
            _ => {
                return Err(LexError::new(
                    start,
                    format!("expected '{}=' operator", first),
                ))
            }
        };
        self.cursor += len;
        Ok(Token::new(TokenKind::Operator(op), &self.input[start..self.offset()], start))
    }

    fn string(&mut self, quote: char, start: usize) -> Result<Token, LexError> {
        self.cursor += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(LexError::new(start, "unterminated string literal")),
                Some('\\') if self.peek_at(1) == Some(quote) => {
                    value.push(quote);
                    self.cursor += 2;
                }
                Some(c) if c == quote => {
                    self.cursor += 1;
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.cursor += 1;
                }
            }
        }
        let text = &self.input[start..self.offset()];
        Ok(Token::new(TokenKind::String(value), text, start))
    }

    fn number(&mut self, start: usize) -> Result<Token, LexError> {
        if self.peek() == Some('-') {
            self.cursor += 1;
        }
        self.digits();

        let mut floating = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            floating = true;
            self.cursor += 1;
            self.digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                floating = true;
                self.cursor += digit_at;
                self.digits();
            }
        }

        if self
            .peek()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.')
        {
            return Err(LexError::new(self.offset(), "malformed number literal"));
        }

        let text = &self.input[start..self.offset()];
        let number = if floating {
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| LexError::new(start, format!("invalid number '{}'", text)))?
        } else {
            text.parse::<i64>()
                .map(Number::from)
                .map_err(|_| LexError::new(start, format!("integer out of range '{}'", text)))?
        };
        Ok(Token::new(TokenKind::Number(number), text, start))
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor += 1;
        }
    }

    fn word(&mut self, start: usize) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.cursor += 1;
        }
        let text = &self.input[start..self.offset()];

        if self.peek() == Some('(') {
            return Token::new(TokenKind::FunctionName(text.to_string()), text, start);
        }

        let kind = match text {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "null" => TokenKind::Null,
            "in" => TokenKind::Operator(CompareOp::In),
            "contains" => TokenKind::Operator(CompareOp::Contains),
            "and" | "or" => TokenKind::Logical(text.to_string()),
            _ => TokenKind::Identifier(text.to_string()),
        };
        Token::new(kind, text, start)
    }
}
