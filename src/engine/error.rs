// SPDX-License-Identifier: MIT

//! Typed error handling for the rule engine
//!
//! Lex and parse failures mark a single rule as invalid, evaluation errors
//! mark it as broken, and store errors abort the batch that shares the
//! resolution context.

use thiserror::Error;

/// Top-level error for evaluating one rule
#[derive(Debug, Error)]
pub enum RuleError {
    /// Malformed token in the rule text
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Malformed grammar in the rule text
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rule is well formed but could not be evaluated
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Snapshot store failed; further resolution is meaningless
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Evaluation was cancelled between resolution steps
    #[error("Rule evaluation cancelled")]
    Cancelled,
}

/// Unrecognized character sequence in the rule text
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Lex error at {position}: {reason}")]
pub struct LexError {
    pub position: usize,
    pub reason: String,
}

/// Token sequence does not match the grammar
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Parse error at {position}: expected {expected}, found {found}")]
pub struct ParseError {
    pub position: usize,
    pub expected: String,
    pub found: String,
}

/// Operand resolution errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    /// No function registered under this name
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong arity or incompatible argument kinds
    #[error("Invalid arguments for {function}: {reason}")]
    InvalidArguments { function: String, reason: String },
}

/// Snapshot store and connectivity failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Fetch did not complete within the configured timeout
    #[error("Fetch of snapshot '{snapshot_id}' timed out after {timeout_ms} ms")]
    Timeout { snapshot_id: String, timeout_ms: u64 },

    /// Store could not be reached or returned an error
    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),
}

impl LexError {
    pub fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

impl ParseError {
    pub fn new(position: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl EvaluationError {
    /// Create an invalid arguments error
    pub fn invalid_arguments(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            reason: reason.into(),
        }
    }
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl RuleError {
    /// True when the rule text itself is malformed or cannot be evaluated
    pub fn is_invalid_rule(&self) -> bool {
        matches!(
            self,
            RuleError::Lex(_) | RuleError::Parse(_) | RuleError::Evaluation(_)
        )
    }
}
