// SPDX-License-Identifier: MIT

//! Rule expressions: parsing and evaluation
//!
//! A rule is a single comparison such as:
//! - `S1.resource.sku == 'Standard'`
//! - `length(keys(S1.tags)) > 0`
//! - `'prod' in S1.tags.env_list`

mod ast;
mod evaluator;
mod lexer;
mod parser;
mod resolver;
mod token;

pub use ast::{CompareOp, Expression, Operand};
pub use evaluator::{compare, EvaluationResult};
pub use lexer::tokenize;
pub use parser::parse;
pub use resolver::{resolve, Resolver};
pub use token::{Token, TokenKind};

use crate::engine::cancel::CancellationFlag;
use crate::engine::context::ResolutionContext;
use crate::engine::error::RuleError;
use crate::engine::functions::{builtins, FunctionRegistry};
use std::sync::Arc;

/// Parses and evaluates rules with a given function registry
#[derive(Clone)]
pub struct RuleEngine {
    registry: Arc<FunctionRegistry>,
}

impl RuleEngine {
    /// Engine using the built-in function library
    pub fn new() -> Self {
        Self::with_registry(builtins().clone())
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Evaluate one rule against the context
    pub async fn evaluate(
        &self,
        rule: &str,
        ctx: &ResolutionContext,
    ) -> Result<EvaluationResult, RuleError> {
        self.evaluate_with_cancel(rule, ctx, &CancellationFlag::new())
            .await
    }

    /// Evaluate one rule, giving up at the next checkpoint once `cancel` is set
    pub async fn evaluate_with_cancel(
        &self,
        rule: &str,
        ctx: &ResolutionContext,
        cancel: &CancellationFlag,
    ) -> Result<EvaluationResult, RuleError> {
        if cancel.is_cancelled() {
            return Err(RuleError::Cancelled);
        }
        log::info!("Actual rule: {}", rule);
        let expr = parse(rule)?;
        self.evaluate_expression(rule, &expr, ctx, cancel).await
    }

    /// Evaluate an already parsed expression; `rule` is only used for reporting
    pub async fn evaluate_expression(
        &self,
        rule: &str,
        expr: &Expression,
        ctx: &ResolutionContext,
        cancel: &CancellationFlag,
    ) -> Result<EvaluationResult, RuleError> {
        if cancel.is_cancelled() {
            return Err(RuleError::Cancelled);
        }
        let documents = ctx.prefetch(&expr.snapshot_refs()).await?;

        let resolver = Resolver::new(&self.registry, &documents, ctx.default_document(), cancel);
        let left = resolver.resolve(&expr.left)?;
        let right = resolver.resolve(&expr.right)?;

        let result = EvaluationResult::new(rule, left, expr.op, right);
        log::debug!("{}", result.diagnostics);
        Ok(result)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
