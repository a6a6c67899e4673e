// SPDX-License-Identifier: MIT

//! Operand resolution
//!
//! Snapshot documents are fetched up front through the resolution context;
//! resolving the operand tree afterwards is synchronous and never touches
//! the store.

use super::ast::Operand;
use crate::engine::cancel::CancellationFlag;
use crate::engine::context::ResolutionContext;
use crate::engine::error::RuleError;
use crate::engine::functions::FunctionRegistry;
use crate::engine::path::resolve_or_null;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves operands against prefetched snapshot documents
pub struct Resolver<'a> {
    registry: &'a FunctionRegistry,
    documents: &'a HashMap<String, Arc<Value>>,
    default_document: Option<&'a Value>,
    cancel: &'a CancellationFlag,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a FunctionRegistry,
        documents: &'a HashMap<String, Arc<Value>>,
        default_document: Option<&'a Value>,
        cancel: &'a CancellationFlag,
    ) -> Self {
        Self {
            registry,
            documents,
            default_document,
            cancel,
        }
    }

    /// Resolve an operand to a fresh value; absent fields resolve to `null`
    pub fn resolve(&self, operand: &Operand) -> Result<Value, RuleError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::FieldPath {
                snapshot_ref,
                segments,
            } => {
                self.checkpoint()?;
                Ok(self.resolve_path(snapshot_ref.as_deref(), segments))
            }
            Operand::FunctionCall { name, args } => {
                self.checkpoint()?;
                let values = args
                    .iter()
                    .map(|arg| self.resolve(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = self.registry.call(name, &values)?;
                log::debug!("{}(..) -> {}", name, result);
                Ok(result)
            }
            Operand::List(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Operand::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.resolve(value)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn checkpoint(&self) -> Result<(), RuleError> {
        if self.cancel.is_cancelled() {
            Err(RuleError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn resolve_path(&self, snapshot_ref: Option<&str>, segments: &[String]) -> Value {
        if let Some(id) = snapshot_ref {
            if let Some(document) = self.documents.get(id) {
                return resolve_or_null(document, segments);
            }
        }

        // Not a snapshot reference: the whole dotted path walks the default document
        let Some(root) = self.default_document else {
            return Value::Null;
        };
        let full: Vec<&str> = snapshot_ref
            .into_iter()
            .chain(segments.iter().map(String::as_str))
            .collect();
        resolve_or_null(root, &full)
    }
}

/// Resolve a single operand against a context, fetching what it references
pub async fn resolve(
    operand: &Operand,
    ctx: &ResolutionContext,
    registry: &FunctionRegistry,
    cancel: &CancellationFlag,
) -> Result<Value, RuleError> {
    if cancel.is_cancelled() {
        return Err(RuleError::Cancelled);
    }
    let documents = ctx.prefetch(&operand.snapshot_refs()).await?;
    Resolver::new(registry, &documents, ctx.default_document(), cancel).resolve(operand)
}
