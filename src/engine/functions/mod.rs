// SPDX-License-Identifier: MIT

//! Function library for rule operands
//!
//! Functions are looked up by name in a [`FunctionRegistry`]. The shared
//! [`builtins`] registry holds every collection function; callers that need
//! extra functions build their own registry on top of it.

pub mod collection;

use crate::engine::error::EvaluationError;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

/// Signature of a built-in: resolved arguments in, fresh value out
pub type BuiltinFunction = fn(&[Value]) -> Result<Value, EvaluationError>;

static BUILTINS: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::with_builtins);

/// The process-wide registry of built-in functions
pub fn builtins() -> &'static FunctionRegistry {
    &BUILTINS
}

#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, BuiltinFunction>,
}

impl FunctionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// A registry holding every collection built-in
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("element", collection::element);
        registry.register("length", collection::length);
        registry.register("chunklist", collection::chunklist);
        registry.register("concat", collection::concat);
        registry.register("coalesce", collection::coalesce);
        registry.register("coalescelist", collection::coalescelist);
        registry.register("compact", collection::compact);
        registry.register("distinct", collection::distinct);
        registry.register("index", collection::index);
        registry.register("lookup", collection::lookup);
        registry.register("contains", collection::contains);
        registry.register("keys", collection::keys);
        registry.register("to_list", collection::to_list);
        registry.register("to_map", collection::to_map);
        registry.register("merge", collection::merge);
        registry.register("reverse", collection::reverse);
        registry.register("setintersection", collection::setintersection);
        registry
    }

    /// Register a function, replacing any existing one with the same name
    pub fn register(&mut self, name: &str, function: BuiltinFunction) {
        self.functions.insert(name.to_string(), function);
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered function names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call `name` with already-resolved arguments
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvaluationError> {
        match self.functions.get(name) {
            Some(function) => function(args),
            None => Err(EvaluationError::UnknownFunction(name.to_string())),
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
