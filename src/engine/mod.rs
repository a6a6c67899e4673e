// SPDX-License-Identifier: MIT

//! Rule expression engine
//!
//! This module provides:
//! - `rule` - lexing, parsing and evaluation of rule text
//! - `functions` - the built-in function library
//! - `context` - the per-batch resolution context and document cache
//! - `store` - the snapshot store interface the engine reads from

pub mod cancel;
pub mod context;
pub mod error;
pub mod functions;
pub mod path;
pub mod rule;
pub mod store;
pub mod value;

pub use cancel::CancellationFlag;
pub use context::ResolutionContext;
pub use error::{EvaluationError, LexError, ParseError, RuleError, StoreError};
pub use rule::{EvaluationResult, RuleEngine};
pub use store::{SnapshotDocument, SnapshotStore};
