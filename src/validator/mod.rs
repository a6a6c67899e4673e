// SPDX-License-Identifier: MIT

//! Snapshot validator
//!
//! Loads snapshot definitions and test files, runs their rules through the
//! engine and reports the outcome. Also serves the same over HTTP.

pub mod config;
pub mod error;
pub mod runner;
pub mod server;
pub mod snapshot;
pub mod testset;

pub use config::ValidatorConfig;
pub use error::ValidatorError;
pub use runner::{BatchReport, BatchRunner, RuleReport, RuleStatus};
