//! Test files: named sets of rule cases

pub mod loader;
pub mod types;

pub use loader::TestFileLoader;
pub use types::{RuleCase, TestCase, TestFile, TestSet};
