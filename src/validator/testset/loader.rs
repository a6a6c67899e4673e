//! Test file loader

use super::types::TestFile;
use crate::validator::error::ValidatorError;
use std::fs;
use std::path::Path;

pub struct TestFileLoader;

impl TestFileLoader {
    /// Load a test file (JSON or YAML)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TestFile, ValidatorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ValidatorError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<TestFile, ValidatorError> {
        let file: TestFile = serde_yaml::from_str(content)?;
        Ok(file)
    }
}
