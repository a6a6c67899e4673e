// SPDX-License-Identifier: MIT

//! Validator configuration
//!
//! Values come from an optional YAML file, then `SNAPCHECK_*` environment
//! variables (a `.env` file is loaded by the binary) override them.

use super::error::ValidatorError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Collection used for snapshot nodes that do not name one
pub const DEFAULT_COLLECTION: &str = "resources";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Per-document fetch timeout
    pub fetch_timeout_ms: u64,
    pub default_collection: String,
    /// Maximum rules evaluated at once by the concurrent runner
    pub concurrency: usize,
    /// HTTP port for `serve`
    pub port: u16,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 30_000,
            default_collection: DEFAULT_COLLECTION.to_string(),
            concurrency: 16,
            port: 8080,
        }
    }
}

impl ValidatorConfig {
    /// Load from `path` (if given) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ValidatorError> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ValidatorError::FileNotFound(path.display().to_string()));
                }
                Self::parse_yaml(&fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn parse_yaml(content: &str) -> Result<Self, ValidatorError> {
        let config: ValidatorConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SNAPCHECK_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ValidatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SNAPCHECK_FETCH_TIMEOUT_MS") {
            self.fetch_timeout_ms = parse_var("SNAPCHECK_FETCH_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("SNAPCHECK_DEFAULT_COLLECTION") {
            self.default_collection = v;
        }
        if let Some(v) = lookup("SNAPCHECK_CONCURRENCY") {
            self.concurrency = parse_var("SNAPCHECK_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("SNAPCHECK_PORT") {
            self.port = parse_var("SNAPCHECK_PORT", &v)?;
        }
        self.validate()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    fn validate(&self) -> Result<(), ValidatorError> {
        if self.concurrency == 0 {
            return Err(ValidatorError::config("concurrency must be at least 1"));
        }
        if self.default_collection.trim().is_empty() {
            return Err(ValidatorError::config("default_collection must not be empty"));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ValidatorError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidatorError::config(format!("invalid value for {}: '{}'", key, value)))
}
