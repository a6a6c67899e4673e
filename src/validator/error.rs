// SPDX-License-Identifier: MIT

//! Errors raised while loading snapshots, test files and configuration

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Invalid configuration value (file or environment)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ValidatorError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
