// src/error.rs

//! Unified error handling for the mirror tooling.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for pagemirror operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Only failures on required state end up here. Unclassifiable URLs and
/// malformed directory names are findings, not errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal failed
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Advisory lock could not be taken
    #[error("Lock error on {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a lock error for the given file.
    pub fn lock(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Lock {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a validation error describing an unusable value.
    pub fn invalid(field: &str, value: impl fmt::Display) -> Self {
        Self::Validation(format!("{field} has an invalid value: {value}"))
    }
}
