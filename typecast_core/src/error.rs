//! Error types for Typecast Core

use crate::value::Value;
use thiserror::Error;

/// Result type for Typecast operations
pub type Result<T> = std::result::Result<T, TypecastError>;

/// Errors that can occur while binding, casting or constructing values
#[derive(Error, Debug)]
pub enum TypecastError {
    /// Call actuals do not match the function's formal parameters
    #[error("{function}() {message}")]
    BindingError { function: String, message: String },

    /// A conversion factory failed for the given value
    #[error("Could not cast '{value}' to {target}")]
    CastError {
        value: Value,
        target: String,
        reason: String,
    },

    /// A restricted type's validator rejected the candidate
    #[error("{0}")]
    ValidationError(String),

    /// Malformed function signature declaration
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Type name not present in the registry
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Error raised by a function body
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TypecastError {
    pub(crate) fn binding(function: &str, message: impl Into<String>) -> Self {
        TypecastError::BindingError {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
