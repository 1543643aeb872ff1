//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Resume was attempted with an unknown, consumed, or expired token
    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite errors (auto-converted from rusqlite::Error)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create an invalid checkpoint error
    pub fn invalid_checkpoint(thread_id: impl Into<String>) -> Self {
        Self::InvalidCheckpoint(thread_id.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<will_of_code_core::CoreError> for AppError {
    fn from(err: will_of_code_core::CoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<will_of_code_llm::LlmError> for AppError {
    fn from(err: will_of_code_llm::LlmError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convert AppError to a string for display at the CLI boundary
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
