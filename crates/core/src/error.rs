//! Error types for the helpdesk service.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, completion and embedding providers,
//! source parsing, index persistence and prompts.

use thiserror::Error;

/// Unified error type for the helpdesk service.
///
/// All fallible functions return `Result<T, AppError>`. Retrieval operations
/// that must never break a chat reply convert these into empty results at
/// their boundary after logging them.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding provider errors (network, auth, rate limit, timeout)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A source file could not be read or parsed
    #[error("Source error: {0}")]
    Source(String),

    /// Writing the index or its metadata to disk failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Stored vectors and metadata records disagree
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// Knowledge base errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
