//! Error types for RagChat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for RagChat operations
///
/// This enum encompasses all possible errors that can occur while loading
/// configuration, talking to the answer server, parsing the answer stream,
/// and persisting conversation history.
#[derive(Error, Debug)]
pub enum RagChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level errors (connect failures, non-2xx status,
    /// mid-stream network failures)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error payload delivered by the server inside the answer stream
    ///
    /// The wrapped string is the server's error message, verbatim. It is
    /// shown to the user as the assistant's reply for the failed turn.
    #[error("Answer stream error: {0}")]
    Answer(String),

    /// Conversation history storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for RagChat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
