//! Error types for the study tutor client
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for study tutor operations
///
/// Covers input validation, Tutor Service failures, transcript invariant
/// violations, export failures, and the ambient configuration and I/O errors.
#[derive(Error, Debug)]
pub enum TutorError {
    /// Empty topic or question, rejected before any external call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Tutor Service call failed (transport, non-2xx, or malformed payload)
    #[error("Service error: {message}")]
    Service {
        /// User-visible failure reason
        message: String,
    },

    /// An exchange id was appended twice to the same transcript
    #[error("Duplicate exchange id: {0}")]
    DuplicateId(String),

    /// Rendering or writing an export artifact failed
    #[error("Export error: {0}")]
    Export(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

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

impl TutorError {
    /// Shorthand for building a [`TutorError::Service`]
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }
}

/// Result type alias for study tutor operations
///
/// Uses `anyhow::Error` so context can be attached while propagating;
/// callers that need the kind use `downcast_ref::<TutorError>()`.
pub type Result<T> = anyhow::Result<T>;

/// Extract the user-visible message from an error
///
/// Service errors yield their bare message; everything else falls back to
/// the full display string.
pub fn user_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<TutorError>() {
        Some(TutorError::Service { message }) => message.clone(),
        _ => error.to_string(),
    }
}
