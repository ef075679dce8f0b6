//! Error types for carenote-core

use thiserror::Error;

/// Result type alias using carenote-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback text shown when a failure carries no server message
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur in carenote-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required input (subject id, loaded version) was missing.
    /// Raised before any I/O is attempted.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An answer does not fit its question
    #[error("Invalid answer for question {question_id}: {reason}")]
    InvalidAnswer { question_id: String, reason: String },

    /// Remote service answered with a non-2xx status
    #[error("API error (HTTP {status}): {}", message.as_deref().unwrap_or("no details"))]
    Api {
        status: u16,
        /// Message extracted from a structured error body, if any
        message: Option<String>,
    },

    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local draft database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Message suitable for a user-visible notice.
    ///
    /// Server-provided messages and local validation messages are shown as
    /// is; transport and storage failures fall back to generic text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.trim().to_string(),
            Self::Precondition(message) | Self::InvalidInput(message) => message.clone(),
            Self::InvalidAnswer { reason, .. } => reason.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
