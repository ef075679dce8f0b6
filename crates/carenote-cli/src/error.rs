use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] carenote_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Form type cannot be empty")]
    EmptyFormType,
    #[error("Note text cannot be empty")]
    EmptyNoteText,
    #[error("No draft stored for form type: {0}")]
    DraftNotFound(String),
    #[error(
        "The server is not configured. Set CARENOTE_API_URL and CARENOTE_TOKEN, or api_base_url in the config file."
    )]
    ApiNotConfigured,
}
