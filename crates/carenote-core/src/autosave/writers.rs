//! Remote write targets for the autosave engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{DraftApi, SessionsApi};
use crate::{Error, Result};

/// Destination of debounced payloads
#[async_trait]
pub trait RemoteWriter: Send + Sync {
    async fn write(&self, payload: &Value) -> Result<()>;
}

/// Sends form payloads to the autosave endpoint
pub struct FormDraftWriter {
    api: Arc<dyn DraftApi>,
    form_type: String,
    subject_id: String,
}

impl FormDraftWriter {
    pub fn new(
        api: Arc<dyn DraftApi>,
        form_type: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            form_type: form_type.into(),
            subject_id: subject_id.into(),
        }
    }
}

#[async_trait]
impl RemoteWriter for FormDraftWriter {
    async fn write(&self, payload: &Value) -> Result<()> {
        self.api
            .submit_draft(&self.form_type, &self.subject_id, payload)
            .await
    }
}

/// Writes the `notes` field of a session, leaving its other fields alone
pub struct SessionNoteWriter {
    api: Arc<dyn SessionsApi>,
    session_id: String,
}

impl SessionNoteWriter {
    pub fn new(api: Arc<dyn SessionsApi>, session_id: impl Into<String>) -> Self {
        Self {
            api,
            session_id: session_id.into(),
        }
    }
}

#[async_trait]
impl RemoteWriter for SessionNoteWriter {
    async fn write(&self, payload: &Value) -> Result<()> {
        let notes = notes_from_payload(payload)?;
        self.api.save_session_note(&self.session_id, notes).await
    }
}

/// Accepts either a bare string or an object with a `notes` string.
pub fn notes_from_payload(payload: &Value) -> Result<&str> {
    match payload {
        Value::String(text) => Ok(text),
        Value::Object(map) => match map.get("notes") {
            Some(Value::String(text)) => Ok(text),
            Some(Value::Null) | None => Ok(""),
            Some(_) => Err(Error::InvalidInput(
                "session notes must be text".to_string(),
            )),
        },
        _ => Err(Error::InvalidInput(
            "session note payload must be text or an object with `notes`".to_string(),
        )),
    }
}
