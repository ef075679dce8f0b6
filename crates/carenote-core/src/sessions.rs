//! Clinical session notes.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::api::{Connectivity, SessionsApi};
use crate::autosave::{AutosaveEngine, SessionNoteWriter};
use crate::config::DEFAULT_AUTOSAVE_DEBOUNCE_MS;
use crate::drafts::DraftStore;
use crate::util::non_blank;
use crate::{Error, Result};

/// Autosave form type used for the notes of `session_id`.
pub fn session_note_form_type(session_id: &str) -> String {
    format!("SESSION_NOTE_{session_id}")
}

/// Payload carried by the autosave engine for a note edit.
pub fn note_payload(text: &str) -> Value {
    json!({ "notes": text })
}

/// Loads session notes and builds autosave engines for editing them.
///
/// Only the `notes` field is written; the session's other fields are left to
/// the regular update flows.
pub struct SessionNotes {
    api: Arc<dyn SessionsApi>,
    store: Arc<dyn DraftStore>,
    connectivity: Arc<dyn Connectivity>,
    debounce: Duration,
}

impl SessionNotes {
    pub fn new(
        api: Arc<dyn SessionsApi>,
        store: Arc<dyn DraftStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            api,
            store,
            connectivity,
            debounce: Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
        }
    }

    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Fetch the current note text of a session.
    pub async fn load(&self, session_id: &str) -> Result<String> {
        let session_id = required_session_id(session_id)?;
        self.api.fetch_session_note(session_id).await
    }

    /// Engine that autosaves note edits for `session_id`.
    pub fn autosave(&self, session_id: &str) -> Result<AutosaveEngine> {
        let session_id = required_session_id(session_id)?;
        let writer = Arc::new(SessionNoteWriter::new(Arc::clone(&self.api), session_id));
        Ok(AutosaveEngine::new(
            session_note_form_type(session_id),
            writer,
            Arc::clone(&self.store),
            Arc::clone(&self.connectivity),
        )
        .with_debounce(self.debounce))
    }
}

fn required_session_id(session_id: &str) -> Result<&str> {
    non_blank(Some(session_id)).ok_or_else(|| Error::precondition("session id is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ConnectivityFlag;
    use crate::drafts::MemoryDraftStore;
    use crate::state::SyncStatus;
    use crate::test_support::FakeApi;
    use pretty_assertions::assert_eq;

    fn notes(api: &Arc<FakeApi>, store: &Arc<MemoryDraftStore>) -> SessionNotes {
        SessionNotes::new(
            api.clone(),
            store.clone(),
            Arc::new(ConnectivityFlag::default()),
        )
    }

    #[tokio::test]
    async fn load_returns_note_text() {
        let api = Arc::new(FakeApi::new());
        api.session_notes
            .lock()
            .unwrap()
            .insert("s-1".to_string(), "Paciente relata melhora".to_string());
        let store = Arc::new(MemoryDraftStore::new());

        let text = notes(&api, &store).load("s-1").await.unwrap();
        assert_eq!(text, "Paciente relata melhora");
    }

    #[tokio::test]
    async fn blank_session_id_is_rejected() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryDraftStore::new());
        let notes = notes(&api, &store);

        assert!(notes.load(" ").await.unwrap_err().is_precondition());
        assert!(notes.autosave("").is_err());
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn note_edits_are_autosaved() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryDraftStore::new());
        let engine = notes(&api, &store).autosave("s-1").unwrap();

        engine.update(note_payload("Retorno"));
        engine.update(note_payload("Retorno em 15 dias"));
        tokio::time::sleep(Duration::from_millis(2_100)).await;

        assert_eq!(engine.status(), SyncStatus::SyncedRemote);
        assert_eq!(
            api.session_notes.lock().unwrap().get("s-1").map(String::as_str),
            Some("Retorno em 15 dias")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_note_save_falls_back_to_draft() {
        let api = Arc::new(FakeApi::new().failing_writes());
        let store = Arc::new(MemoryDraftStore::new());
        let engine = notes(&api, &store).autosave("s-1").unwrap();
        assert_eq!(engine.draft_key(), "draft_SESSION_NOTE_s-1");

        engine.update(note_payload("Evolução parcial"));
        tokio::time::sleep(Duration::from_millis(2_100)).await;

        assert_eq!(engine.status(), SyncStatus::SyncedLocal);
        assert_eq!(
            store.get("draft_SESSION_NOTE_s-1").unwrap().payload,
            note_payload("Evolução parcial")
        );
    }
}
