use std::sync::Arc;
use std::time::Duration;

use carenote_core::api::{ConnectivityFlag, SessionsApi};
use carenote_core::autosave::AutosaveEngine;
use carenote_core::drafts::{DraftStore, MemoryDraftStore};
use carenote_core::sessions::{note_payload, SessionNotes};
use carenote_core::SyncStatus;

use crate::commands::common::{normalize_content, read_piped_stdin};
use crate::error::CliError;

pub async fn run_show_notes(api: Arc<dyn SessionsApi>, session_id: &str) -> Result<(), CliError> {
    // Loading never touches the draft store
    let notes = SessionNotes::new(
        api,
        Arc::new(MemoryDraftStore::new()),
        Arc::new(ConnectivityFlag::default()),
    );
    let text = notes.load(session_id).await?;
    if text.is_empty() {
        println!("(no notes)");
    } else {
        println!("{text}");
    }
    Ok(())
}

pub fn note_engine(
    api: Arc<dyn SessionsApi>,
    store: Arc<dyn DraftStore>,
    session_id: &str,
    debounce: Duration,
) -> Result<AutosaveEngine, CliError> {
    let notes = SessionNotes::new(api, store, Arc::new(ConnectivityFlag::default()))
        .with_debounce(debounce);
    Ok(notes.autosave(session_id)?)
}

/// Save through the autosave path so a failed write leaves a local draft.
pub async fn run_save_notes(
    api: Arc<dyn SessionsApi>,
    store: Arc<dyn DraftStore>,
    session_id: &str,
    text_parts: &[String],
    debounce: Duration,
) -> Result<SyncStatus, CliError> {
    let text = resolve_note_text(text_parts)?;
    let engine = note_engine(api, store, session_id, debounce)?;

    engine.update(note_payload(&text));
    engine.flush().await;

    let status = engine.status();
    if status.is_local_only() {
        println!(
            "Notes {}; run `carenote drafts show {}` to inspect",
            status.label(),
            engine.form_type()
        );
    } else {
        println!("Notes {}", status.label());
    }
    Ok(status)
}

fn resolve_note_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&text_parts.join(" ")) {
        return Ok(text);
    }
    read_piped_stdin()?.ok_or(CliError::EmptyNoteText)
}
