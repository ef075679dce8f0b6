//! Local draft store.
//!
//! Best-effort cache of unsynced form payloads, one record per form type.
//! Writes never fail to the caller: storage errors are logged and dropped,
//! because the remote copy stays the source of truth.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::db::{Database, DraftRepository, SqliteDraftRepository};
use crate::models::DraftRecord;
use crate::Result;

pub const DRAFT_KEY_PREFIX: &str = "draft_";

/// Namespaced storage key for a form type, e.g. `draft_ANAMNESE`.
pub fn draft_key(form_type: &str) -> String {
    format!("{DRAFT_KEY_PREFIX}{form_type}")
}

/// Key-value persistence for drafts.
pub trait DraftStore: Send + Sync {
    /// Persist `payload` under `key`, overwriting any previous draft.
    fn set(&self, key: &str, payload: &Value);

    /// Delete the draft under `key`.
    fn remove(&self, key: &str);

    /// Read back a stored draft (inspection only; nothing restores drafts automatically).
    fn get(&self, key: &str) -> Option<DraftRecord>;

    /// All stored drafts, most recent first.
    fn list(&self) -> Vec<DraftRecord>;
}

/// Draft store persisted in a local `SQLite` file
#[derive(Clone)]
pub struct SqliteDraftStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteDraftStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path.as_ref())?;
        tracing::debug!("Opened draft store at {}", path.as_ref().display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open_in_memory()?)),
        })
    }

    fn with_repo<T>(&self, f: impl FnOnce(&SqliteDraftRepository<'_>) -> Result<T>) -> Result<T> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        f(&SqliteDraftRepository::new(db.connection()))
    }
}

impl DraftStore for SqliteDraftStore {
    fn set(&self, key: &str, payload: &Value) {
        let record = DraftRecord::new(key, payload.clone());
        if let Err(error) = self.with_repo(|repo| repo.upsert(&record)) {
            tracing::warn!("Failed to persist local draft {key}: {error}");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(error) = self.with_repo(|repo| repo.delete(key)) {
            tracing::warn!("Failed to remove local draft {key}: {error}");
        }
    }

    fn get(&self, key: &str) -> Option<DraftRecord> {
        self.with_repo(|repo| repo.get(key))
            .unwrap_or_else(|error| {
                tracing::warn!("Failed to read local draft {key}: {error}");
                None
            })
    }

    fn list(&self) -> Vec<DraftRecord> {
        self.with_repo(|repo| repo.list())
            .unwrap_or_else(|error| {
                tracing::warn!("Failed to list local drafts: {error}");
                Vec::new()
            })
    }
}

/// Process-local draft store
#[derive(Clone, Default)]
pub struct MemoryDraftStore {
    drafts: Arc<Mutex<HashMap<String, DraftRecord>>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn set(&self, key: &str, payload: &Value) {
        let mut drafts = self.drafts.lock().unwrap_or_else(PoisonError::into_inner);
        drafts.insert(key.to_string(), DraftRecord::new(key, payload.clone()));
    }

    fn remove(&self, key: &str) {
        let mut drafts = self.drafts.lock().unwrap_or_else(PoisonError::into_inner);
        drafts.remove(key);
    }

    fn get(&self, key: &str) -> Option<DraftRecord> {
        let drafts = self.drafts.lock().unwrap_or_else(PoisonError::into_inner);
        drafts.get(key).cloned()
    }

    fn list(&self) -> Vec<DraftRecord> {
        let drafts = self.drafts.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<DraftRecord> = drafts.values().cloned().collect();
        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        records
    }
}
