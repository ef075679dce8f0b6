//! Debounced autosave engine.
//!
//! Watches a form payload, waits for a quiet interval and then performs one
//! remote write with the latest value. A failed or skipped write keeps the
//! payload in the local draft store; a successful one clears it. Callers
//! never see an error from this path.

mod scheduler;
mod writers;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

use crate::api::Connectivity;
use crate::config::DEFAULT_AUTOSAVE_DEBOUNCE_MS;
use crate::drafts::{draft_key, DraftStore};
use crate::state::SyncStatus;

pub use scheduler::DebounceSlot;
pub use writers::{notes_from_payload, FormDraftWriter, RemoteWriter, SessionNoteWriter};

/// Autosave engine for one form instance.
///
/// Writes for the instance are serialized: one write in flight, at most one
/// queued behind it. A queued write that a newer one overtakes is dropped.
pub struct AutosaveEngine {
    inner: Arc<EngineInner>,
    slot: Mutex<DebounceSlot>,
    debounce: Duration,
}

struct EngineInner {
    form_type: String,
    draft_key: String,
    writer: Arc<dyn RemoteWriter>,
    store: Arc<dyn DraftStore>,
    connectivity: Arc<dyn Connectivity>,
    /// Latest payload and its edit generation
    latest: Mutex<Option<(u64, Value)>>,
    edits: AtomicU64,
    fired: AtomicU64,
    write_lock: tokio::sync::Mutex<()>,
    closed: AtomicBool,
    status: watch::Sender<SyncStatus>,
}

impl AutosaveEngine {
    pub fn new(
        form_type: impl Into<String>,
        writer: Arc<dyn RemoteWriter>,
        store: Arc<dyn DraftStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let form_type = form_type.into();
        Self {
            inner: Arc::new(EngineInner {
                draft_key: draft_key(&form_type),
                form_type,
                writer,
                store,
                connectivity,
                latest: Mutex::new(None),
                edits: AtomicU64::new(0),
                fired: AtomicU64::new(0),
                write_lock: tokio::sync::Mutex::new(()),
                closed: AtomicBool::new(false),
                status: watch::Sender::new(SyncStatus::Idle),
            }),
            slot: Mutex::new(DebounceSlot::new()),
            debounce: Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
        }
    }

    /// Override the quiet interval.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn form_type(&self) -> &str {
        &self.inner.form_type
    }

    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn draft_key(&self) -> &str {
        &self.inner.draft_key
    }

    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    /// Observe status changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Record a new payload value and restart the quiet interval.
    pub fn update(&self, payload: Value) {
        if self.inner.is_closed() {
            tracing::debug!("Ignoring edit for closed autosave {}", self.inner.form_type);
            return;
        }

        let generation = self.inner.edits.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.lock_latest() = Some((generation, payload));
        self.inner.status.send_replace(SyncStatus::Pending);

        let inner = Arc::clone(&self.inner);
        self.lock_slot().schedule(self.debounce, inner.fire());
    }

    /// Write the pending payload now instead of waiting for the timer.
    ///
    /// Does nothing when no timer is pending.
    pub async fn flush(&self) {
        let had_pending = self.lock_slot().cancel();
        if had_pending {
            Arc::clone(&self.inner).fire().await;
        }
    }

    /// Cancel the pending timer and stop accepting edits.
    ///
    /// A write already in flight completes, but its outcome is discarded.
    pub fn shutdown(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Autosave {} shut down", self.inner.form_type);
        }
        self.lock_slot().close();
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, DebounceSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AutosaveEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl EngineInner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock_latest(&self) -> std::sync::MutexGuard<'_, Option<(u64, Value)>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fire(self: Arc<Self>) {
        if self.is_closed() {
            return;
        }

        // The payload is the one current when the timer expired, not when
        // the write lock frees up.
        let latest = self.lock_latest().clone();
        let Some((generation, payload)) = latest else {
            return;
        };

        let ticket = self.fired.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = self.write_lock.lock().await;
        if self.fired.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Autosave {} superseded by a newer write", self.form_type);
            return;
        }
        if self.is_closed() {
            return;
        }

        self.write(generation, &payload).await;
    }

    async fn write(&self, generation: u64, payload: &Value) {
        if !self.connectivity.is_online() {
            self.store.set(&self.draft_key, payload);
            tracing::info!("Offline: kept {} draft locally", self.form_type);
            self.publish(generation, SyncStatus::SyncedLocalOffline);
            return;
        }

        self.publish(generation, SyncStatus::Saving);
        let result = self.writer.write(payload).await;

        if self.is_closed() {
            tracing::debug!(
                "Discarding autosave result for {} after shutdown",
                self.form_type
            );
            return;
        }

        match result {
            Ok(()) => {
                self.store.remove(&self.draft_key);
                tracing::debug!("Autosaved {} remotely", self.form_type);
                self.publish(generation, SyncStatus::SyncedRemote);
            }
            Err(error) => {
                self.store.set(&self.draft_key, payload);
                tracing::warn!(
                    "Autosave of {} failed, kept draft locally: {error}",
                    self.form_type
                );
                self.publish(generation, SyncStatus::SyncedLocal);
            }
        }
    }

    /// Publish `status` unless a newer edit is already waiting.
    fn publish(&self, generation: u64, status: SyncStatus) {
        if self.edits.load(Ordering::SeqCst) == generation {
            self.status.send_replace(status);
        }
    }
}
