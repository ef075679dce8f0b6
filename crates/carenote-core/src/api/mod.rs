//! Remote services consumed by the sync core.
//!
//! Each service is a trait so the engines can run against the REST client
//! in production and against in-process fakes in tests.

mod http;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::models::{Answers, FormSnapshot, NotificationId, NotificationPage};
use crate::Result;

pub use http::HttpClinicApi;

/// Body of a form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    pub version_id: String,
    pub answers: Answers,
    pub finalize: bool,
}

/// Autosave endpoint for in-progress form payloads
#[async_trait]
pub trait DraftApi: Send + Sync {
    async fn submit_draft(&self, form_type: &str, subject_id: &str, payload: &Value)
        -> Result<()>;
}

#[async_trait]
pub trait FormsApi: Send + Sync {
    async fn fetch_form(&self, form_type: &str, subject_id: &str) -> Result<FormSnapshot>;

    async fn submit_form(
        &self,
        form_type: &str,
        subject_id: &str,
        submission: &FormSubmission,
    ) -> Result<()>;
}

#[async_trait]
pub trait NotificationsApi: Send + Sync {
    async fn fetch_notifications(&self, page: u32, limit: u32) -> Result<NotificationPage>;

    async fn mark_notifications_read(&self, ids: &[NotificationId]) -> Result<()>;
}

/// Clinical session note endpoints
#[async_trait]
pub trait SessionsApi: Send + Sync {
    async fn fetch_session_note(&self, session_id: &str) -> Result<String>;

    async fn save_session_note(&self, session_id: &str, notes: &str) -> Result<()>;
}

/// Network reachability check, consulted before a write is attempted.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity driven by the host environment (online/offline events).
#[derive(Debug, Clone)]
pub struct ConnectivityFlag {
    online: Arc<AtomicBool>,
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::info!("Connectivity changed: online={online}");
        }
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
