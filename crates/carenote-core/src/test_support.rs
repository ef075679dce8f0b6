//! In-process fakes of the remote services, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::api::{DraftApi, FormSubmission, FormsApi, NotificationsApi, SessionsApi};
use crate::models::{FormSnapshot, NotificationId, NotificationItem, NotificationPage, PageMeta};
use crate::{Error, Result};

pub struct FakeApi {
    pub fail_writes: AtomicBool,
    pub fail_fetches: AtomicBool,
    pub network_calls: AtomicUsize,
    pub drafts: Mutex<Vec<(String, String, Value)>>,
    pub submissions: Mutex<Vec<(String, String, FormSubmission)>>,
    pub form: Mutex<Option<FormSnapshot>>,
    pub notifications: Mutex<Vec<NotificationItem>>,
    pub marked_read: Mutex<Vec<Vec<NotificationId>>>,
    pub session_notes: Mutex<HashMap<String, String>>,
    open: watch::Sender<bool>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            fail_writes: AtomicBool::new(false),
            fail_fetches: AtomicBool::new(false),
            network_calls: AtomicUsize::new(0),
            drafts: Mutex::default(),
            submissions: Mutex::default(),
            form: Mutex::default(),
            notifications: Mutex::default(),
            marked_read: Mutex::default(),
            session_notes: Mutex::default(),
            open: watch::Sender::new(true),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Hold every call until `release` is called.
    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    pub fn release(&self) {
        self.open.send_replace(true);
    }

    pub fn calls(&self) -> usize {
        self.network_calls.load(Ordering::SeqCst)
    }

    pub fn draft_payloads(&self) -> Vec<Value> {
        self.drafts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, payload)| payload.clone())
            .collect()
    }

    pub fn set_notifications(&self, items: Vec<NotificationItem>) {
        *self.notifications.lock().unwrap() = items;
    }

    async fn enter(&self) {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.subscribe();
        let _ = open.wait_for(|open| *open).await;
    }

    fn write_result(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Api {
                status: 503,
                message: Some("servidor indisponível".to_string()),
            })
        } else {
            Ok(())
        }
    }

    fn fetch_result(&self) -> Result<()> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            Err(Error::Api {
                status: 500,
                message: None,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DraftApi for FakeApi {
    async fn submit_draft(
        &self,
        form_type: &str,
        subject_id: &str,
        payload: &Value,
    ) -> Result<()> {
        self.enter().await;
        self.drafts.lock().unwrap().push((
            form_type.to_string(),
            subject_id.to_string(),
            payload.clone(),
        ));
        self.write_result()
    }
}

#[async_trait]
impl FormsApi for FakeApi {
    async fn fetch_form(&self, _form_type: &str, _subject_id: &str) -> Result<FormSnapshot> {
        self.enter().await;
        self.fetch_result()?;
        self.form.lock().unwrap().clone().ok_or(Error::Api {
            status: 404,
            message: Some("formulário não encontrado".to_string()),
        })
    }

    async fn submit_form(
        &self,
        form_type: &str,
        subject_id: &str,
        submission: &FormSubmission,
    ) -> Result<()> {
        self.enter().await;
        self.submissions.lock().unwrap().push((
            form_type.to_string(),
            subject_id.to_string(),
            submission.clone(),
        ));
        self.write_result()
    }
}

#[async_trait]
impl NotificationsApi for FakeApi {
    async fn fetch_notifications(&self, page: u32, limit: u32) -> Result<NotificationPage> {
        self.enter().await;
        self.fetch_result()?;
        let items = self.notifications.lock().unwrap().clone();
        Ok(NotificationPage {
            meta: PageMeta {
                page,
                limit,
                total: items.len() as u64,
                total_pages: 1,
            },
            items,
        })
    }

    async fn mark_notifications_read(&self, ids: &[NotificationId]) -> Result<()> {
        self.enter().await;
        self.marked_read.lock().unwrap().push(ids.to_vec());
        self.write_result()
    }
}

#[async_trait]
impl SessionsApi for FakeApi {
    async fn fetch_session_note(&self, session_id: &str) -> Result<String> {
        self.enter().await;
        self.fetch_result()?;
        Ok(self
            .session_notes
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_session_note(&self, session_id: &str, notes: &str) -> Result<()> {
        self.enter().await;
        self.write_result()?;
        self.session_notes
            .lock()
            .unwrap()
            .insert(session_id.to_string(), notes.to_string());
        Ok(())
    }
}
