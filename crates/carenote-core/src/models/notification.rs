//! Notification model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server identifier of a notification
pub type NotificationId = i64;

/// A notification as listed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: NotificationId,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Fields this client does not interpret, kept as sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationItem {
    pub fn new(id: NotificationId, read: bool) -> Self {
        Self {
            id,
            read,
            title: None,
            message: None,
            created_at: None,
            extra: Map::new(),
        }
    }
}

/// Pagination metadata returned next to a page of notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

/// One page of notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationPage {
    #[serde(default)]
    pub items: Vec<NotificationItem>,
    #[serde(default)]
    pub meta: PageMeta,
}
