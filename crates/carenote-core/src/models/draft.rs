//! Draft record model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::unix_millis_now;

/// Last unsynced payload of a form, kept on this device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    /// Namespaced storage key (`draft_<formType>`)
    pub form_key: String,
    /// Opaque JSON payload as last edited
    pub payload: Value,
    /// Local save timestamp (Unix ms)
    pub saved_at: i64,
}

impl DraftRecord {
    /// Create a record stamped with the current time
    #[must_use]
    pub fn new(form_key: impl Into<String>, payload: Value) -> Self {
        Self {
            form_key: form_key.into(),
            payload,
            saved_at: unix_millis_now(),
        }
    }
}
