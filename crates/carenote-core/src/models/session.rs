//! Clinical session (appointment) model

use serde::{Deserialize, Serialize};

/// Clinical appointment record
///
/// Only `notes` is written by the autosave path; every other field is
/// owned by the regular create/update flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub patient_id: String,
    pub owner_id: String,
    /// Scheduled start, as sent by the server (ISO 8601)
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SessionRecord {
    /// Note text, empty when none was written yet
    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_parses_without_notes() {
        let session: SessionRecord = serde_json::from_str(
            r#"{"id": "s-1", "patientId": "p-1", "ownerId": "u-1", "notes": null}"#,
        )
        .unwrap();
        assert_eq!(session.notes_text(), "");
        assert_eq!(session.patient_id, "p-1");
    }
}
