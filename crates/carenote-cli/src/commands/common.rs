use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use carenote_core::api::HttpClinicApi;
use carenote_core::config::ClientConfig;
use carenote_core::drafts::{SqliteDraftStore, DRAFT_KEY_PREFIX};
use carenote_core::feedback::NoticeBoard;
use carenote_core::models::{DraftRecord, NotificationItem};
use carenote_core::util::{compact_text, unix_millis_now};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct DraftListItem {
    pub key: String,
    pub form_type: String,
    pub saved_at: i64,
    pub saved_at_iso: String,
    pub relative_time: String,
    pub preview: String,
}

/// Load the config file plus environment, then apply the `--data-dir` flag.
pub fn load_config(
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::load(config_path)?;
    if let Some(data_dir) = data_dir {
        config.data_dir = Some(data_dir);
    }
    Ok(config)
}

pub fn open_draft_store(config: &ClientConfig) -> Result<SqliteDraftStore, CliError> {
    let path = config.drafts_db_path();
    tracing::debug!("Opening draft store at {}", path.display());
    Ok(SqliteDraftStore::open(path)?)
}

/// Notices shown by interactive commands expire after the configured TTL.
pub fn notice_board(config: &ClientConfig) -> NoticeBoard {
    NoticeBoard::new(config.notice_ttl())
}

pub fn build_api(config: &ClientConfig) -> Result<Arc<HttpClinicApi>, CliError> {
    if config.api_base_url.is_none() {
        return Err(CliError::ApiNotConfigured);
    }
    Ok(Arc::new(HttpClinicApi::from_config(config)?))
}

pub fn form_type_of(key: &str) -> &str {
    key.strip_prefix(DRAFT_KEY_PREFIX).unwrap_or(key)
}

pub fn draft_to_item(draft: &DraftRecord, now_ms: i64) -> DraftListItem {
    DraftListItem {
        key: draft.form_key.clone(),
        form_type: form_type_of(&draft.form_key).to_string(),
        saved_at: draft.saved_at,
        saved_at_iso: format_timestamp(draft.saved_at),
        relative_time: format_relative_time(draft.saved_at, now_ms),
        preview: payload_preview(&draft.payload, 60),
    }
}

pub fn format_draft_lines(drafts: &[DraftRecord]) -> Vec<String> {
    let now_ms = unix_millis_now();
    drafts
        .iter()
        .map(|draft| {
            let item = draft_to_item(draft, now_ms);
            format!(
                "{:<24} {:<10} {}",
                item.form_type, item.relative_time, item.preview
            )
        })
        .collect()
}

pub fn format_notification_lines(items: &[NotificationItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let marker = if item.read { " " } else { "*" };
            let title = item
                .title
                .as_deref()
                .or(item.message.as_deref())
                .unwrap_or("(no title)");
            format!("{marker} {:>6}  {}", item.id, compact_text(title))
        })
        .collect()
}

/// Single-line preview of a JSON payload, truncated with an ellipsis.
pub fn payload_preview(payload: &serde_json::Value, max_chars: usize) -> String {
    let text = match payload {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let truncated: String = flattened.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{truncated}...")
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn normalize_form_type(form_type: &str) -> Result<String, CliError> {
    let trimmed = form_type.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyFormType)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}
