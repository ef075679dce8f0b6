//! Client configuration.
//!
//! Provides a unified `ClientConfig` read from a JSON file and overridden
//! by environment variables, used by the sync engines and the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const CONFIG_FILE: &str = "config.json";
const DRAFTS_DB_FILE: &str = "drafts.db";

pub const ENV_API_URL: &str = "CARENOTE_API_URL";
pub const ENV_TOKEN: &str = "CARENOTE_TOKEN";
pub const ENV_DATA_DIR: &str = "CARENOTE_DATA_DIR";

/// Quiet interval before an autosave write
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 2_000;
/// Notification refresh interval
pub const DEFAULT_NOTIFICATION_POLL_MS: u64 = 30_000;
/// Lifetime of a user-visible notice
pub const DEFAULT_NOTICE_TTL_MS: u64 = 4_000;
pub const DEFAULT_NOTIFICATION_PAGE_SIZE: u32 = 20;

/// Runtime configuration of the client core.
///
/// The access token is a bearer token handed over by the host application;
/// it is never written back to disk by this crate.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,
    #[serde(default = "default_notification_poll_ms")]
    pub notification_poll_ms: u64,
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
    #[serde(default = "default_notification_page_size")]
    pub notification_page_size: u32,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("autosave_debounce_ms", &self.autosave_debounce_ms)
            .field("notification_poll_ms", &self.notification_poll_ms)
            .field("notice_ttl_ms", &self.notice_ttl_ms)
            .field("notification_page_size", &self.notification_page_size)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            access_token: None,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            notification_poll_ms: DEFAULT_NOTIFICATION_POLL_MS,
            notice_ttl_ms: DEFAULT_NOTICE_TTL_MS,
            notification_page_size: DEFAULT_NOTIFICATION_PAGE_SIZE,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load the config file (if present) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);
        let config = Self::load_from_path(&path)?;
        config.with_overrides(|key| std::env::var(key).ok()).validated()
    }

    /// Parse a config file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|error| Error::Config(format!("invalid config {}: {error}", path.display())))
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = normalize_text_option(lookup(ENV_TOKEN)) {
            self.access_token = Some(token);
        }
        if let Some(dir) = normalize_text_option(lookup(ENV_DATA_DIR)) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Normalize values and reject unusable ones.
    pub fn validated(mut self) -> Result<Self> {
        self.api_base_url = match normalize_text_option(self.api_base_url.take()) {
            Some(url) if is_http_url(&url) => Some(url.trim_end_matches('/').to_string()),
            Some(_) => {
                return Err(Error::Config(
                    "api_base_url must include http:// or https://".to_string(),
                ))
            }
            None => None,
        };
        self.access_token = normalize_text_option(self.access_token.take());

        if self.autosave_debounce_ms == 0 {
            return Err(Error::Config(
                "autosave_debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.notification_poll_ms == 0 {
            return Err(Error::Config(
                "notification_poll_ms must be greater than zero".to_string(),
            ));
        }
        if self.notification_page_size == 0 {
            return Err(Error::Config(
                "notification_page_size must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// Base URL of the REST backend, required by the HTTP client.
    pub fn require_api_base_url(&self) -> Result<&str> {
        self.api_base_url.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "api_base_url is not configured (set it in {CONFIG_FILE} or {ENV_API_URL})"
            ))
        })
    }

    pub const fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub const fn notification_poll_interval(&self) -> Duration {
        Duration::from_millis(self.notification_poll_ms)
    }

    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    /// Directory holding the draft database.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn drafts_db_path(&self) -> PathBuf {
        self.data_dir().join(DRAFTS_DB_FILE)
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("carenote")
}

pub fn default_config_path() -> PathBuf {
    default_data_dir().join(CONFIG_FILE)
}

const fn default_autosave_debounce_ms() -> u64 {
    DEFAULT_AUTOSAVE_DEBOUNCE_MS
}

const fn default_notification_poll_ms() -> u64 {
    DEFAULT_NOTIFICATION_POLL_MS
}

const fn default_notice_ttl_ms() -> u64 {
    DEFAULT_NOTICE_TTL_MS
}

const fn default_notification_page_size() -> u32 {
    DEFAULT_NOTIFICATION_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let config = ClientConfig::load_from_path(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.autosave_debounce(), Duration::from_millis(2_000));
        assert_eq!(
            config.notification_poll_interval(),
            Duration::from_millis(30_000)
        );
        assert_eq!(config.notice_ttl(), Duration::from_millis(4_000));
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"api_base_url": "https://api.test", "theme": "dark"}"#)
            .unwrap();

        let error = ClientConfig::load_from_path(&path).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = ClientConfig {
            api_base_url: Some("https://file.example.com".to_string()),
            ..ClientConfig::default()
        }
        .with_overrides(|key| match key {
            ENV_API_URL => Some(" https://env.example.com/ ".to_string()),
            ENV_TOKEN => Some("token-123".to_string()),
            _ => None,
        })
        .validated()
        .unwrap();

        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://env.example.com")
        );
        assert_eq!(config.access_token.as_deref(), Some("token-123"));
    }

    #[test]
    fn validated_rejects_bad_values() {
        let bad_url = ClientConfig {
            api_base_url: Some("api.example.com".to_string()),
            ..ClientConfig::default()
        };
        assert!(bad_url.validated().is_err());

        let zero_debounce = ClientConfig {
            autosave_debounce_ms: 0,
            ..ClientConfig::default()
        };
        assert!(zero_debounce.validated().is_err());
    }

    #[test]
    fn debug_redacts_access_token() {
        let config = ClientConfig {
            access_token: Some("secret".to_string()),
            ..ClientConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn drafts_db_lives_in_data_dir() {
        let config = ClientConfig {
            data_dir: Some(PathBuf::from("/tmp/carenote-test")),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.drafts_db_path(),
            PathBuf::from("/tmp/carenote-test/drafts.db")
        );
    }
}
