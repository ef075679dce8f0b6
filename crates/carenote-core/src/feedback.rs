//! User-visible notices.
//!
//! Replaces an ambient feedback provider with an explicit container that the
//! root scope creates and hands to every consumer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::DEFAULT_NOTICE_TTL_MS;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
struct Board {
    next_id: u64,
    notices: Vec<Notice>,
}

/// Timed, dismissible notices shared between producers and the UI.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    board: Arc<Mutex<Board>>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_NOTICE_TTL_MS))
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            board: Arc::new(Mutex::new(Board::default())),
        }
    }

    /// How long a notice stays visible.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(&self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        board.next_id += 1;
        let id = board.next_id;
        let notice = Notice {
            id,
            kind,
            message: message.into(),
            expires_at: Instant::now() + self.ttl,
        };
        tracing::debug!("Notice {id} ({kind:?}): {}", notice.message);
        board.notices.push(notice);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeKind::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeKind::Warning, message)
    }

    /// Push an error notice carrying the message extracted from `error`.
    pub fn error(&self, error: &Error) -> u64 {
        self.push(NoticeKind::Error, error.user_message())
    }

    /// Dismiss a notice before it expires. Returns whether it was still shown.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let before = board.notices.len();
        board.notices.retain(|notice| notice.id != id);
        board.notices.len() != before
    }

    /// Notices that have not expired yet, oldest first. Expired ones are dropped.
    pub fn active(&self) -> Vec<Notice> {
        let now = Instant::now();
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        board.notices.retain(|notice| notice.expires_at > now);
        board.notices.clone()
    }

    pub fn clear(&self) {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        board.notices.clear();
    }
}
