//! Shared state types observed by UI layers.

use std::fmt;

/// Autosave status exposed by the sync engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing has been edited yet
    Idle,
    /// An edit is waiting for the quiet interval to expire
    Pending,
    /// A remote write is in flight
    Saving,
    /// Latest payload confirmed by the server
    SyncedRemote,
    /// Remote write failed; payload kept in the local draft store
    SyncedLocal,
    /// No connectivity; the network call was skipped and the payload kept locally
    SyncedLocalOffline,
}

impl SyncStatus {
    /// Machine-readable status string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Saving => "saving",
            Self::SyncedRemote => "synced-remote",
            Self::SyncedLocal => "synced-local",
            Self::SyncedLocalOffline => "synced-local-offline",
        }
    }

    /// Short text for the editor status line.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Pending => "unsaved changes",
            Self::Saving => "saving...",
            Self::SyncedRemote => "saved",
            Self::SyncedLocal => "saved offline",
            Self::SyncedLocalOffline => "offline, saved on this device",
        }
    }

    /// Whether the latest payload only exists locally.
    pub const fn is_local_only(self) -> bool {
        matches!(self, Self::SyncedLocal | Self::SyncedLocalOffline)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a remote form instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormState {
    Empty,
    Loading,
    Loaded,
    Saving,
    Finalized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_remote_write_reads_saved_offline() {
        assert_eq!(SyncStatus::SyncedLocal.as_str(), "synced-local");
        assert_eq!(SyncStatus::SyncedLocal.label(), "saved offline");
        assert!(SyncStatus::SyncedLocalOffline.is_local_only());
        assert!(!SyncStatus::SyncedRemote.is_local_only());
    }
}
