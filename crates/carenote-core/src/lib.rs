//! carenote-core - Client-side draft persistence and reconciliation
//!
//! This crate keeps clinical note and form edits safe across network loss:
//! a local draft store, a debounced autosave engine, the form lifecycle
//! controller, optimistic collections and the notification poller used by
//! every carenote interface.

pub mod api;
pub mod autosave;
pub mod collection;
pub mod config;
pub mod db;
pub mod drafts;
pub mod error;
pub mod feedback;
pub mod forms;
pub mod models;
pub mod notifications;
pub mod sessions;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use state::{FormState, SyncStatus};
