//! Local database layer for carenote drafts

mod connection;
mod draft_repository;
mod migrations;

pub use connection::Database;
pub use draft_repository::{DraftRepository, SqliteDraftRepository};
