//! Draft repository implementation

use crate::error::Result;
use crate::models::DraftRecord;
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for draft storage operations
pub trait DraftRepository {
    /// Insert or overwrite the draft stored under `record.form_key`
    fn upsert(&self, record: &DraftRecord) -> Result<()>;

    /// Get the draft stored under `key`
    fn get(&self, key: &str) -> Result<Option<DraftRecord>>;

    /// List all drafts, most recently saved first
    fn list(&self) -> Result<Vec<DraftRecord>>;

    /// Delete the draft stored under `key`; deleting a missing key is not an error
    fn delete(&self, key: &str) -> Result<()>;
}

/// `SQLite` implementation of `DraftRepository`
pub struct SqliteDraftRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteDraftRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, i64)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }

    fn into_record((form_key, payload, saved_at): (String, String, i64)) -> Result<DraftRecord> {
        Ok(DraftRecord {
            form_key,
            payload: serde_json::from_str(&payload)?,
            saved_at,
        })
    }
}

impl DraftRepository for SqliteDraftRepository<'_> {
    fn upsert(&self, record: &DraftRecord) -> Result<()> {
        let payload = serde_json::to_string(&record.payload)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO drafts (key, payload, saved_at) VALUES (?, ?, ?)",
            params![record.form_key, payload, record.saved_at],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<DraftRecord>> {
        self.conn
            .query_row(
                "SELECT key, payload, saved_at FROM drafts WHERE key = ?",
                params![key],
                Self::parse_row,
            )
            .optional()?
            .map(Self::into_record)
            .transpose()
    }

    fn list(&self) -> Result<Vec<DraftRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, payload, saved_at FROM drafts ORDER BY saved_at DESC")?;
        let rows = stmt.query_map([], Self::parse_row)?;

        let mut drafts = Vec::new();
        for row in rows {
            drafts.push(Self::into_record(row?)?);
        }
        Ok(drafts)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM drafts WHERE key = ?", params![key])?;
        Ok(())
    }
}
