pub mod memory;
pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use earthbrain_types::record::{Collection, Direction, Fields, Record};
use thiserror::Error;

pub use memory::MemoryStore;

/// Top-level fields that must be unique within their collection.
pub const UNIQUE_FIELDS: &[(Collection, &str)] = &[(Collection::Accounts, "email")];

/// Returned (inside `anyhow::Error`) when a write would duplicate one of
/// the [`UNIQUE_FIELDS`].
#[derive(Debug, Error)]
#[error("a {collection} document with this {field} already exists")]
pub struct DuplicateRecord {
    pub collection: Collection,
    pub field: &'static str,
}

/// Document-store capabilities the site needs. Every page reads or writes
/// through this interface only, so the backend can be swapped for
/// [`MemoryStore`] in tests.
pub trait RecordStore: Send + Sync {
    /// Insert a new document and return it with its generated id. Fails with
    /// [`DuplicateRecord`] when a unique field is already taken.
    fn create_record(&self, collection: Collection, fields: Fields) -> Result<Record>;

    fn get_record(&self, collection: Collection, id: &str) -> Result<Option<Record>>;

    /// All documents of a collection ordered by one top-level field.
    /// Documents missing the field sort first when ascending. Ties keep
    /// insertion order in the requested direction.
    fn query_ordered(
        &self,
        collection: Collection,
        field: &str,
        direction: Direction,
    ) -> Result<Vec<Record>>;

    /// Documents whose top-level string field equals `value`, in insertion order.
    fn find_by_field(&self, collection: Collection, field: &str, value: &str)
    -> Result<Vec<Record>>;

    /// Merge `patch` into an existing document. Returns false if the id is unknown.
    fn update_fields(&self, collection: Collection, id: &str, patch: Fields) -> Result<bool>;

    /// Returns false if the id is unknown; deleting twice is not an error.
    fn delete_record(&self, collection: Collection, id: &str) -> Result<bool>;

    /// Delete every document in a collection, returning how many were removed.
    fn clear_collection(&self, collection: Collection) -> Result<usize>;
}

/// SQLite-backed record store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

/// Field names are spliced into JSON paths, so only plain identifiers are accepted.
pub(crate) fn check_field(field: &str) -> Result<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Invalid field name: {:?}", field))
    }
}

/// Name of the partial unique index that backs one of the [`UNIQUE_FIELDS`].
pub(crate) fn unique_index_name(collection: Collection, field: &str) -> String {
    format!("idx_unique_{}_{}", collection.name(), field)
}
