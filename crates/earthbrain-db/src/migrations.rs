use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::{UNIQUE_FIELDS, unique_index_name};

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (records)");
        conn.execute_batch(
            "
            CREATE TABLE records (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                collection  TEXT NOT NULL,
                id          TEXT NOT NULL,
                fields      TEXT NOT NULL CHECK (json_valid(fields)),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(collection, id)
            );

            CREATE INDEX idx_records_collection
                ON records(collection, seq);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (unique fields)");
        let tx = conn.unchecked_transaction()?;
        for &(collection, field) in UNIQUE_FIELDS {
            tx.execute_batch(&format!(
                "CREATE UNIQUE INDEX {index}
                    ON records(json_extract(fields, '$.{field}'))
                    WHERE collection = '{collection}';",
                index = unique_index_name(collection, field),
                collection = collection.name(),
            ))?;
        }
        tx.execute("INSERT INTO schema_version (version) VALUES (2)", [])?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}
