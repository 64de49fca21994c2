use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

use earthbrain_types::record::{Collection, Direction, Fields, Record};

use crate::models::RecordRow;
use crate::{
    Database, DuplicateRecord, RecordStore, UNIQUE_FIELDS, check_field, unique_index_name,
};

impl RecordStore for Database {
    fn create_record(&self, collection: Collection, fields: Fields) -> Result<Record> {
        let id = Uuid::new_v4().to_string();
        let json = serde_json::to_string(&Value::Object(fields.clone()))?;

        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO records (collection, id, fields) VALUES (?1, ?2, ?3)",
                (collection.name(), &id, &json),
            );
            match inserted {
                Ok(_) => Ok(()),
                Err(e) => Err(duplicate_field(collection, &e)
                    .map(anyhow::Error::new)
                    .unwrap_or_else(|| e.into())),
            }
        })?;

        Ok(Record { id, fields })
    }

    fn get_record(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let row = self.with_conn(|conn| query_record(conn, collection, id))?;
        row.map(RecordRow::into_record).transpose()
    }

    fn query_ordered(
        &self,
        collection: Collection,
        field: &str,
        direction: Direction,
    ) -> Result<Vec<Record>> {
        check_field(field)?;
        let order = match direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        let sql = format!(
            "SELECT id, fields FROM records
             WHERE collection = ?1
             ORDER BY json_extract(fields, ?2) {order}, seq {order}"
        );
        let path = format!("$.{}", field);

        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((collection.name(), &path), |row| {
                    Ok(RecordRow {
                        id: row.get(0)?,
                        fields: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<Record>> {
        check_field(field)?;
        let path = format!("$.{}", field);

        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, fields FROM records
                 WHERE collection = ?1
                   AND json_type(fields, ?2) = 'text'
                   AND json_extract(fields, ?2) = ?3
                 ORDER BY seq ASC",
            )?;
            let rows = stmt
                .query_map((collection.name(), &path, value), |row| {
                    Ok(RecordRow {
                        id: row.get(0)?,
                        fields: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    fn update_fields(&self, collection: Collection, id: &str, patch: Fields) -> Result<bool> {
        let json = serde_json::to_string(&Value::Object(patch))?;

        let changed = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE records SET fields = json_patch(fields, ?3)
                 WHERE collection = ?1 AND id = ?2",
                (collection.name(), id, &json),
            )?;
            Ok(n)
        })?;

        Ok(changed > 0)
    }

    fn delete_record(&self, collection: Collection, id: &str) -> Result<bool> {
        let deleted = self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                (collection.name(), id),
            )?;
            Ok(n)
        })?;

        Ok(deleted > 0)
    }

    fn clear_collection(&self, collection: Collection) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM records WHERE collection = ?1",
                [collection.name()],
            )?;
            Ok(n)
        })
    }
}

/// Which unique field, if any, an insert failure collided on.
fn duplicate_field(collection: Collection, err: &rusqlite::Error) -> Option<DuplicateRecord> {
    let rusqlite::Error::SqliteFailure(failure, Some(message)) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }
    UNIQUE_FIELDS
        .iter()
        .find(|&&(c, field)| c == collection && message.contains(&unique_index_name(c, field)))
        .map(|&(collection, field)| DuplicateRecord { collection, field })
}

fn query_record(conn: &Connection, collection: Collection, id: &str) -> Result<Option<RecordRow>> {
    let mut stmt =
        conn.prepare("SELECT id, fields FROM records WHERE collection = ?1 AND id = ?2")?;

    let row = stmt
        .query_row((collection.name(), id), |row| {
            Ok(RecordRow {
                id: row.get(0)?,
                fields: row.get(1)?,
            })
        })
        .optional()?;

    Ok(row)
}
