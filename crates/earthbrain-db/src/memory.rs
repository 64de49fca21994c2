use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value;
use uuid::Uuid;

use earthbrain_types::record::{Collection, Direction, Fields, Record};

use crate::{DuplicateRecord, RecordStore, UNIQUE_FIELDS, check_field};

/// In-memory record store. Mirrors the ordering and merge rules of the
/// SQLite store so it can stand in for it in tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collections<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut HashMap<Collection, Vec<Record>>) -> T,
    {
        let mut guard = self
            .collections
            .lock()
            .map_err(|e| anyhow::anyhow!("Store lock poisoned: {}", e))?;
        Ok(f(&mut guard))
    }
}

impl RecordStore for MemoryStore {
    fn create_record(&self, collection: Collection, fields: Fields) -> Result<Record> {
        let record = Record {
            id: Uuid::new_v4().to_string(),
            fields,
        };
        self.with_collections(|c| {
            let records = c.entry(collection).or_default();
            if let Some(dup) = duplicate_field(collection, records, &record.fields) {
                return Err(anyhow::Error::new(dup));
            }
            records.push(record.clone());
            Ok(())
        })??;
        Ok(record)
    }

    fn get_record(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        self.with_collections(|c| {
            c.get(&collection)
                .and_then(|records| records.iter().find(|r| r.id == id).cloned())
        })
    }

    fn query_ordered(
        &self,
        collection: Collection,
        field: &str,
        direction: Direction,
    ) -> Result<Vec<Record>> {
        check_field(field)?;
        let mut records = self.with_collections(|c| c.get(&collection).cloned().unwrap_or_default())?;

        // Stable sort keeps insertion order for ties; reversing afterwards
        // flips ties too, matching `ORDER BY field DESC, seq DESC`.
        records.sort_by(|a, b| compare_values(a.fields.get(field), b.fields.get(field)));
        if direction == Direction::Descending {
            records.reverse();
        }
        Ok(records)
    }

    fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<Record>> {
        check_field(field)?;
        self.with_collections(|c| {
            c.get(&collection)
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| r.fields.get(field).and_then(Value::as_str) == Some(value))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    fn update_fields(&self, collection: Collection, id: &str, patch: Fields) -> Result<bool> {
        self.with_collections(|c| {
            let Some(record) = c
                .get_mut(&collection)
                .and_then(|records| records.iter_mut().find(|r| r.id == id))
            else {
                return false;
            };
            merge_patch(&mut record.fields, patch);
            true
        })
    }

    fn delete_record(&self, collection: Collection, id: &str) -> Result<bool> {
        self.with_collections(|c| {
            let Some(records) = c.get_mut(&collection) else {
                return false;
            };
            let before = records.len();
            records.retain(|r| r.id != id);
            records.len() != before
        })
    }

    fn clear_collection(&self, collection: Collection) -> Result<usize> {
        self.with_collections(|c| c.remove(&collection).map(|r| r.len()).unwrap_or(0))
    }
}

fn duplicate_field(
    collection: Collection,
    existing: &[Record],
    fields: &Fields,
) -> Option<DuplicateRecord> {
    UNIQUE_FIELDS
        .iter()
        .filter(|&&(c, _)| c == collection)
        .find(|&&(_, field)| {
            // NULL never collides, matching SQLite unique indexes
            fields.get(field).is_some_and(|value| {
                !value.is_null() && existing.iter().any(|r| r.fields.get(field) == Some(value))
            })
        })
        .map(|&(collection, field)| DuplicateRecord { collection, field })
}

/// RFC 7396 merge: `null` removes a key, objects merge recursively,
/// anything else replaces.
fn merge_patch(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(inner) => {
                let entry = target
                    .entry(key)
                    .or_insert_with(|| Value::Object(Fields::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Fields::new());
                }
                if let Value::Object(existing) = entry {
                    merge_patch(existing, inner);
                }
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}

/// SQLite ordering of `json_extract` results: NULL, then numbers (booleans
/// read as 0/1), then text, then nested JSON as text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    fn number(v: &Value) -> f64 {
        match v {
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    match (rank(a), rank(b)) {
        (ra, rb) if ra != rb => ra.cmp(&rb),
        (1, _) => {
            let (x, y) = (a.map(number).unwrap_or(0.0), b.map(number).unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (2, _) => {
            let x = a.and_then(Value::as_str).unwrap_or_default();
            let y = b.and_then(Value::as_str).unwrap_or_default();
            x.cmp(y)
        }
        (3, _) => {
            let x = a.map(Value::to_string).unwrap_or_default();
            let y = b.map(Value::to_string).unwrap_or_default();
            x.cmp(&y)
        }
        _ => Ordering::Equal,
    }
}
