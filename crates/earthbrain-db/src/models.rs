use anyhow::{Context, Result};
use serde_json::Value;

use earthbrain_types::record::Record;

/// A row of the `records` table. `fields` is the raw JSON text.
pub struct RecordRow {
    pub id: String,
    pub fields: String,
}

impl RecordRow {
    pub fn into_record(self) -> Result<Record> {
        let value: Value = serde_json::from_str(&self.fields)
            .with_context(|| format!("Corrupt JSON in record {}", self.id))?;
        match value {
            Value::Object(fields) => Ok(Record {
                id: self.id,
                fields,
            }),
            _ => Err(anyhow::anyhow!("Record {} is not a JSON object", self.id)),
        }
    }
}
