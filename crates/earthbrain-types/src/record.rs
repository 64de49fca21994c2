use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::moderation::ModerationStatus;

/// A JSON document as held by the record store.
pub type Fields = Map<String, Value>;

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Rsvps,
    Memories,
    Charities,
    CharitySuggestions,
    Posts,
    Visits,
    Accounts,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Rsvps,
        Collection::Memories,
        Collection::Charities,
        Collection::CharitySuggestions,
        Collection::Posts,
        Collection::Visits,
        Collection::Accounts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rsvps => "rsvps",
            Self::Memories => "memories",
            Self::Charities => "charities",
            Self::CharitySuggestions => "charity_suggestions",
            Self::Posts => "posts",
            Self::Visits => "visits",
            Self::Accounts => "accounts",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A stored document together with its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    /// Decode the document into a typed model. The record id is injected as
    /// the `id` field, and documents written before the `status` field existed
    /// are read through their legacy `approved` flag.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".into(), Value::String(self.id.clone()));

        if !fields.contains_key("status") {
            if let Some(Value::Bool(approved)) = fields.get("approved") {
                let status = ModerationStatus::from_approved(*approved);
                fields.insert("status".into(), Value::String(status.as_str().into()));
            }
        }

        serde_json::from_value(Value::Object(fields))
    }
}

/// Encode a model as store fields. The `id` field is dropped (the store owns
/// ids) and a `status` field gets its derived `approved` flag alongside.
pub fn to_fields<T: Serialize>(model: &T) -> serde_json::Result<Fields> {
    let mut fields = match serde_json::to_value(model)? {
        Value::Object(map) => map,
        other => {
            return Err(serde::ser::Error::custom(format!(
                "expected a JSON object, got {other}"
            )));
        }
    };
    fields.remove("id");

    let approved = fields
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s == ModerationStatus::Published.as_str());
    if let Some(approved) = approved {
        fields.insert("approved".into(), Value::Bool(approved));
    }

    Ok(fields)
}
