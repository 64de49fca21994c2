use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Fields;

/// Visibility of a user-submitted item.
///
/// Items start out `Pending` and only become visible on public pages once an
/// admin publishes them. Rejecting an item deletes it, so there is no
/// separate rejected state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Published,
}

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
        }
    }

    pub fn from_approved(approved: bool) -> Self {
        if approved { Self::Published } else { Self::Pending }
    }

    pub fn is_public(self) -> bool {
        self == Self::Published
    }

    /// Field patch that moves a stored document into this state.
    pub fn patch(self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("status".into(), Value::String(self.as_str().into()));
        fields.insert("approved".into(), Value::Bool(self.is_public()));
        fields
    }
}

/// Implemented by every model that goes through moderation.
pub trait Moderated {
    fn status(&self) -> ModerationStatus;

    fn is_public(&self) -> bool {
        self.status().is_public()
    }
}

/// Keep only the items visible on public pages, preserving order.
pub fn public_only<T: Moderated>(items: Vec<T>) -> Vec<T> {
    items.into_iter().filter(Moderated::is_public).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_carries_status_and_flag() {
        let patch = ModerationStatus::Published.patch();
        assert_eq!(patch["status"], "published");
        assert_eq!(patch["approved"], true);

        let patch = ModerationStatus::Pending.patch();
        assert_eq!(patch["status"], "pending");
        assert_eq!(patch["approved"], false);
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&ModerationStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
        let parsed: ModerationStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, ModerationStatus::Pending);
    }
}
