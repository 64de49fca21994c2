use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::moderation::{ModerationStatus, Moderated};

/// Which parts of the memorial a guest will attend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    /// Memorial service only.
    Memorial,
    /// Reception only.
    Celebration,
    Both,
    No,
}

impl Attendance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memorial => "memorial",
            Self::Celebration => "celebration",
            Self::Both => "both",
            Self::No => "no",
        }
    }

    pub fn attends_service(self) -> bool {
        matches!(self, Self::Memorial | Self::Both)
    }

    pub fn attends_reception(self) -> bool {
        matches!(self, Self::Celebration | Self::Both)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rsvp {
    pub id: String,
    pub name: String,
    pub email: String,
    pub attending: Attendance,
    #[serde(default)]
    pub guests: u32,
    #[serde(default)]
    pub message: String,
    #[serde(serialize_with = "fixed_width")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: ModerationStatus,
}

impl Rsvp {
    /// Number of people this response stands for. A missing or zero guest
    /// count still counts the person who replied.
    pub fn party_size(&self) -> u32 {
        if self.guests == 0 { 1 } else { self.guests }
    }
}

impl Moderated for Rsvp {
    fn status(&self) -> ModerationStatus {
        self.status
    }
}

/// A free-text testimonial submitted from the biography page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub name: String,
    pub memory: String,
    #[serde(serialize_with = "fixed_width")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: ModerationStatus,
}

impl Moderated for Memory {
    fn status(&self) -> ModerationStatus {
        self.status
    }
}

/// A photo post on the members' community wall. The image is stored inline
/// as a JPEG data URL. Wall documents written by the old client used
/// camelCase keys, which are still accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(alias = "userName")]
    pub user_name: String,
    #[serde(default, alias = "userPhoto")]
    pub user_photo: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(serialize_with = "fixed_width")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: ModerationStatus,
}

impl Moderated for Post {
    fn status(&self) -> ModerationStatus {
        self.status
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charity {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharitySuggestion {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub reason: String,
    #[serde(serialize_with = "fixed_width")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub path: String,
    pub session: String,
    #[serde(serialize_with = "fixed_width")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub password_hash: String,
    pub role: Role,
    #[serde(serialize_with = "fixed_width")]
    pub timestamp: DateTime<Utc>,
}

/// Timestamps are stored as fixed-width RFC 3339 so the store can order
/// documents by comparing the text.
fn fixed_width<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_flags() {
        assert!(Attendance::Both.attends_service());
        assert!(Attendance::Both.attends_reception());
        assert!(Attendance::Memorial.attends_service());
        assert!(!Attendance::Memorial.attends_reception());
        assert!(!Attendance::Celebration.attends_service());
        assert!(!Attendance::No.attends_service());
        assert!(!Attendance::No.attends_reception());
    }

    #[test]
    fn rsvp_without_guests_counts_as_one() {
        let rsvp: Rsvp = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "Sam",
            "email": "sam@example.org",
            "attending": "both",
            "timestamp": "2026-01-20T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(rsvp.guests, 0);
        assert_eq!(rsvp.party_size(), 1);
        assert_eq!(rsvp.status, ModerationStatus::Pending);
    }

    #[test]
    fn timestamps_sort_as_text() {
        let whole: DateTime<Utc> = "2026-01-20T10:00:00Z".parse().unwrap();
        let later: DateTime<Utc> = "2026-01-20T10:00:00.5Z".parse().unwrap();
        let visit = |timestamp| Visit {
            id: String::new(),
            path: "/".into(),
            session: "s".into(),
            timestamp,
        };

        let a = serde_json::to_value(visit(whole)).unwrap();
        let b = serde_json::to_value(visit(later)).unwrap();
        assert_eq!(a["timestamp"], "2026-01-20T10:00:00.000000Z");
        assert!(a["timestamp"].as_str() < b["timestamp"].as_str());
    }
}
