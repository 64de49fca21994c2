use serde::Serialize;

use crate::models::Rsvp;
use crate::moderation::Moderated;

const DEFAULT_MESSAGE: &str = "Joining in celebration.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestbookEntry {
    pub id: String,
    pub name: String,
    pub date: String,
    pub message: String,
}

/// Shown on the memorial page until the first RSVP is published.
pub fn fallback_entries() -> Vec<GuestbookEntry> {
    [
        (
            "g1",
            "Mandeep S.",
            "Jan 15, 2026",
            "Your vision for the Earth gave us all a higher purpose. Your voice is eternal.",
        ),
        (
            "g2",
            "Elena R.",
            "Jan 18, 2026",
            "The way she spoke about water changed my entire approach to humanitarian work.",
        ),
        (
            "g3",
            "Julian T.",
            "Jan 20, 2026",
            "A true visionary. Her critique of modern agriculture is the most profound I have encountered.",
        ),
    ]
    .into_iter()
    .map(|(id, name, date, message)| GuestbookEntry {
        id: id.into(),
        name: name.into(),
        date: date.into(),
        message: message.into(),
    })
    .collect()
}

impl From<&Rsvp> for GuestbookEntry {
    fn from(rsvp: &Rsvp) -> Self {
        let message = if rsvp.message.trim().is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            rsvp.message.clone()
        };

        Self {
            id: rsvp.id.clone(),
            name: rsvp.name.clone(),
            date: rsvp.timestamp.format("%b %-d, %Y").to_string(),
            message,
        }
    }
}

/// Project published RSVPs into guestbook entries, keeping the input order.
/// Falls back to the static list only when nothing is published.
pub fn guestbook(rsvps: &[Rsvp]) -> Vec<GuestbookEntry> {
    let entries: Vec<GuestbookEntry> = rsvps
        .iter()
        .filter(|r| r.is_public())
        .map(GuestbookEntry::from)
        .collect();

    if entries.is_empty() {
        fallback_entries()
    } else {
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attendance;
    use crate::moderation::ModerationStatus;

    fn rsvp(id: &str, status: ModerationStatus, message: &str) -> Rsvp {
        Rsvp {
            id: id.into(),
            name: "Priya".into(),
            email: "priya@example.org".into(),
            attending: Attendance::Both,
            guests: 1,
            message: message.into(),
            timestamp: "2026-02-03T18:30:00Z".parse().unwrap(),
            status,
        }
    }

    #[test]
    fn falls_back_when_nothing_published() {
        let rsvps = vec![rsvp("a", ModerationStatus::Pending, "hi")];
        assert_eq!(guestbook(&rsvps), fallback_entries());
        assert_eq!(guestbook(&[]), fallback_entries());
    }

    #[test]
    fn prefers_a_single_published_entry() {
        let rsvps = vec![
            rsvp("a", ModerationStatus::Pending, "hidden"),
            rsvp("b", ModerationStatus::Published, "With love."),
        ];

        let entries = guestbook(&rsvps);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "b");
        assert_eq!(entries[0].date, "Feb 3, 2026");
        assert_eq!(entries[0].message, "With love.");
    }

    #[test]
    fn empty_message_gets_default() {
        let rsvps = vec![rsvp("a", ModerationStatus::Published, "  ")];
        assert_eq!(guestbook(&rsvps)[0].message, DEFAULT_MESSAGE);
    }
}
