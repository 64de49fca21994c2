use serde::Serialize;

use crate::models::{Attendance, Rsvp};

/// Head counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RsvpSummary {
    /// Expected attendees across every response that is not a decline.
    pub total_guests: u32,
    /// Attendees of the memorial service (`memorial` or `both`).
    pub service_count: u32,
    /// Attendees of the reception (`celebration` or `both`).
    pub reception_count: u32,
    pub submissions: u32,
    pub declined: u32,
}

impl RsvpSummary {
    pub fn add(&mut self, rsvp: &Rsvp) {
        self.submissions += 1;

        if rsvp.attending == Attendance::No {
            self.declined += 1;
            return;
        }

        let party = rsvp.party_size();
        self.total_guests += party;
        if rsvp.attending.attends_service() {
            self.service_count += party;
        }
        if rsvp.attending.attends_reception() {
            self.reception_count += party;
        }
    }
}

/// Fold a set of responses into dashboard counts. Order does not matter.
pub fn summarize<'a>(rsvps: impl IntoIterator<Item = &'a Rsvp>) -> RsvpSummary {
    rsvps.into_iter().fold(RsvpSummary::default(), |mut acc, rsvp| {
        acc.add(rsvp);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::ModerationStatus;

    fn rsvp(attending: Attendance, guests: u32) -> Rsvp {
        Rsvp {
            id: String::new(),
            name: "Guest".into(),
            email: "guest@example.org".into(),
            attending,
            guests,
            message: String::new(),
            timestamp: chrono::Utc::now(),
            status: ModerationStatus::Pending,
        }
    }

    #[test]
    fn mixed_responses() {
        let records = vec![
            rsvp(Attendance::Both, 2),
            rsvp(Attendance::Memorial, 1),
            rsvp(Attendance::No, 5),
        ];

        let summary = summarize(&records);
        assert_eq!(summary.total_guests, 3);
        assert_eq!(summary.service_count, 3);
        assert_eq!(summary.reception_count, 2);
        assert_eq!(summary.submissions, 3);
        assert_eq!(summary.declined, 1);
    }

    #[test]
    fn zero_guests_defaults_to_one() {
        let records = vec![rsvp(Attendance::Celebration, 0)];
        let summary = summarize(&records);
        assert_eq!(summary.total_guests, 1);
        assert_eq!(summary.service_count, 0);
        assert_eq!(summary.reception_count, 1);
    }

    #[test]
    fn order_independent() {
        let mut records = vec![
            rsvp(Attendance::Celebration, 4),
            rsvp(Attendance::Both, 3),
            rsvp(Attendance::No, 2),
            rsvp(Attendance::Memorial, 0),
        ];
        let forward = summarize(&records);
        records.reverse();
        assert_eq!(forward, summarize(&records));
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(summarize(&Vec::<Rsvp>::new()), RsvpSummary::default());
    }
}
