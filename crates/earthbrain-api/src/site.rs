use std::borrow::Cow;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use earthbrain_db::{DuplicateRecord, RecordStore};
use earthbrain_media::InlineImage;
use earthbrain_types::api::{
    CharityPatch, CharityRequest, Claims, MemoryRequest, RsvpRequest, SuggestionRequest,
    VisitRequest, VisitStats,
};
use earthbrain_types::guestbook::{self, GuestbookEntry};
use earthbrain_types::models::{
    Account, Charity, CharitySuggestion, Memory, Post, Role, Rsvp, Visit,
};
use earthbrain_types::moderation::{ModerationStatus, public_only};
use earthbrain_types::record::{Collection, Direction, Fields, Record, to_fields};
use earthbrain_types::summary::{self, RsvpSummary};

use crate::error::ApiError;

/// Label given to charities that came in through the suggestion form.
pub const SUGGESTED_LABEL: &str = "Community Suggested";

const MAX_NAME_LEN: usize = 120;
const MAX_TEXT_LEN: usize = 5_000;
const MAX_PARTY: u32 = 50;
const EMAIL_TAKEN: &str = "email already registered";

/// Site operations over a record store. Handlers call these from
/// `spawn_blocking` since every store call may block.
#[derive(Clone)]
pub struct Site {
    store: Arc<dyn RecordStore>,
}

impl Site {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    // -- RSVPs --

    pub fn submit_rsvp(&self, req: RsvpRequest) -> Result<Rsvp, ApiError> {
        let guests = req.guests.unwrap_or(1);
        if guests > MAX_PARTY {
            return Err(ApiError::bad_request(format!(
                "parties are limited to {} guests",
                MAX_PARTY
            )));
        }

        let rsvp = Rsvp {
            id: String::new(),
            name: required(&req.name, "name", MAX_NAME_LEN)?,
            email: email(&req.email)?,
            attending: req.attending,
            guests,
            message: optional_text(req.message.as_deref(), "message")?,
            timestamp: Utc::now(),
            status: ModerationStatus::Pending,
        };

        let rsvp: Rsvp = self.create(Collection::Rsvps, &rsvp)?;
        info!(
            "RSVP {} received ({}, party of {})",
            rsvp.id,
            rsvp.attending.as_str(),
            rsvp.party_size()
        );
        Ok(rsvp)
    }

    /// Every RSVP, newest first.
    pub fn rsvps(&self) -> Result<Vec<Rsvp>, ApiError> {
        self.list(Collection::Rsvps, "timestamp", Direction::Descending)
    }

    pub fn guestbook(&self) -> Result<Vec<GuestbookEntry>, ApiError> {
        Ok(guestbook::guestbook(&self.rsvps()?))
    }

    pub fn rsvp_summary(&self) -> Result<RsvpSummary, ApiError> {
        Ok(summary::summarize(&self.rsvps()?))
    }

    /// Check-in sheet for the organizers, one row per RSVP, newest first.
    pub fn export_rsvps_csv(&self) -> Result<String, ApiError> {
        #[derive(Serialize)]
        struct Row<'a> {
            name: Cow<'a, str>,
            email: Cow<'a, str>,
            attending: &'a str,
            guests: u32,
            message: Cow<'a, str>,
            submitted: String,
            status: &'a str,
        }

        let rsvps = self.rsvps()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        for rsvp in &rsvps {
            writer
                .serialize(Row {
                    name: spreadsheet_safe(&rsvp.name),
                    email: spreadsheet_safe(&rsvp.email),
                    attending: rsvp.attending.as_str(),
                    guests: rsvp.party_size(),
                    message: spreadsheet_safe(&rsvp.message),
                    submitted: rsvp.timestamp.to_rfc3339(),
                    status: rsvp.status.as_str(),
                })
                .map_err(|e| anyhow!("CSV write failed: {}", e))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("CSV flush failed: {}", e))?;
        Ok(String::from_utf8(bytes).map_err(|e| anyhow!("CSV is not UTF-8: {}", e))?)
    }

    // -- Memories --

    pub fn submit_memory(&self, req: MemoryRequest) -> Result<Memory, ApiError> {
        let memory = Memory {
            id: String::new(),
            name: required(&req.name, "name", MAX_NAME_LEN)?,
            memory: required(&req.memory, "memory", MAX_TEXT_LEN)?,
            timestamp: Utc::now(),
            status: ModerationStatus::Pending,
        };

        let memory: Memory = self.create(Collection::Memories, &memory)?;
        info!("Memory {} received, awaiting review", memory.id);
        Ok(memory)
    }

    pub fn memories(&self) -> Result<Vec<Memory>, ApiError> {
        self.list(Collection::Memories, "timestamp", Direction::Descending)
    }

    pub fn public_memories(&self) -> Result<Vec<Memory>, ApiError> {
        Ok(public_only(self.memories()?))
    }

    // -- Community wall --

    pub fn submit_post(
        &self,
        author: &Claims,
        caption: &str,
        image: InlineImage,
    ) -> Result<Post, ApiError> {
        let post = Post {
            id: String::new(),
            user_id: author.sub.clone(),
            user_name: if author.name.trim().is_empty() {
                "Community Member".to_string()
            } else {
                author.name.clone()
            },
            user_photo: author.photo.clone(),
            image_url: image.data_url,
            caption: optional_text(Some(caption), "caption")?,
            timestamp: Utc::now(),
            status: ModerationStatus::Pending,
        };

        let post: Post = self.create(Collection::Posts, &post)?;
        info!(
            "Post {} by {} received ({}x{}), awaiting review",
            post.id, post.user_id, image.width, image.height
        );
        Ok(post)
    }

    pub fn posts(&self) -> Result<Vec<Post>, ApiError> {
        self.list(Collection::Posts, "timestamp", Direction::Descending)
    }

    pub fn public_posts(&self) -> Result<Vec<Post>, ApiError> {
        Ok(public_only(self.posts()?))
    }

    // -- Moderation --

    pub fn set_status(
        &self,
        collection: Collection,
        id: &str,
        status: ModerationStatus,
    ) -> Result<(), ApiError> {
        if !self.store.update_fields(collection, id, status.patch())? {
            return Err(ApiError::NotFound);
        }
        info!("{} {} is now {}", collection, id, status.as_str());
        Ok(())
    }

    /// Returns whether anything was deleted. A missing id is not an error.
    pub fn delete(&self, collection: Collection, id: &str) -> Result<bool, ApiError> {
        let deleted = self.store.delete_record(collection, id)?;
        if deleted {
            info!("Deleted {} {}", collection, id);
        } else {
            info!("Delete of {} {} was a no-op (already gone)", collection, id);
        }
        Ok(deleted)
    }

    pub fn clear(&self, collection: Collection) -> Result<usize, ApiError> {
        let n = self.store.clear_collection(collection)?;
        warn!("Cleared {} documents from {}", n, collection);
        Ok(n)
    }

    // -- Charities --

    pub fn charities(&self) -> Result<Vec<Charity>, ApiError> {
        self.list(Collection::Charities, "name", Direction::Ascending)
    }

    pub fn create_charity(&self, req: CharityRequest) -> Result<Charity, ApiError> {
        let charity = Charity {
            id: String::new(),
            name: required(&req.name, "name", MAX_NAME_LEN)?,
            url: url(&req.url)?,
            label: optional_text(Some(&req.label), "label")?,
            description: optional_text(Some(&req.description), "description")?,
        };
        let charity: Charity = self.create(Collection::Charities, &charity)?;
        info!("Charity {} ({}) added", charity.id, charity.name);
        Ok(charity)
    }

    pub fn update_charity(&self, id: &str, patch: CharityPatch) -> Result<Charity, ApiError> {
        if patch.is_empty() {
            return Err(ApiError::bad_request("nothing to update"));
        }

        let patch = CharityPatch {
            name: patch
                .name
                .as_deref()
                .map(|n| required(n, "name", MAX_NAME_LEN))
                .transpose()?,
            url: patch.url.as_deref().map(url).transpose()?,
            label: patch.label.map(|l| l.trim().to_string()),
            description: patch.description.map(|d| d.trim().to_string()),
        };

        if !self
            .store
            .update_fields(Collection::Charities, id, to_fields(&patch)?)?
        {
            return Err(ApiError::NotFound);
        }

        self.get(Collection::Charities, id)?.ok_or(ApiError::NotFound)
    }

    pub fn suggestions(&self) -> Result<Vec<CharitySuggestion>, ApiError> {
        self.list(
            Collection::CharitySuggestions,
            "timestamp",
            Direction::Descending,
        )
    }

    pub fn submit_suggestion(&self, req: SuggestionRequest) -> Result<CharitySuggestion, ApiError> {
        let suggestion = CharitySuggestion {
            id: String::new(),
            name: required(&req.name, "name", MAX_NAME_LEN)?,
            url: url(&req.url)?,
            reason: optional_text(Some(&req.reason), "reason")?,
            timestamp: Utc::now(),
        };
        let suggestion: CharitySuggestion =
            self.create(Collection::CharitySuggestions, &suggestion)?;
        info!("Charity suggestion {} ({}) received", suggestion.id, suggestion.name);
        Ok(suggestion)
    }

    /// Turn a suggestion into a listed charity and drop the suggestion.
    /// Not transactional: a crash between the two steps leaves both behind.
    pub fn approve_suggestion(&self, id: &str) -> Result<Charity, ApiError> {
        let suggestion: CharitySuggestion = self
            .get(Collection::CharitySuggestions, id)?
            .ok_or(ApiError::NotFound)?;

        let charity = Charity {
            id: String::new(),
            name: suggestion.name,
            url: suggestion.url,
            label: SUGGESTED_LABEL.to_string(),
            description: suggestion.reason,
        };
        let charity: Charity = self.create(Collection::Charities, &charity)?;
        self.store
            .delete_record(Collection::CharitySuggestions, id)?;

        info!("Suggestion {} approved as charity {}", id, charity.id);
        Ok(charity)
    }

    // -- Visits --

    /// Log a page visit once per browser session. Returns false when the
    /// session was already counted.
    pub fn record_visit(&self, req: VisitRequest) -> Result<bool, ApiError> {
        let session = req.session.trim();
        if session.is_empty() || session.len() > 128 {
            return Err(ApiError::bad_request("invalid session"));
        }
        let path = req.path.trim();
        if !path.starts_with('/') || path.len() > 256 {
            return Err(ApiError::bad_request("invalid path"));
        }

        if !self
            .store
            .find_by_field(Collection::Visits, "session", session)?
            .is_empty()
        {
            return Ok(false);
        }

        let visit = Visit {
            id: String::new(),
            path: path.to_string(),
            session: session.to_string(),
            timestamp: Utc::now(),
        };
        self.store
            .create_record(Collection::Visits, to_fields(&visit)?)?;
        Ok(true)
    }

    pub fn visit_stats(&self) -> Result<VisitStats, ApiError> {
        let visits: Vec<Visit> =
            self.list(Collection::Visits, "timestamp", Direction::Ascending)?;

        let mut stats = VisitStats::default();
        for visit in visits {
            stats.total += 1;
            *stats.by_path.entry(visit.path).or_insert(0) += 1;
        }
        Ok(stats)
    }

    // -- Accounts --

    pub fn account_by_email(&self, email_addr: &str) -> Result<Option<Account>, ApiError> {
        let email_addr = email_addr.trim().to_lowercase();
        let mut found: Vec<Account> = decode_all(
            Collection::Accounts,
            self.store
                .find_by_field(Collection::Accounts, "email", &email_addr)?,
        );
        Ok(if found.is_empty() { None } else { Some(found.remove(0)) })
    }

    pub fn create_account(
        &self,
        email_addr: &str,
        display_name: &str,
        photo_url: Option<String>,
        password_hash: String,
        role: Role,
    ) -> Result<Account, ApiError> {
        let account = Account {
            id: String::new(),
            email: email(email_addr)?,
            display_name: required(display_name, "display_name", 64)?,
            photo_url: photo_url.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            password_hash,
            role,
            timestamp: Utc::now(),
        };

        if self.account_by_email(&account.email)?.is_some() {
            return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
        }

        // A concurrent registration can pass the check above; the store's
        // unique index has the final say.
        let account: Account = self
            .create(Collection::Accounts, &account)
            .map_err(|e| match e {
                ApiError::Internal(e) if e.is::<DuplicateRecord>() => {
                    ApiError::Conflict(EMAIL_TAKEN.into())
                }
                other => other,
            })?;
        info!("Account {} created ({:?})", account.id, account.role);
        Ok(account)
    }

    pub fn update_account(
        &self,
        id: &str,
        password_hash: String,
        role: Role,
    ) -> Result<(), ApiError> {
        let mut patch = Fields::new();
        patch.insert("password_hash".into(), password_hash.into());
        patch.insert("role".into(), serde_json::to_value(role)?);
        if !self.store.update_fields(Collection::Accounts, id, patch)? {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    // -- Helpers --

    fn create<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        model: &T,
    ) -> Result<T, ApiError> {
        let record = self.store.create_record(collection, to_fields(model)?)?;
        Ok(record.decode()?)
    }

    fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>, ApiError> {
        match self.store.get_record(collection, id)? {
            Some(record) => Ok(Some(record.decode()?)),
            None => Ok(None),
        }
    }

    fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
        field: &str,
        direction: Direction,
    ) -> Result<Vec<T>, ApiError> {
        let records = self.store.query_ordered(collection, field, direction)?;
        Ok(decode_all(collection, records))
    }
}

/// Decode records, skipping (and logging) any that no longer match the model.
fn decode_all<T: DeserializeOwned>(collection: Collection, records: Vec<Record>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match record.decode() {
            Ok(model) => Some(model),
            Err(e) => {
                warn!("Skipping corrupt {} document {}: {}", collection, record.id, e);
                None
            }
        })
        .collect()
}

/// Visitor text that a spreadsheet would read as a formula is quoted with a
/// leading apostrophe.
fn spreadsheet_safe(value: &str) -> Cow<'_, str> {
    if value.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        Cow::Owned(format!("'{}", value))
    } else {
        Cow::Borrowed(value)
    }
}

fn required(value: &str, field: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::bad_request(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    let value = value.unwrap_or_default().trim();
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ApiError::bad_request(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(value.to_string())
}

fn email(value: &str) -> Result<String, ApiError> {
    let value = value.trim().to_lowercase();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && value.len() <= 254 => {
            Ok(value)
        }
        _ => Err(ApiError::bad_request("a valid email is required")),
    }
}

fn url(value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    let valid = (value.starts_with("https://") || value.starts_with("http://"))
        && value.len() <= 2_048
        && !value.contains(char::is_whitespace);
    if valid {
        Ok(value.to_string())
    } else {
        Err(ApiError::bad_request("url must start with http:// or https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earthbrain_db::MemoryStore;
    use earthbrain_types::models::Attendance;

    fn site() -> Site {
        Site::new(Arc::new(MemoryStore::new()))
    }

    fn rsvp(name: &str, attending: Attendance, guests: u32) -> RsvpRequest {
        RsvpRequest {
            name: name.into(),
            email: format!("{}@example.org", name.to_lowercase()),
            attending,
            guests: Some(guests),
            message: None,
        }
    }

    fn member() -> Claims {
        Claims {
            sub: "u1".into(),
            name: "Robin".into(),
            photo: None,
            role: Role::Member,
            exp: 0,
        }
    }

    fn image() -> InlineImage {
        InlineImage {
            width: 1,
            height: 1,
            data_url: "data:image/jpeg;base64,AA==".into(),
        }
    }

    #[test]
    fn summary_over_submitted_rsvps() {
        let site = site();
        site.submit_rsvp(rsvp("Ada", Attendance::Both, 2)).unwrap();
        site.submit_rsvp(rsvp("Ben", Attendance::Memorial, 1)).unwrap();
        site.submit_rsvp(rsvp("Cy", Attendance::No, 5)).unwrap();

        let summary = site.rsvp_summary().unwrap();
        assert_eq!(summary.total_guests, 3);
        assert_eq!(summary.service_count, 3);
        assert_eq!(summary.reception_count, 2);
    }

    #[test]
    fn rsvp_validation() {
        let site = site();
        let mut req = rsvp("Ada", Attendance::Both, 2);
        req.email = "not-an-email".into();
        assert!(matches!(site.submit_rsvp(req), Err(ApiError::BadRequest(_))));

        let req = rsvp("  ", Attendance::Both, 2);
        assert!(matches!(site.submit_rsvp(req), Err(ApiError::BadRequest(_))));

        let req = rsvp("Ada", Attendance::Both, 500);
        assert!(matches!(site.submit_rsvp(req), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn guestbook_switches_from_fallback_on_first_publish() {
        let site = site();
        let a = site.submit_rsvp(rsvp("Ada", Attendance::Both, 1)).unwrap();
        assert_eq!(site.guestbook().unwrap(), guestbook::fallback_entries());

        site.set_status(Collection::Rsvps, &a.id, ModerationStatus::Published)
            .unwrap();
        let entries = site.guestbook().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Ada");
    }

    #[test]
    fn pending_memories_stay_private_until_published() {
        let site = site();
        let memory = site
            .submit_memory(MemoryRequest {
                name: "Lee".into(),
                memory: "She planted a hundred trees with us.".into(),
            })
            .unwrap();

        assert!(site.public_memories().unwrap().is_empty());
        assert_eq!(site.memories().unwrap().len(), 1);

        site.set_status(Collection::Memories, &memory.id, ModerationStatus::Published)
            .unwrap();
        let public = site.public_memories().unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, memory.id);

        site.set_status(Collection::Memories, &memory.id, ModerationStatus::Pending)
            .unwrap();
        assert!(site.public_memories().unwrap().is_empty());
    }

    #[test]
    fn pending_posts_stay_private_until_published() {
        let site = site();
        let post = site.submit_post(&member(), "Sunrise at the lake", image()).unwrap();
        assert_eq!(post.user_name, "Robin");
        assert!(site.public_posts().unwrap().is_empty());

        site.set_status(Collection::Posts, &post.id, ModerationStatus::Published)
            .unwrap();
        assert_eq!(site.public_posts().unwrap().len(), 1);
    }

    #[test]
    fn legacy_wall_posts_are_listed() {
        let store = Arc::new(MemoryStore::new());
        let site = Site::new(store.clone());

        let legacy = serde_json::json!({
            "userId": "u1",
            "userName": "Robin",
            "userPhoto": "https://example.org/robin.jpg",
            "imageUrl": "data:image/jpeg;base64,AA==",
            "caption": "hi",
            "timestamp": "2026-01-20T10:00:00.000Z",
            "approved": true
        });
        let fields = legacy.as_object().cloned().unwrap();
        store.create_record(Collection::Posts, fields).unwrap();

        assert_eq!(site.posts().unwrap().len(), 1);
        let public = site.public_posts().unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].user_name, "Robin");
        assert_eq!(public[0].user_photo.as_deref(), Some("https://example.org/robin.jpg"));
    }

    #[test]
    fn approving_a_suggestion_creates_one_charity() {
        let site = site();
        let suggestion = site
            .submit_suggestion(SuggestionRequest {
                name: "Stepwell Trust".into(),
                url: "https://stepwells.example.org".into(),
                reason: "Restores village water sources.".into(),
            })
            .unwrap();

        let charity = site.approve_suggestion(&suggestion.id).unwrap();
        assert_eq!(charity.name, "Stepwell Trust");
        assert_eq!(charity.url, "https://stepwells.example.org");
        assert_eq!(charity.description, "Restores village water sources.");

        let charities = site.charities().unwrap();
        assert_eq!(charities.len(), 1);
        assert!(site.suggestions().unwrap().is_empty());

        // Second approval finds nothing and creates nothing
        assert!(matches!(
            site.approve_suggestion(&suggestion.id),
            Err(ApiError::NotFound)
        ));
        assert_eq!(site.charities().unwrap().len(), 1);
    }

    #[test]
    fn deletes_are_idempotent() {
        let site = site();
        let charity = site
            .create_charity(CharityRequest {
                name: "Seed Library".into(),
                url: "https://seeds.example.org".into(),
                label: String::new(),
                description: String::new(),
            })
            .unwrap();

        assert!(site.delete(Collection::Charities, &charity.id).unwrap());
        assert!(!site.delete(Collection::Charities, &charity.id).unwrap());
        assert!(!site.delete(Collection::Memories, "never-existed").unwrap());
    }

    #[test]
    fn charities_sorted_and_patchable() {
        let site = site();
        for name in ["Zeta Fund", "Alpha Aid"] {
            site.create_charity(CharityRequest {
                name: name.into(),
                url: "https://example.org".into(),
                label: "Favorite".into(),
                description: String::new(),
            })
            .unwrap();
        }

        let charities = site.charities().unwrap();
        assert_eq!(charities[0].name, "Alpha Aid");

        let updated = site
            .update_charity(
                &charities[0].id,
                CharityPatch {
                    description: Some("Emergency relief".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Alpha Aid");
        assert_eq!(updated.label, "Favorite");
        assert_eq!(updated.description, "Emergency relief");

        assert!(matches!(
            site.update_charity("missing", CharityPatch {
                name: Some("x".into()),
                ..Default::default()
            }),
            Err(ApiError::NotFound)
        ));
    }

    #[test]
    fn visits_counted_once_per_session() {
        let site = site();
        let visit = |session: &str, path: &str| VisitRequest {
            session: session.into(),
            path: path.into(),
        };

        assert!(site.record_visit(visit("s1", "/")).unwrap());
        assert!(!site.record_visit(visit("s1", "/memorial")).unwrap());
        assert!(site.record_visit(visit("s2", "/memorial")).unwrap());

        let stats = site.visit_stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_path["/"], 1);
        assert_eq!(stats.by_path["/memorial"], 1);
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let site = site();
        let mut req = rsvp("Ada", Attendance::Both, 2);
        req.message = Some("See you there, \"friends\"".into());
        site.submit_rsvp(req).unwrap();

        let csv = site.export_rsvps_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,email,attending,guests,message,submitted,status"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Ada,ada@example.org,both,2,\"See you there, \"\"friends\"\"\","));
        assert!(row.ends_with(",pending"));
    }

    /// Lookups never see existing documents, as when two registrations
    /// race between the email check and the insert.
    struct StaleLookups(MemoryStore);

    impl RecordStore for StaleLookups {
        fn create_record(&self, c: Collection, fields: Fields) -> anyhow::Result<Record> {
            self.0.create_record(c, fields)
        }
        fn get_record(&self, c: Collection, id: &str) -> anyhow::Result<Option<Record>> {
            self.0.get_record(c, id)
        }
        fn query_ordered(
            &self,
            c: Collection,
            field: &str,
            direction: Direction,
        ) -> anyhow::Result<Vec<Record>> {
            self.0.query_ordered(c, field, direction)
        }
        fn find_by_field(&self, _: Collection, _: &str, _: &str) -> anyhow::Result<Vec<Record>> {
            Ok(Vec::new())
        }
        fn update_fields(&self, c: Collection, id: &str, patch: Fields) -> anyhow::Result<bool> {
            self.0.update_fields(c, id, patch)
        }
        fn delete_record(&self, c: Collection, id: &str) -> anyhow::Result<bool> {
            self.0.delete_record(c, id)
        }
        fn clear_collection(&self, c: Collection) -> anyhow::Result<usize> {
            self.0.clear_collection(c)
        }
    }

    #[test]
    fn racing_registration_conflicts_at_the_store() {
        let site = Site::new(Arc::new(StaleLookups(MemoryStore::new())));
        site.create_account("ana@example.org", "Ana", None, "hash".into(), Role::Member)
            .unwrap();

        let err = site
            .create_account("Ana@Example.org", "Ana 2", None, "hash".into(), Role::Member)
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn csv_export_neutralizes_formulas() {
        let site = site();
        let mut req = rsvp("Ada", Attendance::Both, 1);
        req.name = "=HYPERLINK(\"http://evil.example\",\"x\")".into();
        req.message = Some("@SUM(A1:A9)".into());
        site.submit_rsvp(req).unwrap();

        let mut req = rsvp("Ben", Attendance::Memorial, 1);
        req.message = Some("-1 for the rain, +1 for the company".into());
        site.submit_rsvp(req).unwrap();

        let csv = site.export_rsvps_csv().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);

        // Newest first
        assert_eq!(&rows[0][0], "Ben");
        assert_eq!(&rows[0][4], "'-1 for the rain, +1 for the company");
        assert_eq!(&rows[1][0], "'=HYPERLINK(\"http://evil.example\",\"x\")");
        assert_eq!(&rows[1][4], "'@SUM(A1:A9)");

        assert_eq!(spreadsheet_safe("Plain words"), "Plain words");
    }

    #[test]
    fn duplicate_accounts_conflict() {
        let site = site();
        site.create_account("Ana@Example.org", "Ana", None, "hash".into(), Role::Member)
            .unwrap();
        let err = site
            .create_account("ana@example.org", "Ana 2", None, "hash".into(), Role::Member)
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(site.account_by_email(" ANA@example.org ").unwrap().is_some());
    }
}
