pub mod api;
pub mod guestbook;
pub mod models;
pub mod moderation;
pub mod record;
pub mod summary;
