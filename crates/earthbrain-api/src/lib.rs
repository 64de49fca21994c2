pub mod auth;
pub mod charities;
pub mod error;
pub mod memories;
pub mod middleware;
pub mod posts;
pub mod rsvps;
pub mod site;
pub mod visits;
pub mod webhook;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use tracing::error;

use crate::error::ApiError;
use crate::middleware::{require_admin, require_auth};
use crate::site::Site;
use crate::webhook::Webhook;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub site: Site,
    pub jwt_secret: String,
    pub token_days: i64,
    pub webhook: Webhook,
    /// Cap on the decoded size of an uploaded image, before downscaling.
    pub max_upload_bytes: usize,
}

/// All API routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    // Images arrive base64-encoded inside JSON
    let body_limit = state.max_upload_bytes / 3 * 4 + 64 * 1024;

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/rsvps", post(rsvps::submit_rsvp))
        .route("/guestbook", get(rsvps::get_guestbook))
        .route("/memories", post(memories::submit_memory).get(memories::get_memories))
        .route("/charities", get(charities::get_charities))
        .route("/charities/suggestions", post(charities::submit_suggestion))
        .route("/visits", post(visits::record_visit))
        .with_state(state.clone());

    let member_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/posts", get(posts::get_posts).post(posts::submit_post))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin/rsvps", get(rsvps::list_rsvps).delete(rsvps::clear_rsvps))
        .route("/admin/rsvps/summary", get(rsvps::get_summary))
        .route("/admin/rsvps/export", get(rsvps::export_rsvps))
        .route("/admin/rsvps/{id}", delete(rsvps::delete_rsvp))
        .route("/admin/rsvps/{id}/approve", post(rsvps::approve_rsvp))
        .route("/admin/rsvps/{id}/unpublish", post(rsvps::unpublish_rsvp))
        .route("/admin/memories", get(memories::list_memories))
        .route("/admin/memories/{id}", delete(memories::delete_memory))
        .route("/admin/memories/{id}/approve", post(memories::approve_memory))
        .route("/admin/memories/{id}/unpublish", post(memories::unpublish_memory))
        .route("/admin/posts", get(posts::list_posts))
        .route("/admin/posts/{id}", delete(posts::delete_post))
        .route("/admin/posts/{id}/approve", post(posts::approve_post))
        .route("/admin/posts/{id}/unpublish", post(posts::unpublish_post))
        .route("/admin/charities", post(charities::create_charity))
        .route(
            "/admin/charities/{id}",
            put(charities::update_charity).delete(charities::delete_charity),
        )
        .route("/admin/suggestions", get(charities::list_suggestions))
        .route("/admin/suggestions/{id}", delete(charities::delete_suggestion))
        .route("/admin/suggestions/{id}/approve", post(charities::approve_suggestion))
        .route("/admin/visits", get(visits::get_visit_stats))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run a blocking store operation off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("background task failed"))
    })?
}
