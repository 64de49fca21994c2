use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use earthbrain_types::api::{ClearResponse, RsvpRequest};
use earthbrain_types::moderation::ModerationStatus;
use earthbrain_types::record::Collection;

use crate::error::ApiError;
use crate::{AppState, blocking};

/// POST /rsvps: public memorial form. New responses start out pending.
pub async fn submit_rsvp(
    State(state): State<AppState>,
    Json(req): Json<RsvpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let rsvp = blocking(move || st.site.submit_rsvp(req)).await?;

    state.webhook.notify("rsvp", &rsvp);
    Ok((StatusCode::CREATED, Json(rsvp)))
}

/// GET /guestbook
pub async fn get_guestbook(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let entries = blocking(move || state.site.guestbook()).await?;
    Ok(Json(entries))
}

pub async fn list_rsvps(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rsvps = blocking(move || state.site.rsvps()).await?;
    Ok(Json(rsvps))
}

pub async fn get_summary(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let summary = blocking(move || state.site.rsvp_summary()).await?;
    Ok(Json(summary))
}

/// GET /admin/rsvps/export: CSV check-in sheet.
pub async fn export_rsvps(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let csv = blocking(move || state.site.export_rsvps_csv()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"rsvps.csv\"",
            ),
        ],
        csv,
    ))
}

pub async fn approve_rsvp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        state
            .site
            .set_status(Collection::Rsvps, &id, ModerationStatus::Published)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unpublish_rsvp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        state
            .site
            .set_status(Collection::Rsvps, &id, ModerationStatus::Pending)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_rsvp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.site.delete(Collection::Rsvps, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /admin/rsvps: wipe every response.
pub async fn clear_rsvps(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let deleted = blocking(move || state.site.clear(Collection::Rsvps)).await?;
    Ok(Json(ClearResponse { deleted }))
}
