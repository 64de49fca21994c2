use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use earthbrain_types::api::MemoryRequest;
use earthbrain_types::moderation::ModerationStatus;
use earthbrain_types::record::Collection;

use crate::error::ApiError;
use crate::{AppState, blocking};

/// POST /memories: biography page testimonial, held for review.
pub async fn submit_memory(
    State(state): State<AppState>,
    Json(req): Json<MemoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let memory = blocking(move || st.site.submit_memory(req)).await?;

    state.webhook.notify("bio_memory", &memory);
    Ok((StatusCode::CREATED, Json(memory)))
}

/// GET /memories: published only.
pub async fn get_memories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let memories = blocking(move || state.site.public_memories()).await?;
    Ok(Json(memories))
}

pub async fn list_memories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let memories = blocking(move || state.site.memories()).await?;
    Ok(Json(memories))
}

pub async fn approve_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        state
            .site
            .set_status(Collection::Memories, &id, ModerationStatus::Published)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unpublish_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        state
            .site
            .set_status(Collection::Memories, &id, ModerationStatus::Pending)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.site.delete(Collection::Memories, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
