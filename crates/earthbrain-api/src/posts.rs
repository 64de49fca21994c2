use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::warn;

use earthbrain_media::MediaError;
use earthbrain_types::api::{Claims, PostRequest};
use earthbrain_types::moderation::ModerationStatus;
use earthbrain_types::record::Collection;

use crate::error::ApiError;
use crate::{AppState, blocking};

const SMALLER_IMAGE: &str = "Error sharing post. Please try a smaller image.";

/// POST /posts: community wall upload. The image is downscaled and stored
/// inline; the post stays hidden until an admin publishes it.
pub async fn submit_post(
    State(state): State<AppState>,
    Extension(session): Extension<Claims>,
    Json(req): Json<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Browsers send a data URL; accept the bare payload too
    let encoded = match req.image.split_once(";base64,") {
        Some((_, payload)) => payload,
        None => req.image.as_str(),
    };
    let bytes = B64
        .decode(encoded.trim())
        .map_err(|_| ApiError::bad_request("image must be base64-encoded"))?;

    if bytes.len() > state.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge);
    }

    let st = state.clone();
    let caption = req.caption;
    let post = blocking(move || {
        let image = earthbrain_media::downscale(&bytes).map_err(|e| match e {
            MediaError::Empty => ApiError::bad_request("image is required"),
            other => {
                warn!("Rejected upload from {}: {}", session.sub, other);
                ApiError::ImageRejected(SMALLER_IMAGE.into())
            }
        })?;
        st.site.submit_post(&session, &caption, image)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts: the public wall, published posts only.
pub async fn get_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = blocking(move || state.site.public_posts()).await?;
    Ok(Json(posts))
}

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = blocking(move || state.site.posts()).await?;
    Ok(Json(posts))
}

pub async fn approve_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        state
            .site
            .set_status(Collection::Posts, &id, ModerationStatus::Published)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unpublish_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || {
        state
            .site
            .set_status(Collection::Posts, &id, ModerationStatus::Pending)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.site.delete(Collection::Posts, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
