use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use earthbrain_types::api::{CharityPatch, CharityRequest, SuggestionRequest};
use earthbrain_types::record::Collection;

use crate::error::ApiError;
use crate::{AppState, blocking};

/// GET /charities: the curated list, by name.
pub async fn get_charities(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let charities = blocking(move || state.site.charities()).await?;
    Ok(Json(charities))
}

pub async fn create_charity(
    State(state): State<AppState>,
    Json(req): Json<CharityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let charity = blocking(move || state.site.create_charity(req)).await?;
    Ok((StatusCode::CREATED, Json(charity)))
}

pub async fn update_charity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CharityPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let charity = blocking(move || state.site.update_charity(&id, patch)).await?;
    Ok(Json(charity))
}

pub async fn delete_charity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.site.delete(Collection::Charities, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Suggestions --

/// POST /charities/suggestions
pub async fn submit_suggestion(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let suggestion = blocking(move || st.site.submit_suggestion(req)).await?;

    state.webhook.notify("charity_suggestion", &suggestion);
    Ok((StatusCode::CREATED, Json(suggestion)))
}

pub async fn list_suggestions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let suggestions = blocking(move || state.site.suggestions()).await?;
    Ok(Json(suggestions))
}

/// POST /admin/suggestions/{id}/approve: returns the new charity.
pub async fn approve_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let charity = blocking(move || state.site.approve_suggestion(&id)).await?;
    Ok((StatusCode::CREATED, Json(charity)))
}

pub async fn delete_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.site.delete(Collection::CharitySuggestions, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
