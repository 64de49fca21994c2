use axum::{Json, extract::State, response::IntoResponse};

use earthbrain_types::api::{VisitRequest, VisitResponse};

use crate::error::ApiError;
use crate::{AppState, blocking};

/// POST /visits: analytics ping, counted once per browser session.
pub async fn record_visit(
    State(state): State<AppState>,
    Json(req): Json<VisitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recorded = blocking(move || state.site.record_visit(req)).await?;
    Ok(Json(VisitResponse { recorded }))
}

pub async fn get_visit_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = blocking(move || state.site.visit_stats()).await?;
    Ok(Json(stats))
}
