use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::errors::AppError;
use crate::search::models::{SearchRequest, SearchResponse};
use crate::state::AppState;

/// POST /unified-job-search
/// POST /api/v1/jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let response = state.aggregator.search(request).await?;
    Ok(Json(response))
}
