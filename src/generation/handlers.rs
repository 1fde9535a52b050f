//! HTTP surface for the generation orchestrator.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use super::error::GenerationError;
use super::types::{PollResponse, StartGenerationRequest, StartGenerationResponse};
use crate::shared::state::AppState;

pub fn configure_generation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/generation", post(start_generation))
        .route("/api/generation/:session_id", get(poll_generation))
        .route("/api/generation/:session_id/cancel", post(cancel_generation))
}

async fn start_generation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartGenerationRequest>,
) -> Result<Json<StartGenerationResponse>, GenerationError> {
    if request.prompt.trim().is_empty() {
        return Err(GenerationError::Validation("prompt must not be empty".into()));
    }
    if request.columns.is_empty() && request.column_types.as_deref().map_or(true, |t| t.is_empty())
    {
        return Err(GenerationError::Validation(
            "at least one column is required".into(),
        ));
    }

    let session_id = state.orchestrator.start_generation(request).await;
    info!(session = %session_id, "generation session started");
    Ok(Json(StartGenerationResponse {
        session_id,
        max_poll_attempts: state.config.generation.max_poll_attempts,
        poll_interval_ms: state.config.generation.poll_interval_ms,
    }))
}

async fn poll_generation(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<PollResponse>, GenerationError> {
    let progress = state.orchestrator.sessions.poll(session_id).await?;
    Ok(Json(progress))
}

async fn cancel_generation(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, GenerationError> {
    state.orchestrator.sessions.cancel(session_id).await?;
    info!(session = %session_id, "generation cancelled");
    Ok(Json(serde_json::json!({ "cancelled": true })))
}
