//! HTTP surface for the design infusion workflow.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, post};
use axum::{Json, Router};

use super::error::DesignError;
use super::types::{
    AppliedDesignResponse, DesignProposal, ImageInfusionRequest, ProposalRequest, RefineRequest,
};
use crate::shared::state::AppState;

pub fn configure_design_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/design/:dashboard_id/image", post(infuse_from_image))
        .route("/api/design/:dashboard_id/proposal", post(propose))
        .route("/api/design/:dashboard_id/refine", post(refine))
        .route("/api/design/:dashboard_id/validate", post(validate))
        .route("/api/design/:dashboard_id", delete(discard))
}

async fn infuse_from_image(
    State(state): State<Arc<AppState>>,
    Path(dashboard_id): Path<String>,
    Json(request): Json<ImageInfusionRequest>,
) -> Result<Json<AppliedDesignResponse>, DesignError> {
    let applied = state
        .design
        .infuse_from_image(&dashboard_id, &request.image)
        .await?;
    Ok(Json(applied))
}

async fn propose(
    State(state): State<Arc<AppState>>,
    Path(dashboard_id): Path<String>,
    Json(request): Json<ProposalRequest>,
) -> Result<Json<DesignProposal>, DesignError> {
    let proposal = state.design.propose(&dashboard_id, &request.prompt).await?;
    Ok(Json(proposal))
}

async fn refine(
    State(state): State<Arc<AppState>>,
    Path(dashboard_id): Path<String>,
    Json(request): Json<RefineRequest>,
) -> Result<Json<DesignProposal>, DesignError> {
    let proposal = state.design.refine(&dashboard_id, &request.feedback).await?;
    Ok(Json(proposal))
}

async fn validate(
    State(state): State<Arc<AppState>>,
    Path(dashboard_id): Path<String>,
) -> Result<Json<AppliedDesignResponse>, DesignError> {
    let applied = state.design.validate(&dashboard_id).await?;
    Ok(Json(applied))
}

async fn discard(
    State(state): State<Arc<AppState>>,
    Path(dashboard_id): Path<String>,
) -> Result<Json<serde_json::Value>, DesignError> {
    state.design.discard(&dashboard_id).await?;
    Ok(Json(serde_json::json!({ "discarded": true })))
}
