//! REST API handlers for rotation management, engagement recording and
//! operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rotation_core::error::RotationError;
use rotation_engine::RotationService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RotationService>,
    pub node_id: String,
    pub start_time: Instant,
}

#[derive(Deserialize)]
pub struct RotationRequest {
    pub banner_id: i64,
    pub slot_id: i64,
}

#[derive(Deserialize)]
pub struct PickRequest {
    pub slot_id: i64,
    pub usergroup_id: i64,
}

#[derive(Deserialize)]
pub struct ClickRequest {
    pub banner_id: i64,
    pub slot_id: i64,
    pub usergroup_id: i64,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct PickResponse {
    pub banner_id: i64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a domain error onto an HTTP status and error body.
fn error_response(err: RotationError) -> ApiError {
    let (status, code) = match &err {
        RotationError::BannerNotFound(_)
        | RotationError::SlotNotFound(_)
        | RotationError::UserGroupNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        RotationError::AlreadyAssigned { .. } => (StatusCode::CONFLICT, "already_assigned"),
        RotationError::NoCandidates(_) => (StatusCode::UNPROCESSABLE_ENTITY, "no_candidates"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "Rotation operation failed");
        metrics::counter!("api.errors").increment(1);
    } else {
        warn!(error = %err, "Rotation request rejected");
        metrics::counter!("api.validation_errors").increment(1);
    }

    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

/// POST /v1/rotations — put a banner into rotation for a slot.
pub async fn add_banner(
    State(state): State<AppState>,
    Json(request): Json<RotationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .service
        .add_banner(request.banner_id, request.slot_id)
        .await
        .map_err(error_response)?;

    Ok(Json(MessageResponse {
        message: "Banner added successfully".to_string(),
    }))
}

/// DELETE /v1/rotations — take a banner out of rotation for a slot.
pub async fn remove_banner(
    State(state): State<AppState>,
    Json(request): Json<RotationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .service
        .remove_banner(request.banner_id, request.slot_id)
        .await
        .map_err(error_response)?;

    Ok(Json(MessageResponse {
        message: "Banner removed successfully".to_string(),
    }))
}

/// POST /v1/pick — choose the banner to show for (slot, user group).
pub async fn pick_banner(
    State(state): State<AppState>,
    Json(request): Json<PickRequest>,
) -> Result<Json<PickResponse>, ApiError> {
    let (_event, banner_id) = state
        .service
        .pick_banner(request.slot_id, request.usergroup_id)
        .await
        .map_err(error_response)?;

    Ok(Json(PickResponse { banner_id }))
}

/// POST /v1/click — record a click on a shown banner.
pub async fn click_banner(
    State(state): State<AppState>,
    Json(request): Json<ClickRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .service
        .record_click(request.banner_id, request.slot_id, request.usergroup_id)
        .await
        .map_err(error_response)?;

    Ok(Json(MessageResponse {
        message: "Banner clicked successfully".to_string(),
    }))
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
