use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::control::{ContainerView, ControlService};
use crate::store::StoreError;

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ControlService>,
}

#[derive(Deserialize)]
struct ToggleRequest {
    id: String,
    event: String,
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    status: String,
    id: String,
    start: bool,
    stop: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    trigger: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn api_router(service: Arc<ControlService>) -> Router {
    let state = ApiState { service };

    Router::new()
        .route("/api/containers", get(list_containers))
        .route("/api/toggle", post(toggle))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        trigger: state.service.trigger(),
    })
}

async fn list_containers(State(state): State<ApiState>) -> Json<Vec<ContainerView>> {
    Json(state.service.list_containers().await)
}

async fn toggle(
    State(state): State<ApiState>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.service.toggle(&payload.id, &payload.event).await {
        Ok(toggle) => Ok(Json(ToggleResponse {
            status: "ok".to_string(),
            id: payload.id,
            start: toggle.start,
            stop: toggle.stop,
        })),
        Err(e) => {
            let status = match e {
                StoreError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
                StoreError::Persist(_) | StoreError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(ErrorResponse { error: e.to_string() })))
        }
    }
}
