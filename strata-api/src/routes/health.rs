/// Health check endpoints
///
/// # Endpoints
///
/// - `GET /health` - Liveness; never touches storage
/// - `GET /health/ready` - Readiness; pings the store, `503` when it is down

use crate::{app::AppState, error::ApiResult, error::ApiError};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,
}

/// Readiness response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,

    /// Storage status
    pub storage: String,
}

/// Liveness handler
///
/// ```json
/// { "status": "ok", "version": "0.1.0" }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness handler
pub async fn readiness(State(state): State<AppState>) -> ApiResult<Json<ReadinessResponse>> {
    if let Err(e) = state.services.store().ping().await {
        tracing::warn!(error = %e, "Readiness check failed");
        return Err(ApiError::ServiceUnavailable("Storage is unavailable".to_string()));
    }

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        storage: "connected".to_string(),
    }))
}
