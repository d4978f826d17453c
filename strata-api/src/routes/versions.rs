/// Version endpoints
///
/// # Endpoints
///
/// - `GET /versions/content/:content_id` - Versions, highest number first
/// - `POST /versions/content/:content_id` - Append the next version

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_shared::{auth::context::AuthContext, models::version::Version};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new().route("/content/:content_id", get(list_versions).post(append_version))
}

#[derive(Debug, Default, Deserialize)]
pub struct AppendVersionRequest {
    pub prompt: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version_id: Uuid,
    pub version_number: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub prompt: Option<String>,
    pub file_url: Option<String>,
}

impl From<Version> for VersionResponse {
    fn from(version: Version) -> Self {
        Self {
            version_id: version.id,
            version_number: version.version_number,
            created_by: version.created_by,
            created_at: version.created_at,
            prompt: version.prompt,
            file_url: version.file_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppendVersionResponse {
    pub content_id: Uuid,
    pub version_id: Uuid,
    pub version_number: i32,
}

pub async fn list_versions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(content_id): Path<Uuid>,
) -> ApiResult<Json<Vec<VersionResponse>>> {
    let versions = state
        .services
        .versions
        .list_versions(auth.user_id, content_id)
        .await?;

    Ok(Json(versions.into_iter().map(VersionResponse::from).collect()))
}

/// Appends a version and moves the latest pointer to it
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a project member
/// - `404 Not Found`: Unknown content
pub async fn append_version(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(content_id): Path<Uuid>,
    ApiJson(req): ApiJson<AppendVersionRequest>,
) -> ApiResult<(StatusCode, Json<AppendVersionResponse>)> {
    let version = state
        .services
        .versions
        .append_version(auth.user_id, content_id, req.prompt, req.file_url)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AppendVersionResponse {
            content_id: version.content_id,
            version_id: version.id,
            version_number: version.version_number,
        }),
    ))
}
