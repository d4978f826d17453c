/// Content endpoints
///
/// # Endpoints
///
/// - `GET /contents/project/:project_id` - Project content, newest first
/// - `POST /contents/project/:project_id` - Create content with version 1
/// - `GET /contents/:content_id` - One content item with its latest version

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
use strata_shared::{
    auth::context::AuthContext,
    models::content::ContentSummary,
    services::content::{ContentDetail, NewContent},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/project/:project_id",
            get(list_project_contents).post(create_content),
        )
        .route("/:content_id", get(get_content))
}

#[derive(Debug, Deserialize)]
pub struct CreateContentRequest {
    #[serde(default)]
    pub title: String,
    pub primary_type: Option<String>,
    pub source_tool: Option<String>,
    pub prompt: Option<String>,
    pub file_url: Option<String>,
}

/// Version number reference
#[derive(Debug, Serialize)]
pub struct VersionRef {
    pub version_id: Option<Uuid>,
    pub version_number: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ContentListItem {
    pub content_id: Uuid,
    pub project_id: Uuid,
    pub creator_id: Option<Uuid>,
    pub title: String,
    pub primary_type: String,
    pub source_tool: Option<String>,
    pub created_at: DateTime<Utc>,
    pub latest_version: VersionRef,
}

impl From<ContentSummary> for ContentListItem {
    fn from(summary: ContentSummary) -> Self {
        Self {
            content_id: summary.id,
            project_id: summary.project_id,
            creator_id: summary.creator_id,
            title: summary.title,
            primary_type: summary.primary_type,
            source_tool: summary.source_tool,
            created_at: summary.created_at,
            latest_version: VersionRef {
                version_id: summary.latest_version_id,
                version_number: summary.latest_version_number,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateContentResponse {
    pub content_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub primary_type: String,
    pub source_tool: Option<String>,
    pub version: VersionRef,
}

pub async fn list_project_contents(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ContentListItem>>> {
    let contents = state
        .services
        .content
        .list_by_project(auth.user_id, project_id)
        .await?;

    Ok(Json(contents.into_iter().map(ContentListItem::from).collect()))
}

/// Creates a content item and its first version
///
/// `primary_type` defaults to `text`.
///
/// # Errors
///
/// - `400 Bad Request`: Blank title
/// - `403 Forbidden`: Caller is not a project member
/// - `404 Not Found`: Unknown project
pub async fn create_content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateContentRequest>,
) -> ApiResult<(StatusCode, Json<CreateContentResponse>)> {
    let (content, version) = state
        .services
        .content
        .create_content_with_first_version(
            auth.user_id,
            project_id,
            NewContent {
                title: req.title,
                primary_type: req.primary_type,
                source_tool: req.source_tool,
            },
            req.prompt,
            req.file_url,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateContentResponse {
            content_id: content.id,
            project_id: content.project_id,
            title: content.title,
            primary_type: content.primary_type,
            source_tool: content.source_tool,
            version: VersionRef {
                version_id: Some(version.id),
                version_number: Some(version.version_number),
            },
        }),
    ))
}

pub async fn get_content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(content_id): Path<Uuid>,
) -> ApiResult<Json<ContentDetail>> {
    let detail = state
        .services
        .content
        .get_content(auth.user_id, content_id)
        .await?;
    Ok(Json(detail))
}
