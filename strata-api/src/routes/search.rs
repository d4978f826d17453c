/// Search endpoint
///
/// `GET /search?q=keyword` matches content titles and latest-version prompts
/// in the caller's projects, newest first, at most 50 hits.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use strata_shared::{auth::context::AuthContext, models::content::ContentSummary};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LatestVersion {
    pub version_id: Option<Uuid>,
    pub version_number: Option<i32>,
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub content_id: Uuid,
    pub title: String,
    pub project_id: Uuid,
    pub primary_type: String,
    pub latest_version: LatestVersion,
}

impl From<ContentSummary> for SearchHit {
    fn from(summary: ContentSummary) -> Self {
        Self {
            content_id: summary.id,
            title: summary.title,
            project_id: summary.project_id,
            primary_type: summary.primary_type,
            latest_version: LatestVersion {
                version_id: summary.latest_version_id,
                version_number: summary.latest_version_number,
                prompt: summary.latest_prompt,
            },
        }
    }
}

/// Keyword search
///
/// # Errors
///
/// - `400 Bad Request`: `q` missing or blank
pub async fn search(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let hits = state
        .services
        .search
        .search(auth.user_id, query.q.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(hits.into_iter().map(SearchHit::from).collect()))
}
