/// Tag endpoints
///
/// # Endpoints
///
/// - `GET /tags?q=` - All tags ordered by name, optional substring filter
/// - `POST /tags` - Find or create a tag (`201` new, `200` existing)
/// - `GET /tags/content/:content_id` - Tags of a content item
/// - `POST /tags/content/:content_id` - Tag a content item
/// - `GET /tags/:tag_id/contents` - Content carrying a tag, in the caller's projects

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strata_shared::{auth::context::AuthContext, models::tag::Tag};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route(
            "/content/:content_id",
            get(list_content_tags).post(attach_tags),
        )
        .route("/:tag_id/contents", get(list_tag_contents))
}

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /tags/content/:content_id`
///
/// `tags` is kept as raw JSON so access is checked before its shape.
#[derive(Debug, Deserialize)]
pub struct AttachTagsRequest {
    #[serde(default)]
    pub tags: Value,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub tag_id: Uuid,
    pub name: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            tag_id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachTagsResponse {
    pub content_id: Uuid,
    pub tags: Vec<TagResponse>,
}

#[derive(Debug, Serialize)]
pub struct TaggedContent {
    pub content_id: Uuid,
    pub title: String,
    pub project_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TagContentsResponse {
    pub tag_id: Uuid,
    pub tag_name: String,
    pub contents: Vec<TaggedContent>,
}

/// Reads tag names from a JSON value
///
/// Anything other than an array yields no names; `null` and non-string
/// entries count as blank.
fn tag_names(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => name,
                _ => String::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let tags = state.services.tags.list_tags(query.q.as_deref()).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// Returns the existing tag matching `name` ignoring case, or creates it
///
/// # Errors
///
/// - `400 Bad Request`: Blank name
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    let (tag, created) = state
        .services
        .tags
        .find_or_create(&req.name, Some(auth.user_id))
        .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(tag.into())))
}

pub async fn list_content_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(content_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let tags = state
        .services
        .tags
        .list_tags_for_content(auth.user_id, content_id)
        .await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// Tags a content item, creating missing tags
///
/// # Errors
///
/// - `400 Bad Request`: `tags` is not a non-empty list of names
/// - `403 Forbidden`: Caller is not a project member
/// - `404 Not Found`: Unknown content
pub async fn attach_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(content_id): Path<Uuid>,
    ApiJson(req): ApiJson<AttachTagsRequest>,
) -> ApiResult<Json<AttachTagsResponse>> {
    let names = tag_names(req.tags);
    let tags = state
        .services
        .tags
        .attach_tags(auth.user_id, content_id, &names)
        .await?;

    Ok(Json(AttachTagsResponse {
        content_id,
        tags: tags.into_iter().map(TagResponse::from).collect(),
    }))
}

pub async fn list_tag_contents(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(tag_id): Path<Uuid>,
) -> ApiResult<Json<TagContentsResponse>> {
    let tagged = state
        .services
        .tags
        .list_contents_for_tag(auth.user_id, tag_id)
        .await?;

    Ok(Json(TagContentsResponse {
        tag_id: tagged.tag.id,
        tag_name: tagged.tag.name,
        contents: tagged
            .contents
            .into_iter()
            .map(|c| TaggedContent {
                content_id: c.id,
                title: c.title,
                project_id: c.project_id,
            })
            .collect(),
    }))
}
