/// Project and membership endpoints
///
/// # Endpoints
///
/// - `GET /projects` - Projects the caller belongs to
/// - `POST /projects` - Create a project owned by the caller
/// - `GET /projects/:project_id/members` - List members
/// - `POST /projects/:project_id/members` - Add a member (owner only)

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
use serde::{Deserialize, Serialize};
use strata_shared::{
    auth::context::AuthContext,
    models::{
        membership::{Membership, ProjectRole},
        project::Project,
    },
    services::membership::Member,
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/:project_id/members", get(list_members).post(add_member))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            owner_id: project.owner_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    #[serde(default = "default_member_role")]
    pub role: ProjectRole,
}

fn default_member_role() -> ProjectRole {
    ProjectRole::Viewer
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = state.services.membership.list_projects(auth.user_id).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

/// Creates a project; the caller becomes its owner
///
/// # Errors
///
/// - `400 Bad Request`: Blank name
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let project = state
        .services
        .membership
        .create_project(auth.user_id, &req.name, req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(project.into())))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Member>>> {
    let members = state
        .services
        .membership
        .list_members(auth.user_id, project_id)
        .await?;
    Ok(Json(members))
}

/// Adds a registered user to the project
///
/// # Errors
///
/// - `400 Bad Request`: Role is `owner`
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: Unknown project or email
/// - `409 Conflict`: Already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let membership = state
        .services
        .membership
        .add_member(auth.user_id, project_id, &req.email, req.role)
        .await?;

    Ok((StatusCode::CREATED, Json(membership)))
}
