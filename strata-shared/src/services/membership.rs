/// Membership ledger: projects and who may access them
///
/// The ledger is the only source of authorization. Projects are created
/// together with their creator's `owner` membership, and members are added only
/// by an owner.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{check_len, non_blank, ServiceError, ServiceResult};
use crate::auth::authorization::{require_membership, require_role};
use crate::models::{
    membership::{CreateMembership, Membership, ProjectRole},
    project::{CreateProject, Project},
    user::normalize_email,
};
use crate::store::Store;

const MAX_PROJECT_NAME_LEN: usize = 255;

/// Member row joined with the user's public profile
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MembershipLedger {
    store: Arc<dyn Store>,
}

impl MembershipLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Whether `user_id` holds any membership in `project_id`
    pub async fn is_member(&self, user_id: Uuid, project_id: Uuid) -> ServiceResult<bool> {
        Ok(self.store.find_membership(project_id, user_id).await?.is_some())
    }

    /// Memberships held by a user
    pub async fn list_memberships(&self, user_id: Uuid) -> ServiceResult<Vec<Membership>> {
        Ok(self.store.list_memberships_for_user(user_id).await?)
    }

    /// Creates a project with `owner` as its first member
    pub async fn create_project(
        &self,
        owner: Uuid,
        name: &str,
        description: Option<String>,
    ) -> ServiceResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("name", "Project name is required"));
        }
        check_len("name", name, MAX_PROJECT_NAME_LEN)?;

        let (project, _) = self
            .store
            .create_project_with_owner(CreateProject {
                name: name.to_string(),
                description: non_blank(description),
                owner_id: owner,
            })
            .await?;

        info!(project_id = %project.id, owner_id = %owner, "Project created");
        Ok(project)
    }

    /// Projects the user is a member of
    pub async fn list_projects(&self, user_id: Uuid) -> ServiceResult<Vec<Project>> {
        Ok(self.store.list_projects_for_user(user_id).await?)
    }

    /// Loads a project, failing with `NotFound` if it is missing
    pub async fn get_project(&self, project_id: Uuid) -> ServiceResult<Project> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or(ServiceError::NotFound("project"))
    }

    /// Lists members; any member may call this
    pub async fn list_members(&self, actor: Uuid, project_id: Uuid) -> ServiceResult<Vec<Member>> {
        self.get_project(project_id).await?;
        require_membership(self.store.as_ref(), project_id, actor).await?;

        let memberships = self.store.list_memberships_for_project(project_id).await?;
        let mut members = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if let Some(user) = self.store.find_user_by_id(membership.user_id).await? {
                members.push(Member {
                    user_id: user.id,
                    email: user.email,
                    username: user.username,
                    role: membership.role,
                    joined_at: membership.joined_at,
                });
            }
        }

        Ok(members)
    }

    /// Adds the user registered under `email` to the project
    ///
    /// # Errors
    ///
    /// - `NotFound` if the project or the email is unknown
    /// - `Forbidden` if `actor` is not the project's owner
    /// - `Validation` if `role` is `owner`
    /// - `Conflict` if the user is already a member
    pub async fn add_member(
        &self,
        actor: Uuid,
        project_id: Uuid,
        email: &str,
        role: ProjectRole,
    ) -> ServiceResult<Membership> {
        self.get_project(project_id).await?;
        require_role(self.store.as_ref(), project_id, actor, ProjectRole::Owner).await?;

        if role == ProjectRole::Owner {
            return Err(ServiceError::validation(
                "role",
                "The owner role cannot be granted",
            ));
        }

        let user = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or(ServiceError::NotFound("user"))?;

        let membership = self
            .store
            .insert_membership(CreateMembership {
                project_id,
                user_id: user.id,
                role,
            })
            .await?;

        info!(project_id = %project_id, user_id = %user.id, role = %role, "Member added");
        Ok(membership)
    }
}
