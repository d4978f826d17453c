/// Membership gate for project-scoped operations
///
/// # Permission Model
///
/// 1. **Membership**: a user may read or write a project's content only if a
///    membership row exists for `(project, user)`. Being recorded as the
///    project's `owner_id` grants nothing on its own.
/// 2. **Role**: member management additionally requires a minimum
///    [`ProjectRole`], compared with the `owner > editor > viewer` hierarchy.
///
/// # Example
///
/// ```no_run
/// use strata_shared::auth::authorization::{require_membership, require_role};
/// use strata_shared::models::membership::ProjectRole;
/// use strata_shared::store::Store;
/// use uuid::Uuid;
///
/// async fn check(store: &dyn Store, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
///     require_membership(store, project_id, user_id).await?;
///     require_role(store, project_id, user_id, ProjectRole::Owner).await?;
///     Ok(())
/// }
/// ```

use tracing::debug;
use uuid::Uuid;

use crate::models::membership::{Membership, ProjectRole};
use crate::store::{Store, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// User doesn't have required role
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole {
        required: ProjectRole,
        actual: ProjectRole,
    },

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Returns the caller's membership, or `NotMember` if there is none
pub async fn require_membership(
    store: &dyn Store,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Membership, AuthzError> {
    match store.find_membership(project_id, user_id).await? {
        Some(membership) => Ok(membership),
        None => {
            debug!(project_id = %project_id, user_id = %user_id, "Denied: not a member");
            Err(AuthzError::NotMember(project_id))
        }
    }
}

/// Requires membership with at least `required` role
pub async fn require_role(
    store: &dyn Store,
    project_id: Uuid,
    user_id: Uuid,
    required: ProjectRole,
) -> Result<Membership, AuthzError> {
    let membership = require_membership(store, project_id, user_id).await?;

    if !membership.role.has_permission(&required) {
        debug!(
            project_id = %project_id,
            user_id = %user_id,
            required = %required,
            actual = %membership.role,
            "Denied: insufficient role"
        );
        return Err(AuthzError::InsufficientRole {
            required,
            actual: membership.role,
        });
    }

    Ok(membership)
}

/// IDs of every project the user is a member of
pub async fn member_project_ids(store: &dyn Store, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
    Ok(store
        .list_memberships_for_user(user_id)
        .await?
        .into_iter()
        .map(|m| m.project_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{membership::CreateMembership, project::CreateProject, user::CreateUser};
    use crate::store::MemoryStore;

    async fn setup() -> (MemoryStore, Uuid, Uuid, Uuid) {
        let store = MemoryStore::new();
        let owner = store
            .insert_user(CreateUser {
                email: "owner@x.com".to_string(),
                username: "owner".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let viewer = store
            .insert_user(CreateUser {
                email: "viewer@x.com".to_string(),
                username: "viewer".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let (project, _) = store
            .create_project_with_owner(CreateProject {
                name: "P".to_string(),
                description: None,
                owner_id: owner.id,
            })
            .await
            .unwrap();
        store
            .insert_membership(CreateMembership {
                project_id: project.id,
                user_id: viewer.id,
                role: ProjectRole::Viewer,
            })
            .await
            .unwrap();

        (store, project.id, owner.id, viewer.id)
    }

    #[tokio::test]
    async fn test_require_membership() {
        let (store, project_id, owner_id, viewer_id) = setup().await;

        assert!(require_membership(&store, project_id, owner_id).await.is_ok());
        assert!(require_membership(&store, project_id, viewer_id).await.is_ok());
        assert!(matches!(
            require_membership(&store, project_id, Uuid::new_v4()).await,
            Err(AuthzError::NotMember(id)) if id == project_id
        ));
    }

    #[tokio::test]
    async fn test_require_role() {
        let (store, project_id, owner_id, viewer_id) = setup().await;

        assert!(require_role(&store, project_id, owner_id, ProjectRole::Owner).await.is_ok());
        assert!(require_role(&store, project_id, viewer_id, ProjectRole::Viewer).await.is_ok());
        assert!(matches!(
            require_role(&store, project_id, viewer_id, ProjectRole::Owner).await,
            Err(AuthzError::InsufficientRole {
                required: ProjectRole::Owner,
                actual: ProjectRole::Viewer
            })
        ));
    }

    #[tokio::test]
    async fn test_owner_id_alone_grants_nothing() {
        let (store, project_id, owner_id, _) = setup().await;
        store.remove_membership(project_id, owner_id).await;

        assert!(matches!(
            require_membership(&store, project_id, owner_id).await,
            Err(AuthzError::NotMember(_))
        ));
    }

    #[tokio::test]
    async fn test_member_project_ids() {
        let (store, project_id, _, viewer_id) = setup().await;

        assert_eq!(member_project_ids(&store, viewer_id).await.unwrap(), vec![project_id]);
        assert!(member_project_ids(&store, Uuid::new_v4()).await.unwrap().is_empty());
    }
}
