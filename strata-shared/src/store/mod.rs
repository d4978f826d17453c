/// Storage abstraction
///
/// Every service talks to storage through the [`Store`] trait. Each method is
/// one unit of work: it either commits completely or leaves no trace.
///
/// Two backends implement it:
///
/// - [`PgStore`]: PostgreSQL through sqlx, one transaction per multi-row method
/// - [`MemoryStore`]: process-local maps behind a single `RwLock`, used by the
///   test suites and by `STORAGE_BACKEND=memory`
///
/// # Latest-pointer consistency
///
/// [`Store::append_version`] and [`Store::create_content_with_version`] assign
/// version numbers and move `latest_version_id` in the same unit of work. Appends
/// to one content item are serialized, so numbers are gap-free and the pointer
/// always names the highest-numbered version.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strata_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    content::{Content, ContentSummary, CreateContent},
    membership::{CreateMembership, Membership},
    project::{CreateProject, Project},
    tag::Tag,
    user::{CreateUser, User},
    version::{NewVersion, Version},
};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A row the operation depends on does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule would be violated
    #[error("{0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result alias for store methods
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary shared by all services
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Identity

    /// Inserts a user; a taken email is a [`StoreError::Conflict`]
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks up a user by an already normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // Projects and memberships

    /// Inserts a project together with an `owner` membership for its creator
    async fn create_project_with_owner(
        &self,
        data: CreateProject,
    ) -> StoreResult<(Project, Membership)>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Projects the user is a member of, in joining order
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>>;

    async fn list_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>>;

    async fn list_memberships_for_project(
        &self,
        project_id: Uuid,
    ) -> StoreResult<Vec<Membership>>;

    /// Adds a member; an existing `(project, user)` pair is a [`StoreError::Conflict`]
    async fn insert_membership(&self, data: CreateMembership) -> StoreResult<Membership>;

    // Content

    /// Inserts a content item with no versions
    async fn insert_content(&self, data: CreateContent) -> StoreResult<Content>;

    /// Inserts a content item, its version 1 and the latest pointer atomically
    async fn create_content_with_version(
        &self,
        data: CreateContent,
        first: NewVersion,
    ) -> StoreResult<(Content, Version)>;

    async fn find_content(&self, id: Uuid) -> StoreResult<Option<Content>>;

    /// Project content with latest version info, newest first
    async fn list_contents_by_project(&self, project_id: Uuid) -> StoreResult<Vec<ContentSummary>>;

    // Versions

    /// Appends the next version and moves the latest pointer to it
    ///
    /// Returns the updated content and the new version, or
    /// `NotFound("content")` if the content does not exist.
    async fn append_version(
        &self,
        content_id: Uuid,
        data: NewVersion,
    ) -> StoreResult<(Content, Version)>;

    /// Versions of a content item, highest number first
    async fn list_versions(&self, content_id: Uuid) -> StoreResult<Vec<Version>>;

    async fn find_version(&self, id: Uuid) -> StoreResult<Option<Version>>;

    // Tags

    /// Returns the tag named `name` ignoring case, creating it if needed
    ///
    /// The flag is `true` when this call created the tag. `name` must already
    /// be trimmed and non-blank.
    async fn find_or_create_tag(
        &self,
        name: &str,
        created_by: Option<Uuid>,
    ) -> StoreResult<(Tag, bool)>;

    async fn find_tag(&self, id: Uuid) -> StoreResult<Option<Tag>>;

    /// All tags ordered by name, optionally filtered by a case-insensitive substring
    async fn list_tags(&self, filter: Option<&str>) -> StoreResult<Vec<Tag>>;

    /// Find-or-creates each name and links it to the content, all in one unit
    ///
    /// `names` must be cleaned and deduplicated; the result is in the same order.
    async fn attach_tags(
        &self,
        content_id: Uuid,
        names: &[String],
        created_by: Option<Uuid>,
    ) -> StoreResult<Vec<Tag>>;

    /// Tags linked to a content item, ordered by name
    async fn list_tags_for_content(&self, content_id: Uuid) -> StoreResult<Vec<Tag>>;

    /// Content linked to a tag, limited to the given projects, newest first
    async fn list_contents_for_tag(
        &self,
        tag_id: Uuid,
        project_ids: &[Uuid],
    ) -> StoreResult<Vec<ContentSummary>>;

    // Search

    /// Case-insensitive substring match on title or latest prompt, newest first
    async fn search_contents(
        &self,
        project_ids: &[Uuid],
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<ContentSummary>>;
}
