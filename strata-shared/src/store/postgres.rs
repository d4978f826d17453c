/// PostgreSQL-backed store
///
/// Single-statement methods run directly on the pool. Methods that touch more
/// than one row open a transaction and commit it before returning; an early
/// return drops the transaction, which rolls it back.
///
/// Appends lock the content row with `SELECT ... FOR UPDATE` before reading the
/// current maximum version number. The `UNIQUE (content_id, version_number)`
/// constraint turns any bypass of that lock into an error instead of a
/// duplicate.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    content::{Content, ContentSummary, CreateContent},
    membership::{CreateMembership, Membership, ProjectRole},
    project::{CreateProject, Project},
    tag::Tag,
    user::{CreateUser, User},
    version::{NewVersion, Version},
};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique violation to [`StoreError::Conflict`], everything else to `Database`
fn conflict_on_unique(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(err),
    }
}

async fn find_or_create_tag_in(
    conn: &mut sqlx::PgConnection,
    name: &str,
    created_by: Option<Uuid>,
) -> StoreResult<(Tag, bool)> {
    if let Some(tag) = Tag::find_by_name(&mut *conn, name).await? {
        return Ok((tag, false));
    }

    if let Some(tag) = Tag::insert_if_absent(&mut *conn, name, created_by).await? {
        return Ok((tag, true));
    }

    // Lost a race with a concurrent insert of the same name
    let tag = Tag::find_by_name(&mut *conn, name)
        .await?
        .ok_or(StoreError::NotFound("tag"))?;

    Ok((tag, false))
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(|e| conflict_on_unique(e, "email already registered"))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create_project_with_owner(
        &self,
        data: CreateProject,
    ) -> StoreResult<(Project, Membership)> {
        let mut tx = self.pool.begin().await?;

        let owner_id = data.owner_id;
        let project = Project::create(&mut *tx, data).await?;
        let membership = Membership::create(
            &mut *tx,
            CreateMembership {
                project_id: project.id,
                user_id: owner_id,
                role: ProjectRole::Owner,
            },
        )
        .await?;

        tx.commit().await?;
        Ok((project, membership))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_member(&self.pool, user_id).await?)
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(Membership::find(&self.pool, project_id, user_id).await?)
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(Membership::list_by_user(&self.pool, user_id).await?)
    }

    async fn list_memberships_for_project(
        &self,
        project_id: Uuid,
    ) -> StoreResult<Vec<Membership>> {
        Ok(Membership::list_by_project(&self.pool, project_id).await?)
    }

    async fn insert_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        Membership::create(&self.pool, data)
            .await
            .map_err(|e| conflict_on_unique(e, "user is already a member of this project"))
    }

    async fn insert_content(&self, data: CreateContent) -> StoreResult<Content> {
        Ok(Content::create(&self.pool, data).await?)
    }

    async fn create_content_with_version(
        &self,
        data: CreateContent,
        first: NewVersion,
    ) -> StoreResult<(Content, Version)> {
        let mut tx = self.pool.begin().await?;

        let content = Content::create(&mut *tx, data).await?;
        let version = Version::insert(&mut *tx, content.id, 1, first).await?;
        let content = Content::set_latest_version(&mut *tx, content.id, version.id).await?;

        tx.commit().await?;
        Ok((content, version))
    }

    async fn find_content(&self, id: Uuid) -> StoreResult<Option<Content>> {
        Ok(Content::find_by_id(&self.pool, id).await?)
    }

    async fn list_contents_by_project(&self, project_id: Uuid) -> StoreResult<Vec<ContentSummary>> {
        Ok(Content::list_by_project(&self.pool, project_id).await?)
    }

    async fn append_version(
        &self,
        content_id: Uuid,
        data: NewVersion,
    ) -> StoreResult<(Content, Version)> {
        let mut tx = self.pool.begin().await?;

        Content::lock_for_update(&mut *tx, content_id)
            .await?
            .ok_or(StoreError::NotFound("content"))?;

        let next = Version::max_number(&mut *tx, content_id).await? + 1;
        debug!(content_id = %content_id, version_number = next, "Assigning version number");

        let version = Version::insert(&mut *tx, content_id, next, data)
            .await
            .map_err(|e| conflict_on_unique(e, "version number already taken"))?;
        let content = Content::set_latest_version(&mut *tx, content_id, version.id).await?;

        tx.commit().await?;
        Ok((content, version))
    }

    async fn list_versions(&self, content_id: Uuid) -> StoreResult<Vec<Version>> {
        Ok(Version::list_by_content(&self.pool, content_id).await?)
    }

    async fn find_version(&self, id: Uuid) -> StoreResult<Option<Version>> {
        Ok(Version::find_by_id(&self.pool, id).await?)
    }

    async fn find_or_create_tag(
        &self,
        name: &str,
        created_by: Option<Uuid>,
    ) -> StoreResult<(Tag, bool)> {
        let mut conn = self.pool.acquire().await?;
        find_or_create_tag_in(&mut *conn, name, created_by).await
    }

    async fn find_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        Ok(Tag::find_by_id(&self.pool, id).await?)
    }

    async fn list_tags(&self, filter: Option<&str>) -> StoreResult<Vec<Tag>> {
        Ok(Tag::list(&self.pool, filter).await?)
    }

    async fn attach_tags(
        &self,
        content_id: Uuid,
        names: &[String],
        created_by: Option<Uuid>,
    ) -> StoreResult<Vec<Tag>> {
        let mut tx = self.pool.begin().await?;

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let (tag, _) = find_or_create_tag_in(&mut *tx, name, created_by).await?;
            Tag::link(&mut *tx, content_id, tag.id).await?;
            tags.push(tag);
        }

        tx.commit().await?;
        Ok(tags)
    }

    async fn list_tags_for_content(&self, content_id: Uuid) -> StoreResult<Vec<Tag>> {
        Ok(Tag::list_for_content(&self.pool, content_id).await?)
    }

    async fn list_contents_for_tag(
        &self,
        tag_id: Uuid,
        project_ids: &[Uuid],
    ) -> StoreResult<Vec<ContentSummary>> {
        Ok(Content::list_by_tag(&self.pool, tag_id, project_ids).await?)
    }

    async fn search_contents(
        &self,
        project_ids: &[Uuid],
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<ContentSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(Content::search(&self.pool, project_ids, query, limit).await?)
    }
}
