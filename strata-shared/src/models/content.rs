/// Content model and database operations
///
/// A content item is a titled piece of work inside a project. Its body lives in
/// the version chain; the content row only tracks which version is the latest.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE contents (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     creator_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     latest_version_id UUID,
///     title VARCHAR(255) NOT NULL,
///     primary_type VARCHAR(30) NOT NULL DEFAULT 'text',
///     source_tool VARCHAR(100),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `latest_version_id` is `NULL` only until the first version commits, and is
/// otherwise the version of this content with the highest `version_number`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Primary type assigned when the caller does not specify one
pub const DEFAULT_PRIMARY_TYPE: &str = "text";

/// Content item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    /// Unique content ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// User who created the content (cleared if the user is deleted)
    pub creator_id: Option<Uuid>,

    /// Pointer to the newest version
    pub latest_version_id: Option<Uuid>,

    /// Title (non-blank)
    pub title: String,

    /// Kind of content, e.g. "text" or "image"
    pub primary_type: String,

    /// Tool that produced the content, if any
    pub source_tool: Option<String>,

    /// When the content was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContent {
    pub project_id: Uuid,
    pub creator_id: Option<Uuid>,
    pub title: String,
    pub primary_type: String,
    pub source_tool: Option<String>,
}

/// Content row joined with its latest version
///
/// Returned by project listings and search. `latest_version_number` is `None`
/// for content that has no version yet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentSummary {
    pub id: Uuid,
    pub project_id: Uuid,
    pub creator_id: Option<Uuid>,
    pub title: String,
    pub primary_type: String,
    pub source_tool: Option<String>,
    pub created_at: DateTime<Utc>,
    pub latest_version_id: Option<Uuid>,
    pub latest_version_number: Option<i32>,
    pub latest_prompt: Option<String>,
}

impl ContentSummary {
    /// Builds a summary from a content row and its latest version, if any
    pub fn from_parts(content: &Content, latest: Option<&crate::models::version::Version>) -> Self {
        Self {
            id: content.id,
            project_id: content.project_id,
            creator_id: content.creator_id,
            title: content.title.clone(),
            primary_type: content.primary_type.clone(),
            source_tool: content.source_tool.clone(),
            created_at: content.created_at,
            latest_version_id: content.latest_version_id,
            latest_version_number: latest.map(|v| v.version_number),
            latest_prompt: latest.and_then(|v| v.prompt.clone()),
        }
    }
}

impl Content {
    /// Inserts a content row with no versions
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateContent,
    ) -> Result<Self, sqlx::Error> {
        let content = sqlx::query_as::<_, Content>(
            r#"
            INSERT INTO contents (project_id, creator_id, title, primary_type, source_tool)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, project_id, creator_id, latest_version_id, title,
                      primary_type, source_tool, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.creator_id)
        .bind(data.title)
        .bind(data.primary_type)
        .bind(data.source_tool)
        .fetch_one(executor)
        .await?;

        Ok(content)
    }

    /// Finds a content item by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let content = sqlx::query_as::<_, Content>(
            r#"
            SELECT id, project_id, creator_id, latest_version_id, title,
                   primary_type, source_tool, created_at
            FROM contents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(content)
    }

    /// Locks the content row until the surrounding transaction ends
    ///
    /// Appends take this lock before reading the current maximum version number,
    /// so two appends to the same content run one after the other.
    pub async fn lock_for_update(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let content = sqlx::query_as::<_, Content>(
            r#"
            SELECT id, project_id, creator_id, latest_version_id, title,
                   primary_type, source_tool, created_at
            FROM contents
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(content)
    }

    /// Moves the latest pointer to `version_id`
    pub async fn set_latest_version(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        version_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let content = sqlx::query_as::<_, Content>(
            r#"
            UPDATE contents
            SET latest_version_id = $2
            WHERE id = $1
            RETURNING id, project_id, creator_id, latest_version_id, title,
                      primary_type, source_tool, created_at
            "#,
        )
        .bind(id)
        .bind(version_id)
        .fetch_one(executor)
        .await?;

        Ok(content)
    }

    /// Lists a project's content with latest version info, newest first
    pub async fn list_by_project(
        executor: impl PgExecutor<'_>,
        project_id: Uuid,
    ) -> Result<Vec<ContentSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ContentSummary>(
            r#"
            SELECT c.id, c.project_id, c.creator_id, c.title, c.primary_type,
                   c.source_tool, c.created_at, c.latest_version_id,
                   v.version_number AS latest_version_number,
                   v.prompt AS latest_prompt
            FROM contents c
            LEFT JOIN content_versions v ON v.id = c.latest_version_id
            WHERE c.project_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Keyword search over title and latest prompt within the given projects
    ///
    /// Matching is a case-insensitive substring test. `strpos` is used rather
    /// than `ILIKE` so `%` and `_` in the query match literally.
    pub async fn search(
        executor: impl PgExecutor<'_>,
        project_ids: &[Uuid],
        query: &str,
        limit: i64,
    ) -> Result<Vec<ContentSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ContentSummary>(
            r#"
            SELECT c.id, c.project_id, c.creator_id, c.title, c.primary_type,
                   c.source_tool, c.created_at, c.latest_version_id,
                   v.version_number AS latest_version_number,
                   v.prompt AS latest_prompt
            FROM contents c
            LEFT JOIN content_versions v ON v.id = c.latest_version_id
            WHERE c.project_id = ANY($1)
              AND (strpos(lower(c.title), lower($2)) > 0
                   OR strpos(lower(coalesce(v.prompt, '')), lower($2)) > 0)
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $3
            "#,
        )
        .bind(project_ids)
        .bind(query)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Lists content linked to a tag, restricted to the given projects
    pub async fn list_by_tag(
        executor: impl PgExecutor<'_>,
        tag_id: Uuid,
        project_ids: &[Uuid],
    ) -> Result<Vec<ContentSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ContentSummary>(
            r#"
            SELECT c.id, c.project_id, c.creator_id, c.title, c.primary_type,
                   c.source_tool, c.created_at, c.latest_version_id,
                   v.version_number AS latest_version_number,
                   v.prompt AS latest_prompt
            FROM content_tags ct
            JOIN contents c ON c.id = ct.content_id
            LEFT JOIN content_versions v ON v.id = c.latest_version_id
            WHERE ct.tag_id = $1 AND c.project_id = ANY($2)
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(tag_id)
        .bind(project_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}
