/// Version model and database operations
///
/// Versions form an append-only chain per content item. Numbers start at 1 and
/// grow by one with no gaps. Rows are never updated; a trigger rejects any
/// change to their content fields.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE content_versions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     content_id UUID NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     version_number INTEGER NOT NULL CHECK (version_number >= 1),
///     prompt TEXT,
///     file_url TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (content_id, version_number)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Immutable snapshot of a content item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Version {
    /// Unique version ID
    pub id: Uuid,

    /// Content this version belongs to
    pub content_id: Uuid,

    /// Author of the version
    pub created_by: Option<Uuid>,

    /// Position in the chain, starting at 1
    pub version_number: i32,

    /// Prompt text
    pub prompt: Option<String>,

    /// Reference to an externally stored file
    pub file_url: Option<String>,

    /// When the version was appended
    pub created_at: DateTime<Utc>,
}

/// Input for appending a version
///
/// The version number is not part of the input; the store assigns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVersion {
    pub created_by: Option<Uuid>,
    pub prompt: Option<String>,
    pub file_url: Option<String>,
}

impl Version {
    /// Inserts a version row with an already assigned number
    ///
    /// Callers must hold the content row lock (see
    /// [`crate::models::content::Content::lock_for_update`]).
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        content_id: Uuid,
        version_number: i32,
        data: NewVersion,
    ) -> Result<Self, sqlx::Error> {
        let version = sqlx::query_as::<_, Version>(
            r#"
            INSERT INTO content_versions (content_id, created_by, version_number, prompt, file_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, content_id, created_by, version_number, prompt, file_url, created_at
            "#,
        )
        .bind(content_id)
        .bind(data.created_by)
        .bind(version_number)
        .bind(data.prompt)
        .bind(data.file_url)
        .fetch_one(executor)
        .await?;

        Ok(version)
    }

    /// Highest version number of a content item, or 0 if it has none
    pub async fn max_number(
        executor: impl PgExecutor<'_>,
        content_id: Uuid,
    ) -> Result<i32, sqlx::Error> {
        let max: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT MAX(version_number)
            FROM content_versions
            WHERE content_id = $1
            "#,
        )
        .bind(content_id)
        .fetch_one(executor)
        .await?;

        Ok(max.unwrap_or(0))
    }

    /// Finds a version by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let version = sqlx::query_as::<_, Version>(
            r#"
            SELECT id, content_id, created_by, version_number, prompt, file_url, created_at
            FROM content_versions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(version)
    }

    /// Lists versions of a content item, newest first
    pub async fn list_by_content(
        executor: impl PgExecutor<'_>,
        content_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let versions = sqlx::query_as::<_, Version>(
            r#"
            SELECT id, content_id, created_by, version_number, prompt, file_url, created_at
            FROM content_versions
            WHERE content_id = $1
            ORDER BY version_number DESC
            "#,
        )
        .bind(content_id)
        .fetch_all(executor)
        .await?;

        Ok(versions)
    }
}
