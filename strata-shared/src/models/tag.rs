/// Tag model and database operations
///
/// Tags are global labels shared by all projects. Names are unique without
/// regard to case, enforced by a unique index on `LOWER(name)`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX idx_tags_name_lower ON tags (LOWER(name));
///
/// CREATE TABLE content_tags (
///     content_id UUID NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
///     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (content_id, tag_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Global label
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Trims a tag name, returning `None` if nothing is left
pub fn clean_tag_name(name: &str) -> Option<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Trims names, drops blanks and removes case-insensitive duplicates
///
/// The first spelling of each name wins and input order is kept.
///
/// ```
/// use strata_shared::models::tag::dedupe_tag_names;
///
/// let names = vec!["a".to_string(), "A".to_string(), " b ".to_string(), "".to_string()];
/// assert_eq!(dedupe_tag_names(&names), vec!["a", "b"]);
/// ```
pub fn dedupe_tag_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for name in names {
        if let Some(cleaned) = clean_tag_name(name) {
            if seen.insert(cleaned.to_lowercase()) {
                out.push(cleaned.to_string());
            }
        }
    }

    out
}

impl Tag {
    /// Finds a tag by name, ignoring case
    pub async fn find_by_name(
        executor: impl PgExecutor<'_>,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_by, created_at
            FROM tags
            WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(tag)
    }

    /// Inserts a tag unless one with the same lowercased name exists
    ///
    /// Returns `None` when another writer got there first; the caller then
    /// re-reads with [`Tag::find_by_name`].
    pub async fn insert_if_absent(
        executor: impl PgExecutor<'_>,
        name: &str,
        created_by: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, created_by)
            VALUES ($1, $2)
            ON CONFLICT ((LOWER(name))) DO NOTHING
            RETURNING id, name, created_by, created_at
            "#,
        )
        .bind(name)
        .bind(created_by)
        .fetch_optional(executor)
        .await?;

        Ok(tag)
    }

    /// Finds a tag by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_by, created_at
            FROM tags
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(tag)
    }

    /// Lists tags ordered by name, optionally filtered by a substring
    pub async fn list(
        executor: impl PgExecutor<'_>,
        filter: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, created_by, created_at
            FROM tags
            WHERE $1::TEXT IS NULL OR strpos(lower(name), lower($1)) > 0
            ORDER BY lower(name) ASC
            "#,
        )
        .bind(filter)
        .fetch_all(executor)
        .await?;

        Ok(tags)
    }

    /// Links a tag to a content item; linking twice is a no-op
    pub async fn link(
        executor: impl PgExecutor<'_>,
        content_id: Uuid,
        tag_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO content_tags (content_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(content_id)
        .bind(tag_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Lists the tags linked to a content item, ordered by name
    pub async fn list_for_content(
        executor: impl PgExecutor<'_>,
        content_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.created_by, t.created_at
            FROM content_tags ct
            JOIN tags t ON t.id = ct.tag_id
            WHERE ct.content_id = $1
            ORDER BY lower(t.name) ASC
            "#,
        )
        .bind(content_id)
        .fetch_all(executor)
        .await?;

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_tag_name() {
        assert_eq!(clean_tag_name("  demo "), Some("demo"));
        assert_eq!(clean_tag_name("   "), None);
        assert_eq!(clean_tag_name(""), None);
    }

    #[test]
    fn test_dedupe_keeps_first_spelling() {
        let names = vec!["a".to_string(), "a".to_string(), " a ".to_string()];
        assert_eq!(dedupe_tag_names(&names), vec!["a"]);

        let names = vec!["Demo".to_string(), "demo".to_string(), "other".to_string()];
        assert_eq!(dedupe_tag_names(&names), vec!["Demo", "other"]);
    }

    #[test]
    fn test_dedupe_all_blank() {
        let names = vec![" ".to_string(), "".to_string()];
        assert!(dedupe_tag_names(&names).is_empty());
    }
}
