/// Database models for Strata
///
/// Each model carries its row type, its input types and the SQL that reads and
/// writes it. Methods take any `PgExecutor`, so they run equally on a pool or
/// inside a transaction opened by [`crate::store::PgStore`].
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `project`: Projects, the unit of multi-tenancy
/// - `membership`: User-project relationships with roles
/// - `content`: Content items and their latest-version pointer
/// - `version`: Append-only content versions
/// - `tag`: Global tags and content-tag links
///
/// # Example
///
/// ```no_run
/// use strata_shared::models::user::{User, CreateUser};
/// use strata_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     username: "writer".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod content;
pub mod membership;
pub mod project;
pub mod tag;
pub mod user;
pub mod version;
