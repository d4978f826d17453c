/// Search facade: keyword lookup scoped to the caller's projects
///
/// Matches the query as a case-insensitive substring of the content title or
/// of its latest version's prompt. `%` and `_` match themselves.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::member_project_ids;
use crate::models::content::ContentSummary;
use crate::store::Store;

/// Maximum number of search hits returned
pub const SEARCH_LIMIT: usize = 50;

#[derive(Clone)]
pub struct SearchFacade {
    store: Arc<dyn Store>,
}

impl SearchFacade {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Newest matching content across the caller's projects, at most [`SEARCH_LIMIT`]
    ///
    /// A caller with no memberships gets an empty result.
    pub async fn search(&self, actor: Uuid, query: &str) -> ServiceResult<Vec<ContentSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::validation("q", "Search query is required"));
        }

        let project_ids = member_project_ids(self.store.as_ref(), actor).await?;
        if project_ids.is_empty() {
            debug!(user_id = %actor, "Search skipped: no memberships");
            return Ok(Vec::new());
        }

        Ok(self
            .store
            .search_contents(&project_ids, query, SEARCH_LIMIT)
            .await?)
    }
}
