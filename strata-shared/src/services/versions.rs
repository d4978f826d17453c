/// Version chain: append-only, gap-free version numbers per content item
///
/// Number assignment and the latest-pointer move happen inside the store's
/// unit of work; this service only resolves the content and gates access.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::{content::load_authorized, ServiceResult};
use crate::models::version::{NewVersion, Version};
use crate::store::Store;

#[derive(Clone)]
pub struct VersionChain {
    store: Arc<dyn Store>,
}

impl VersionChain {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Appends the next version to a content item
    ///
    /// Concurrent appends to the same content are serialized by the store, so
    /// each receives a distinct number and the latest pointer ends on the
    /// highest one.
    pub async fn append_version(
        &self,
        actor: Uuid,
        content_id: Uuid,
        prompt: Option<String>,
        file_url: Option<String>,
    ) -> ServiceResult<Version> {
        load_authorized(self.store.as_ref(), actor, content_id).await?;

        let (_, version) = self
            .store
            .append_version(
                content_id,
                NewVersion {
                    created_by: Some(actor),
                    prompt,
                    file_url,
                },
            )
            .await?;

        info!(
            content_id = %content_id,
            version_number = version.version_number,
            "Version appended"
        );
        Ok(version)
    }

    /// Versions of a content item, highest number first
    pub async fn list_versions(&self, actor: Uuid, content_id: Uuid) -> ServiceResult<Vec<Version>> {
        load_authorized(self.store.as_ref(), actor, content_id).await?;
        Ok(self.store.list_versions(content_id).await?)
    }
}
