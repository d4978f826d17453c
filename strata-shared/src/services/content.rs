/// Content registry: content items and their project association
///
/// Content is created either bare or together with its first version. The
/// HTTP surface only uses the second form, so content reached through the API
/// always has a latest version.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{check_len, non_blank, ServiceError, ServiceResult};
use crate::auth::authorization::require_membership;
use crate::models::{
    content::{Content, ContentSummary, CreateContent, DEFAULT_PRIMARY_TYPE},
    version::{NewVersion, Version},
};
use crate::store::Store;

const MAX_TITLE_LEN: usize = 255;
const MAX_PRIMARY_TYPE_LEN: usize = 30;
const MAX_SOURCE_TOOL_LEN: usize = 100;

/// Caller-supplied content fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContent {
    pub title: String,
    pub primary_type: Option<String>,
    pub source_tool: Option<String>,
}

/// Content with its latest version inlined
#[derive(Debug, Clone, Serialize)]
pub struct ContentDetail {
    #[serde(flatten)]
    pub content: Content,
    pub latest_version: Option<Version>,
}

/// Loads content and checks the caller may access its project
///
/// Missing content is reported before missing membership.
pub(crate) async fn load_authorized(
    store: &dyn Store,
    actor: Uuid,
    content_id: Uuid,
) -> ServiceResult<Content> {
    let content = store
        .find_content(content_id)
        .await?
        .ok_or(ServiceError::NotFound("content"))?;

    require_membership(store, content.project_id, actor).await?;
    Ok(content)
}

#[derive(Clone)]
pub struct ContentRegistry {
    store: Arc<dyn Store>,
}

impl ContentRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Checks the project exists and the caller belongs to it
    async fn authorize_project(&self, actor: Uuid, project_id: Uuid) -> ServiceResult<()> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or(ServiceError::NotFound("project"))?;

        require_membership(self.store.as_ref(), project_id, actor).await?;
        Ok(())
    }

    fn prepare(&self, actor: Uuid, project_id: Uuid, input: NewContent) -> ServiceResult<CreateContent> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(ServiceError::validation("title", "Title is required"));
        }
        check_len("title", title, MAX_TITLE_LEN)?;

        let primary_type =
            non_blank(input.primary_type).unwrap_or_else(|| DEFAULT_PRIMARY_TYPE.to_string());
        check_len("primary_type", &primary_type, MAX_PRIMARY_TYPE_LEN)?;

        let source_tool = non_blank(input.source_tool);
        if let Some(tool) = &source_tool {
            check_len("source_tool", tool, MAX_SOURCE_TOOL_LEN)?;
        }

        Ok(CreateContent {
            project_id,
            creator_id: Some(actor),
            title: title.to_string(),
            primary_type,
            source_tool,
        })
    }

    /// Creates content with no versions
    pub async fn create_content(
        &self,
        actor: Uuid,
        project_id: Uuid,
        input: NewContent,
    ) -> ServiceResult<Content> {
        self.authorize_project(actor, project_id).await?;
        let data = self.prepare(actor, project_id, input)?;

        let content = self.store.insert_content(data).await?;
        info!(content_id = %content.id, project_id = %project_id, "Content created");
        Ok(content)
    }

    /// Creates content, version 1 and the latest pointer in one unit of work
    pub async fn create_content_with_first_version(
        &self,
        actor: Uuid,
        project_id: Uuid,
        input: NewContent,
        prompt: Option<String>,
        file_url: Option<String>,
    ) -> ServiceResult<(Content, Version)> {
        self.authorize_project(actor, project_id).await?;
        let data = self.prepare(actor, project_id, input)?;

        let (content, version) = self
            .store
            .create_content_with_version(
                data,
                NewVersion {
                    created_by: Some(actor),
                    prompt,
                    file_url,
                },
            )
            .await?;

        info!(
            content_id = %content.id,
            project_id = %project_id,
            version_number = version.version_number,
            "Content created"
        );
        Ok((content, version))
    }

    /// Project content, newest first, each with its latest version number
    pub async fn list_by_project(
        &self,
        actor: Uuid,
        project_id: Uuid,
    ) -> ServiceResult<Vec<ContentSummary>> {
        self.authorize_project(actor, project_id).await?;
        Ok(self.store.list_contents_by_project(project_id).await?)
    }

    /// Loads content without an access check
    pub async fn get_by_id(&self, content_id: Uuid) -> ServiceResult<Content> {
        self.store
            .find_content(content_id)
            .await?
            .ok_or(ServiceError::NotFound("content"))
    }

    /// Loads content and its latest version for a member of its project
    pub async fn get_content(&self, actor: Uuid, content_id: Uuid) -> ServiceResult<ContentDetail> {
        let content = load_authorized(self.store.as_ref(), actor, content_id).await?;

        let latest_version = match content.latest_version_id {
            Some(version_id) => self.store.find_version(version_id).await?,
            None => None,
        };

        Ok(ContentDetail {
            content,
            latest_version,
        })
    }
}
