/// Tag index: global labels and content tagging
///
/// Tags are shared across projects. Reading or changing the tags of a content
/// item is gated by membership in the content's project, and listing the
/// content behind a tag only shows projects the caller belongs to.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{content::load_authorized, ServiceError, ServiceResult};
use crate::auth::authorization::member_project_ids;
use crate::models::{
    content::ContentSummary,
    tag::{clean_tag_name, dedupe_tag_names, Tag},
};
use crate::store::Store;

const MAX_TAG_LEN: usize = 100;

/// A tag with the member-visible content carrying it
#[derive(Debug, Clone, Serialize)]
pub struct TaggedContents {
    pub tag: Tag,
    pub contents: Vec<ContentSummary>,
}

fn check_tag_len(name: &str) -> ServiceResult<()> {
    if name.chars().count() > MAX_TAG_LEN {
        return Err(ServiceError::validation(
            "name",
            format!("Tag names must be at most {} characters", MAX_TAG_LEN),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct TagIndex {
    store: Arc<dyn Store>,
}

impl TagIndex {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the tag matching `name` ignoring case, creating it if needed
    ///
    /// The flag is `true` if the tag was created by this call. An existing tag
    /// keeps its original spelling and creator.
    pub async fn find_or_create(&self, name: &str, creator: Option<Uuid>) -> ServiceResult<(Tag, bool)> {
        let name = clean_tag_name(name)
            .ok_or_else(|| ServiceError::validation("name", "Tag name is required"))?;
        check_tag_len(name)?;

        let (tag, created) = self.store.find_or_create_tag(name, creator).await?;
        if created {
            info!(tag_id = %tag.id, name = %tag.name, "Tag created");
        }
        Ok((tag, created))
    }

    /// All tags ordered by name, optionally filtered by substring
    pub async fn list_tags(&self, filter: Option<&str>) -> ServiceResult<Vec<Tag>> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        Ok(self.store.list_tags(filter).await?)
    }

    /// Tags a content item with each distinct name in `names`
    ///
    /// Names are trimmed, blanks are skipped and case-insensitive duplicates
    /// collapse onto their first spelling. The returned tags follow that
    /// first-seen order.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the content is missing
    /// - `Forbidden` if the caller is not a member of its project
    /// - `Validation` if `names` is empty or holds only blank names
    pub async fn attach_tags(
        &self,
        actor: Uuid,
        content_id: Uuid,
        names: &[String],
    ) -> ServiceResult<Vec<Tag>> {
        load_authorized(self.store.as_ref(), actor, content_id).await?;

        if names.is_empty() {
            return Err(ServiceError::validation("tags", "At least one tag is required"));
        }

        let names = dedupe_tag_names(names);
        if names.is_empty() {
            return Err(ServiceError::validation("tags", "Tag names must not be blank"));
        }
        for name in &names {
            check_tag_len(name)?;
        }

        let tags = self.store.attach_tags(content_id, &names, Some(actor)).await?;
        info!(content_id = %content_id, count = tags.len(), "Tags attached");
        Ok(tags)
    }

    /// Tags of a content item, ordered by name
    pub async fn list_tags_for_content(&self, actor: Uuid, content_id: Uuid) -> ServiceResult<Vec<Tag>> {
        load_authorized(self.store.as_ref(), actor, content_id).await?;
        Ok(self.store.list_tags_for_content(content_id).await?)
    }

    /// Content carrying a tag, restricted to the caller's projects
    pub async fn list_contents_for_tag(&self, actor: Uuid, tag_id: Uuid) -> ServiceResult<TaggedContents> {
        let tag = self
            .store
            .find_tag(tag_id)
            .await?
            .ok_or(ServiceError::NotFound("tag"))?;

        let project_ids = member_project_ids(self.store.as_ref(), actor).await?;
        let contents = if project_ids.is_empty() {
            Vec::new()
        } else {
            self.store.list_contents_for_tag(tag_id, &project_ids).await?
        };

        Ok(TaggedContents { tag, contents })
    }
}
