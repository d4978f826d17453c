/// In-memory store
///
/// All state sits in one [`MemoryState`] behind a `tokio::sync::RwLock`.
/// Reads share the lock; every write method holds the write lock for its whole
/// unit of work, which serializes version appends and makes each method atomic.
///
/// Foreign keys and uniqueness rules of the SQL schema are checked by hand so
/// both backends fail the same way.
///
/// Case-insensitive matching uses Unicode `str::to_lowercase`. PostgreSQL's
/// `lower()` follows the database collation, so tag dedup and search agree
/// with [`super::PgStore`] for ASCII and may differ for letters whose lowercase
/// mapping is locale dependent (e.g. Turkish dotted `İ`).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    content::{Content, ContentSummary, CreateContent},
    membership::{CreateMembership, Membership, ProjectRole},
    project::{CreateProject, Project},
    tag::Tag,
    user::{CreateUser, User},
    version::{NewVersion, Version},
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    memberships: Vec<Membership>,
    contents: HashMap<Uuid, Content>,
    /// Content IDs in insertion order
    content_order: Vec<Uuid>,
    /// Versions per content, ascending by number
    versions: HashMap<Uuid, Vec<Version>>,
    tags: HashMap<Uuid, Tag>,
    content_tags: Vec<(Uuid, Uuid)>,
}

impl MemoryState {
    fn membership(&self, project_id: Uuid, user_id: Uuid) -> Option<&Membership> {
        self.memberships
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
    }

    fn latest_version(&self, content: &Content) -> Option<&Version> {
        let latest_id = content.latest_version_id?;
        self.versions
            .get(&content.id)?
            .iter()
            .find(|v| v.id == latest_id)
    }

    fn summarize(&self, content: &Content) -> ContentSummary {
        ContentSummary::from_parts(content, self.latest_version(content))
    }

    /// Content matching `keep`, newest first
    fn summaries_where(&self, keep: impl Fn(&Content) -> bool) -> Vec<ContentSummary> {
        self.content_order
            .iter()
            .rev()
            .filter_map(|id| self.contents.get(id))
            .filter(|c| keep(*c))
            .map(|c| self.summarize(c))
            .collect()
    }

    fn find_tag_by_name(&self, name: &str) -> Option<&Tag> {
        let lowered = name.to_lowercase();
        self.tags.values().find(|t| t.name.to_lowercase() == lowered)
    }

    fn find_or_create_tag(&mut self, name: &str, created_by: Option<Uuid>) -> (Tag, bool) {
        if let Some(tag) = self.find_tag_by_name(name) {
            return (tag.clone(), false);
        }

        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_by,
            created_at: Utc::now(),
        };
        self.tags.insert(tag.id, tag.clone());
        (tag, true)
    }

    fn insert_content(&mut self, data: CreateContent) -> StoreResult<Content> {
        if !self.projects.contains_key(&data.project_id) {
            return Err(StoreError::NotFound("project"));
        }

        let content = Content {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            creator_id: data.creator_id,
            latest_version_id: None,
            title: data.title,
            primary_type: data.primary_type,
            source_tool: data.source_tool,
            created_at: Utc::now(),
        };

        self.contents.insert(content.id, content.clone());
        self.content_order.push(content.id);
        Ok(content)
    }

    fn append_version(&mut self, content_id: Uuid, data: NewVersion) -> StoreResult<(Content, Version)> {
        if !self.contents.contains_key(&content_id) {
            return Err(StoreError::NotFound("content"));
        }

        let chain = self.versions.entry(content_id).or_default();
        let next = chain.last().map_or(1, |v| v.version_number + 1);

        let version = Version {
            id: Uuid::new_v4(),
            content_id,
            created_by: data.created_by,
            version_number: next,
            prompt: data.prompt,
            file_url: data.file_url,
            created_at: Utc::now(),
        };
        chain.push(version.clone());

        let content = self
            .contents
            .get_mut(&content_id)
            .ok_or(StoreError::NotFound("content"))?;
        content.latest_version_id = Some(version.id);

        Ok((content.clone(), version))
    }
}

fn sort_tags(tags: &mut [Tag]) {
    tags.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Store that keeps everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deletes a membership row directly, returning whether one existed
    ///
    /// There is no service operation for this; it lets tests reach states such
    /// as a project whose owner has lost their membership.
    pub async fn remove_membership(&self, project_id: Uuid, user_id: Uuid) -> bool {
        let mut state = self.state.write().await;
        let before = state.memberships.len();
        state
            .memberships
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        state.memberships.len() != before
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            username: data.username,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_project_with_owner(
        &self,
        data: CreateProject,
    ) -> StoreResult<(Project, Membership)> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&data.owner_id) {
            return Err(StoreError::NotFound("user"));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            created_at: now,
        };
        let membership = Membership {
            project_id: project.id,
            user_id: data.owner_id,
            role: ProjectRole::Owner,
            joined_at: now,
        };

        state.projects.insert(project.id, project.clone());
        state.memberships.push(membership.clone());
        Ok((project, membership))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.state.read().await.projects.get(&id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| state.projects.get(&m.project_id).cloned())
            .collect())
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let state = self.state.read().await;
        Ok(state.membership(project_id, user_id).cloned())
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_memberships_for_project(
        &self,
        project_id: Uuid,
    ) -> StoreResult<Vec<Membership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        let mut state = self.state.write().await;

        if !state.projects.contains_key(&data.project_id) {
            return Err(StoreError::NotFound("project"));
        }
        if !state.users.contains_key(&data.user_id) {
            return Err(StoreError::NotFound("user"));
        }
        if state.membership(data.project_id, data.user_id).is_some() {
            return Err(StoreError::Conflict(
                "user is already a member of this project".to_string(),
            ));
        }

        let membership = Membership {
            project_id: data.project_id,
            user_id: data.user_id,
            role: data.role,
            joined_at: Utc::now(),
        };
        state.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn insert_content(&self, data: CreateContent) -> StoreResult<Content> {
        self.state.write().await.insert_content(data)
    }

    async fn create_content_with_version(
        &self,
        data: CreateContent,
        first: NewVersion,
    ) -> StoreResult<(Content, Version)> {
        let mut state = self.state.write().await;

        let content = state.insert_content(data)?;
        state.append_version(content.id, first)
    }

    async fn find_content(&self, id: Uuid) -> StoreResult<Option<Content>> {
        Ok(self.state.read().await.contents.get(&id).cloned())
    }

    async fn list_contents_by_project(&self, project_id: Uuid) -> StoreResult<Vec<ContentSummary>> {
        let state = self.state.read().await;
        Ok(state.summaries_where(|c| c.project_id == project_id))
    }

    async fn append_version(
        &self,
        content_id: Uuid,
        data: NewVersion,
    ) -> StoreResult<(Content, Version)> {
        self.state.write().await.append_version(content_id, data)
    }

    async fn list_versions(&self, content_id: Uuid) -> StoreResult<Vec<Version>> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .get(&content_id)
            .map(|chain| chain.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_version(&self, id: Uuid) -> StoreResult<Option<Version>> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .values()
            .flatten()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn find_or_create_tag(
        &self,
        name: &str,
        created_by: Option<Uuid>,
    ) -> StoreResult<(Tag, bool)> {
        Ok(self.state.write().await.find_or_create_tag(name, created_by))
    }

    async fn find_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        Ok(self.state.read().await.tags.get(&id).cloned())
    }

    async fn list_tags(&self, filter: Option<&str>) -> StoreResult<Vec<Tag>> {
        let state = self.state.read().await;
        let needle = filter.map(str::to_lowercase);

        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|t| match &needle {
                Some(needle) => t.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        sort_tags(&mut tags);
        Ok(tags)
    }

    async fn attach_tags(
        &self,
        content_id: Uuid,
        names: &[String],
        created_by: Option<Uuid>,
    ) -> StoreResult<Vec<Tag>> {
        let mut state = self.state.write().await;

        if !state.contents.contains_key(&content_id) {
            return Err(StoreError::NotFound("content"));
        }

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let (tag, _) = state.find_or_create_tag(name, created_by);
            if !state.content_tags.contains(&(content_id, tag.id)) {
                state.content_tags.push((content_id, tag.id));
            }
            tags.push(tag);
        }
        Ok(tags)
    }

    async fn list_tags_for_content(&self, content_id: Uuid) -> StoreResult<Vec<Tag>> {
        let state = self.state.read().await;
        let mut tags: Vec<Tag> = state
            .content_tags
            .iter()
            .filter(|(c, _)| *c == content_id)
            .filter_map(|(_, t)| state.tags.get(t).cloned())
            .collect();
        sort_tags(&mut tags);
        Ok(tags)
    }

    async fn list_contents_for_tag(
        &self,
        tag_id: Uuid,
        project_ids: &[Uuid],
    ) -> StoreResult<Vec<ContentSummary>> {
        let state = self.state.read().await;
        Ok(state.summaries_where(|c| {
            project_ids.contains(&c.project_id) && state.content_tags.contains(&(c.id, tag_id))
        }))
    }

    async fn search_contents(
        &self,
        project_ids: &[Uuid],
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<ContentSummary>> {
        let state = self.state.read().await;
        let needle = query.to_lowercase();

        let mut hits = state.summaries_where(|c| {
            if !project_ids.contains(&c.project_id) {
                return false;
            }
            let prompt_matches = state
                .latest_version(c)
                .and_then(|v| v.prompt.as_deref())
                .is_some_and(|p| p.to_lowercase().contains(&needle));
            c.title.to_lowercase().contains(&needle) || prompt_matches
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store
            .insert_user(CreateUser {
                email: email.to_string(),
                username: email.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn seed_project(store: &MemoryStore, owner: &User) -> Project {
        store
            .create_project_with_owner(CreateProject {
                name: "P".to_string(),
                description: None,
                owner_id: owner.id,
            })
            .await
            .unwrap()
            .0
    }

    fn new_content(project: &Project, title: &str) -> CreateContent {
        CreateContent {
            project_id: project.id,
            creator_id: None,
            title: title.to_string(),
            primary_type: "text".to_string(),
            source_tool: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        seed_user(&store, "a@x.com").await;

        let err = store
            .insert_user(CreateUser {
                email: "a@x.com".to_string(),
                username: "other".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_project_creation_adds_owner_membership() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let project = seed_project(&store, &owner).await;

        let membership = store.find_membership(project.id, owner.id).await.unwrap().unwrap();
        assert_eq!(membership.role, ProjectRole::Owner);

        assert!(store.remove_membership(project.id, owner.id).await);
        assert!(store.find_membership(project.id, owner.id).await.unwrap().is_none());
        assert!(!store.remove_membership(project.id, owner.id).await);
    }

    #[tokio::test]
    async fn test_content_without_version_has_null_pointer() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let project = seed_project(&store, &owner).await;

        let content = store.insert_content(new_content(&project, "Empty")).await.unwrap();
        assert!(content.latest_version_id.is_none());
        assert!(store.list_versions(content.id).await.unwrap().is_empty());

        let (content, version) = store
            .append_version(content.id, NewVersion::default())
            .await
            .unwrap();
        assert_eq!(version.version_number, 1);
        assert_eq!(content.latest_version_id, Some(version.id));
    }

    #[tokio::test]
    async fn test_append_to_missing_content() {
        let store = MemoryStore::new();
        let err = store
            .append_version(Uuid::new_v4(), NewVersion::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("content")));
    }

    #[tokio::test]
    async fn test_content_requires_existing_project() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let mut project = seed_project(&store, &owner).await;
        project.id = Uuid::new_v4();

        let err = store.insert_content(new_content(&project, "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("project")));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let project = seed_project(&store, &owner).await;

        let first = store.insert_content(new_content(&project, "first")).await.unwrap();
        let second = store.insert_content(new_content(&project, "second")).await.unwrap();

        let listed: Vec<Uuid> = store
            .list_contents_by_project(project.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_tags_are_case_insensitive_and_sorted() {
        let store = MemoryStore::new();

        let (demo, created) = store.find_or_create_tag("Demo", None).await.unwrap();
        assert!(created);
        let (again, created) = store.find_or_create_tag("demo", None).await.unwrap();
        assert!(!created);
        assert_eq!(demo.id, again.id);
        assert_eq!(again.name, "Demo");

        store.find_or_create_tag("alpha", None).await.unwrap();
        store.find_or_create_tag("Zeta", None).await.unwrap();

        let names: Vec<String> = store
            .list_tags(None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["alpha", "Demo", "Zeta"]);

        let filtered = store.list_tags(Some("EM")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, demo.id);
    }

    #[tokio::test]
    async fn test_attach_links_once() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let project = seed_project(&store, &owner).await;
        let content = store.insert_content(new_content(&project, "x")).await.unwrap();

        let names = vec!["a".to_string()];
        store.attach_tags(content.id, &names, None).await.unwrap();
        store.attach_tags(content.id, &names, None).await.unwrap();

        assert_eq!(store.list_tags_for_content(content.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let project = seed_project(&store, &owner).await;

        store.insert_content(new_content(&project, "100% done")).await.unwrap();
        store.insert_content(new_content(&project, "plain")).await.unwrap();

        let hits = store.search_contents(&[project.id], "%", 50).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% done");

        let hits = store.search_contents(&[project.id], "_", 50).await.unwrap();
        assert!(hits.is_empty());
    }
}
