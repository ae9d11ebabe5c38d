//! In-process [`Store`] implementation.
//!
//! Used as the local/dev fallback when no `DATABASE_URL` is configured, and
//! as the backing for unit/integration tests elsewhere in the workspace.
//! Not persisted across restarts.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use publisher_core::{
    MediaAsset, Platform, PlatformCredentials, PlatformTarget, Post, PostId, PostStatus,
    PublishAttempt, TargetId, TargetStatus,
};
use publisher_error::{StoreError, StoreErrorKind};

use crate::store::{NewPost, PostPatch, Store, StoreResult, TargetPatch};

#[derive(Default)]
struct Inner {
    posts: HashMap<PostId, Post>,
    attempts: Vec<PublishAttempt>,
    media: HashMap<uuid::Uuid, MediaAsset>,
    credentials: HashMap<Platform, PlatformCredentials>,
}

/// An in-memory [`Store`], guarded by a single `RwLock`.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Seed the store with a pre-built media asset, for fixtures and tests.
    pub fn insert_media(&self, asset: MediaAsset) {
        self.inner.write().unwrap().media.insert(asset.id.0, asset);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn claim_due_posts(&self, now: DateTime<Utc>) -> StoreResult<Vec<PostId>> {
        let mut inner = self.inner.write().unwrap();
        let mut claimed = Vec::new();
        for post in inner.posts.values_mut() {
            let due = matches!(post.status, PostStatus::Scheduled | PostStatus::PartiallyPublished)
                && post.scheduled_at_utc <= now;
            if due {
                post.status = PostStatus::Publishing;
                post.updated_at = now;
                claimed.push(post.id);
            }
        }
        Ok(claimed)
    }

    async fn load_post(&self, id: PostId) -> StoreResult<Post> {
        self.get_post(id).await
    }

    async fn update_target(&self, id: TargetId, patch: TargetPatch) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let target = find_target_mut(&mut inner.posts, id)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound))?;
        if let Some(status) = patch.publish_status {
            target.publish_status = status;
        }
        if let Some(remote_post_id) = patch.remote_post_id {
            target.remote_post_id = Some(remote_post_id);
        }
        if let Some(failure_reason) = patch.failure_reason {
            target.failure_reason = Some(failure_reason);
        }
        if let Some(last_attempt_at) = patch.last_attempt_at {
            target.last_attempt_at = Some(last_attempt_at);
        }
        Ok(())
    }

    async fn append_attempt(&self, attempt: PublishAttempt) -> StoreResult<()> {
        self.inner.write().unwrap().attempts.push(attempt);
        Ok(())
    }

    async fn count_attempts(&self, target_id: TargetId) -> StoreResult<u32> {
        let inner = self.inner.read().unwrap();
        Ok(inner.attempts.iter().filter(|a| a.target_id == target_id).count() as u32)
    }

    async fn set_post_status(&self, id: PostId, status: PostStatus) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let post = inner
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound))?;
        post.status = status;
        post.updated_at = Utc::now();
        Ok(())
    }

    async fn get_credentials(&self, platform: Platform) -> StoreResult<Option<PlatformCredentials>> {
        Ok(self.inner.read().unwrap().credentials.get(&platform).cloned())
    }

    async fn put_credentials(&self, platform: Platform, values: HashMap<String, String>) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let now = Utc::now();
        let created_at = inner
            .credentials
            .get(&platform)
            .map(|c| c.created_at)
            .unwrap_or(now);
        inner.credentials.insert(
            platform,
            PlatformCredentials {
                platform,
                values,
                created_at,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn delete_credentials(&self, platform: Platform) -> StoreResult<()> {
        self.inner.write().unwrap().credentials.remove(&platform);
        Ok(())
    }

    async fn list_configured_platforms(&self) -> StoreResult<Vec<Platform>> {
        Ok(self.inner.read().unwrap().credentials.keys().copied().collect())
    }

    async fn create_post(&self, new_post: NewPost) -> StoreResult<PostId> {
        let mut inner = self.inner.write().unwrap();
        let now = Utc::now();
        let post_id = PostId::new();

        let media = new_post
            .media_ids
            .iter()
            .filter_map(|id| inner.media.get(&id.0).cloned())
            .collect::<Vec<_>>();

        let targets = new_post
            .targets
            .into_iter()
            .map(|t| PlatformTarget {
                id: TargetId::new(),
                post_id,
                platform: t.platform,
                override_content: t.override_content,
                override_media_refs: t.override_media_refs,
                override_options: t.override_options,
                publish_status: TargetStatus::Pending,
                remote_post_id: None,
                failure_reason: None,
                last_attempt_at: None,
            })
            .collect();

        inner.posts.insert(
            post_id,
            Post {
                id: post_id,
                base_content: new_post.base_content,
                scheduled_at_utc: new_post.scheduled_at_utc,
                status: PostStatus::Scheduled,
                created_at: now,
                updated_at: now,
                targets,
                media,
            },
        );
        Ok(post_id)
    }

    async fn update_post(&self, id: PostId, patch: PostPatch) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let media_lookup = inner.media.clone();
        let post = inner
            .posts
            .get_mut(&id)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound))?;
        if !matches!(post.status, PostStatus::Scheduled) {
            return Err(StoreError::new(StoreErrorKind::Query(
                "post is not in scheduled status".to_string(),
            )));
        }
        if let Some(base_content) = patch.base_content {
            post.base_content = base_content;
        }
        if let Some(scheduled_at_utc) = patch.scheduled_at_utc {
            post.scheduled_at_utc = scheduled_at_utc;
        }
        if let Some(media_ids) = patch.media_ids {
            post.media = media_ids
                .iter()
                .filter_map(|id| media_lookup.get(&id.0).cloned())
                .collect();
        }
        if let Some(targets) = patch.targets {
            post.targets = targets
                .into_iter()
                .map(|t| PlatformTarget {
                    id: TargetId::new(),
                    post_id: id,
                    platform: t.platform,
                    override_content: t.override_content,
                    override_media_refs: t.override_media_refs,
                    override_options: t.override_options,
                    publish_status: TargetStatus::Pending,
                    remote_post_id: None,
                    failure_reason: None,
                    last_attempt_at: None,
                })
                .collect();
        }
        post.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        let target_ids: Vec<TargetId> = inner
            .posts
            .get(&id)
            .map(|p| p.targets.iter().map(|t| t.id).collect())
            .unwrap_or_default();
        inner.attempts.retain(|a| !target_ids.contains(&a.target_id));
        inner.posts.remove(&id);
        Ok(())
    }

    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        Ok(self.inner.read().unwrap().posts.values().cloned().collect())
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Post> {
        self.inner
            .read()
            .unwrap()
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound))
    }

    async fn get_media_assets(&self, ids: &[publisher_core::MediaAssetId]) -> StoreResult<Vec<MediaAsset>> {
        let inner = self.inner.read().unwrap();
        Ok(ids.iter().filter_map(|id| inner.media.get(&id.0).cloned()).collect())
    }

    async fn list_stuck_publishing(&self, older_than: DateTime<Utc>) -> StoreResult<Vec<PostId>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .posts
            .values()
            .filter(|p| p.status == PostStatus::Publishing && p.updated_at < older_than)
            .map(|p| p.id)
            .collect())
    }
}

fn find_target_mut(posts: &mut HashMap<PostId, Post>, target_id: TargetId) -> Option<&mut PlatformTarget> {
    posts
        .values_mut()
        .flat_map(|p| p.targets.iter_mut())
        .find(|t| t.id == target_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claim_due_posts_is_idempotent_under_concurrent_claims() {
        let store = InMemoryStore::new();
        let post_id = store
            .create_post(NewPost {
                base_content: "hello".into(),
                scheduled_at_utc: Utc::now() - chrono::Duration::seconds(1),
                media_ids: vec![],
                targets: vec![],
            })
            .await
            .unwrap();

        let now = Utc::now();
        let first = store.claim_due_posts(now).await.unwrap();
        assert_eq!(first, vec![post_id]);

        let second = store.claim_due_posts(now).await.unwrap();
        assert!(second.is_empty(), "a post already publishing must not be re-claimed");
    }

    #[tokio::test]
    async fn count_attempts_never_decreases() {
        let store = InMemoryStore::new();
        let target_id = TargetId::new();
        assert_eq!(store.count_attempts(target_id).await.unwrap(), 0);
        store
            .append_attempt(PublishAttempt {
                id: publisher_core::AttemptId::new(),
                target_id,
                attempted_at: Utc::now(),
                success: false,
                error_message: Some("boom".into()),
                error_code: Some("TIMEOUT".into()),
            })
            .await
            .unwrap();
        assert_eq!(store.count_attempts(target_id).await.unwrap(), 1);
    }
}
