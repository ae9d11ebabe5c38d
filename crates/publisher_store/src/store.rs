use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use publisher_core::{
    MediaAsset, MediaAssetId, OptionValue, Platform, PlatformCredentials, Post, PostId,
    PostStatus, PublishAttempt, TargetId, TargetStatus,
};
use publisher_error::StoreError;

/// Convenience alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// A new post to create, as accepted from the (external) CRUD layer.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Shared body text.
    pub base_content: String,
    /// Absolute UTC instant the post becomes due.
    pub scheduled_at_utc: DateTime<Utc>,
    /// Ordered media asset ids to link to the post.
    pub media_ids: Vec<MediaAssetId>,
    /// Per-platform targets to create alongside the post.
    pub targets: Vec<NewTarget>,
}

/// One target to create alongside a new post.
#[derive(Debug, Clone)]
pub struct NewTarget {
    /// Which platform this target publishes to.
    pub platform: Platform,
    /// Per-target content override.
    pub override_content: Option<String>,
    /// Per-target media override, ordered.
    pub override_media_refs: Option<Vec<MediaAssetId>>,
    /// Per-target option overrides.
    pub override_options: Option<HashMap<String, OptionValue>>,
}

/// Fields that may be replaced on a still-`scheduled` post.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    /// Replacement body text.
    pub base_content: Option<String>,
    /// Replacement due instant.
    pub scheduled_at_utc: Option<DateTime<Utc>>,
    /// Replacement ordered media list, if provided.
    pub media_ids: Option<Vec<MediaAssetId>>,
    /// Replacement target set, if provided.
    pub targets: Option<Vec<NewTarget>>,
}

/// Partial update applied to one target during the publish pipeline.
#[derive(Debug, Clone, Default)]
pub struct TargetPatch {
    /// New lifecycle status.
    pub publish_status: Option<TargetStatus>,
    /// New remote post id (set on success).
    pub remote_post_id: Option<String>,
    /// New failure reason (set on failure, truncated to 500 chars by the
    /// caller before being passed here).
    pub failure_reason: Option<String>,
    /// New `last_attempt_at` instant.
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Typed persistence for posts, platform targets, media links, publish
/// attempts, and platform credentials.
///
/// Implementations must make [`Store::claim_due_posts`] an atomic
/// conditional transition so that overlapping scheduler ticks claim
/// disjoint sets of posts.
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically transition every due, idle post to `publishing` and
    /// return their ids. A post is due when `status ∈ {scheduled,
    /// partially_published}` and `scheduled_at_utc <= now`. Lost races
    /// (another tick claimed it first) are silently excluded, not errored.
    async fn claim_due_posts(&self, now: DateTime<Utc>) -> StoreResult<Vec<PostId>>;

    /// Load a post with its target rows and ordered base media.
    async fn load_post(&self, id: PostId) -> StoreResult<Post>;

    /// Apply a partial update to one target, bumping its `updated_at`.
    async fn update_target(&self, id: TargetId, patch: TargetPatch) -> StoreResult<()>;

    /// Append one publish attempt. Insert-only; attempts are never
    /// updated or deleted.
    async fn append_attempt(&self, attempt: PublishAttempt) -> StoreResult<()>;

    /// Count attempts recorded against a target, for the retry gate.
    async fn count_attempts(&self, target_id: TargetId) -> StoreResult<u32>;

    /// Set a post's overall status.
    async fn set_post_status(&self, id: PostId, status: PostStatus) -> StoreResult<()>;

    /// Load a platform's stored credentials, if any.
    async fn get_credentials(&self, platform: Platform) -> StoreResult<Option<PlatformCredentials>>;

    /// Store (insert or replace) a platform's credentials.
    async fn put_credentials(&self, platform: Platform, values: HashMap<String, String>) -> StoreResult<()>;

    /// Remove a platform's stored credentials.
    async fn delete_credentials(&self, platform: Platform) -> StoreResult<()>;

    /// Platforms that currently have a credentials row. Availability
    /// (`isAvailable()`) is layered on top by the adapter registry, not
    /// decided here.
    async fn list_configured_platforms(&self) -> StoreResult<Vec<Platform>>;

    /// Create a post, its targets, and its media links in one transaction.
    ///
    /// Does not itself check that every target's platform is configured —
    /// that is a registry-level concern. Callers must reject the request
    /// before reaching this method if any target names a platform outside
    /// `AdapterRegistry::list_configured`.
    async fn create_post(&self, new_post: NewPost) -> StoreResult<PostId>;

    /// Replace a still-`scheduled` post's fields, targets, and media
    /// links in one transaction.
    async fn update_post(&self, id: PostId, patch: PostPatch) -> StoreResult<()>;

    /// Delete a post, cascading to its targets, media links, and attempts.
    async fn delete_post(&self, id: PostId) -> StoreResult<()>;

    /// List every post with its targets and media, for the CRUD layer.
    async fn list_posts(&self) -> StoreResult<Vec<Post>>;

    /// Read one post with its targets and media, for the CRUD layer.
    async fn get_post(&self, id: PostId) -> StoreResult<Post>;

    /// Look up media assets by id, in the library at large (not just those
    /// linked to one post). Used to resolve a target's
    /// `override_media_refs`. Missing ids are silently omitted.
    async fn get_media_assets(&self, ids: &[MediaAssetId]) -> StoreResult<Vec<MediaAsset>>;

    /// Ids of posts stuck in `publishing` since before `older_than`: a
    /// process crash mid-pass leaves no automatic recovery path, so the
    /// scheduler sweeps for these before each claim.
    async fn list_stuck_publishing(&self, older_than: DateTime<Utc>) -> StoreResult<Vec<PostId>>;
}
