use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::content::OptionValue;
use crate::ids::{AttemptId, MediaAssetId, PostId, TargetId};
use crate::platform::Platform;
use crate::status::{PostStatus, TargetStatus};

/// A scheduled post: shared body and media plus a set of per-platform
/// targets.
#[derive(Debug, Clone)]
pub struct Post {
    /// Opaque identifier.
    pub id: PostId,
    /// Shared body text, used by any target without an override.
    pub base_content: String,
    /// Absolute UTC instant the post becomes due.
    pub scheduled_at_utc: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: PostStatus,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last-modified instant.
    pub updated_at: DateTime<Utc>,
    /// This post's per-platform publication plans.
    pub targets: Vec<PlatformTarget>,
    /// This post's ordered base media, already joined and sorted by
    /// `sort_order`.
    pub media: Vec<MediaAsset>,
}

/// One platform's publication plan for one post.
#[derive(Debug, Clone)]
pub struct PlatformTarget {
    /// Opaque identifier.
    pub id: TargetId,
    /// The post this target belongs to.
    pub post_id: PostId,
    /// Which platform this target publishes to.
    pub platform: Platform,
    /// Replaces `base_content` when non-empty after trimming.
    pub override_content: Option<String>,
    /// Replaces the post's base media, in this order, when non-empty.
    pub override_media_refs: Option<Vec<MediaAssetId>>,
    /// Per-platform tunables (e.g. Mastodon `visibility`).
    pub override_options: Option<HashMap<String, OptionValue>>,
    /// Current lifecycle status.
    pub publish_status: TargetStatus,
    /// Opaque identifier returned by the remote once published.
    pub remote_post_id: Option<String>,
    /// Human-readable reason for the most recent failure, truncated to
    /// 500 characters.
    pub failure_reason: Option<String>,
    /// When the most recent publish attempt started.
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// One execution of the publish pipeline against one target.
///
/// Append-only: attempts are never modified or deleted once written.
#[derive(Debug, Clone)]
pub struct PublishAttempt {
    /// Opaque identifier.
    pub id: AttemptId,
    /// The target this attempt was made against.
    pub target_id: TargetId,
    /// When this attempt ran.
    pub attempted_at: DateTime<Utc>,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Error message, truncated to 500 characters. Empty on success.
    pub error_message: Option<String>,
    /// Stable short error code (e.g. `VALIDATION_FAILED`). Empty on success.
    pub error_code: Option<String>,
}

/// The kind of media a [`MediaAsset`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// A still image.
    Image,
    /// A video clip.
    Video,
}

/// A media file in the library, addressable by multiple posts.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    /// Opaque identifier.
    pub id: MediaAssetId,
    /// Image or video.
    pub media_type: MediaType,
    /// Local filesystem path, rooted at the configured media storage path.
    pub storage_path: String,
    /// MIME type as reported at ingestion.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Duration, for video assets.
    pub duration_seconds: Option<f32>,
    /// Content hash, used for dedup by the (external) ingestion layer.
    pub file_hash: String,
    /// The filename as uploaded, for display purposes only.
    pub original_filename: String,
}

/// One row in a post's ordered media list.
#[derive(Debug, Clone, Copy)]
pub struct PostMediaLink {
    /// The post being linked.
    pub post_id: PostId,
    /// The media asset being linked.
    pub media_asset_id: MediaAssetId,
    /// Position in the post's ordered media list.
    pub sort_order: i32,
}

/// Stored credentials for one platform.
///
/// The value map is opaque to the core: each adapter defines and
/// interprets its own keys (e.g. `{bot_token, channel_id}` for Telegram).
#[derive(Debug, Clone)]
pub struct PlatformCredentials {
    /// Which platform these credentials are for.
    pub platform: Platform,
    /// Credential key/value pairs.
    pub values: HashMap<String, String>,
    /// When these credentials were first stored.
    pub created_at: DateTime<Utc>,
    /// When these credentials were last updated.
    pub updated_at: DateTime<Utc>,
}
