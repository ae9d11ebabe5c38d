//! Diesel row types and their conversions to/from `publisher_core` domain
//! types.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use publisher_core::{
    MediaAsset, MediaAssetId, MediaType, OptionValue, Platform, PlatformCredentials,
    PlatformTarget, Post, PostId, PostMediaLink, PostStatus, PublishAttempt, AttemptId, TargetId,
    TargetStatus,
};
use publisher_error::{StoreError, StoreErrorKind};
use uuid::Uuid;

use crate::schema::{media_assets, platform_credentials, post_media, post_platform_targets, posts, publish_attempts};

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = posts)]
pub struct PostRow {
    pub id: Uuid,
    pub base_content: String,
    pub scheduled_at_utc: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRow {
    pub fn from_domain(post: &Post) -> Self {
        Self {
            id: post.id.0,
            base_content: post.base_content.clone(),
            scheduled_at_utc: post.scheduled_at_utc,
            status: post.status.to_string(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    pub fn into_domain(self) -> Result<Post, StoreError> {
        Ok(Post {
            id: PostId(self.id),
            base_content: self.base_content,
            scheduled_at_utc: self.scheduled_at_utc,
            status: parse_post_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            targets: Vec::new(),
            media: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = post_platform_targets)]
pub struct TargetRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub platform: String,
    pub override_content: Option<String>,
    pub override_media_refs: Option<serde_json::Value>,
    pub override_options: Option<serde_json::Value>,
    pub publish_status: String,
    pub remote_post_id: Option<String>,
    pub failure_reason: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TargetRow {
    pub fn from_domain(target: &PlatformTarget) -> Result<Self, StoreError> {
        let override_media_refs = match &target.override_media_refs {
            Some(refs) => {
                let ids: Vec<String> = refs.iter().map(|id| id.0.to_string()).collect();
                Some(serde_json::to_value(ids)?)
            }
            None => None,
        };
        let override_options = match &target.override_options {
            Some(opts) => Some(serde_json::to_value(opts)?),
            None => None,
        };
        Ok(Self {
            id: target.id.0,
            post_id: target.post_id.0,
            platform: target.platform.to_string(),
            override_content: target.override_content.clone(),
            override_media_refs,
            updated_at: Utc::now(),
            override_options,
            publish_status: target.publish_status.to_string(),
            remote_post_id: target.remote_post_id.clone(),
            failure_reason: target.failure_reason.clone(),
            last_attempt_at: target.last_attempt_at,
        })
    }

    pub fn into_domain(self) -> Result<PlatformTarget, StoreError> {
        let override_media_refs = match self.override_media_refs {
            Some(value) => {
                let ids: Vec<String> = serde_json::from_value(value)?;
                let parsed: Result<Vec<MediaAssetId>, _> = ids
                    .iter()
                    .map(|s| Uuid::parse_str(s).map(MediaAssetId))
                    .collect();
                Some(parsed.map_err(|e| {
                    StoreError::new(StoreErrorKind::Serialization(e.to_string()))
                })?)
            }
            None => None,
        };
        let override_options: Option<HashMap<String, OptionValue>> = match self.override_options {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        };
        Ok(PlatformTarget {
            id: TargetId(self.id),
            post_id: PostId(self.post_id),
            platform: parse_platform(&self.platform)?,
            override_content: self.override_content,
            override_media_refs,
            override_options,
            publish_status: parse_target_status(&self.publish_status)?,
            remote_post_id: self.remote_post_id,
            failure_reason: self.failure_reason,
            last_attempt_at: self.last_attempt_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = publish_attempts)]
pub struct AttemptRow {
    pub id: Uuid,
    pub target_id: Uuid,
    pub attempted_at: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
}

impl AttemptRow {
    pub fn from_domain(attempt: &PublishAttempt) -> Self {
        Self {
            id: attempt.id.0,
            target_id: attempt.target_id.0,
            attempted_at: attempt.attempted_at,
            success: attempt.success,
            error_message: attempt.error_message.clone(),
            error_code: attempt.error_code.clone(),
        }
    }

    pub fn into_domain(self) -> PublishAttempt {
        PublishAttempt {
            id: AttemptId(self.id),
            target_id: TargetId(self.target_id),
            attempted_at: self.attempted_at,
            success: self.success,
            error_message: self.error_message,
            error_code: self.error_code,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = media_assets)]
pub struct MediaAssetRow {
    pub id: Uuid,
    pub media_type: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub duration_seconds: Option<f32>,
    pub file_hash: String,
    pub original_filename: String,
}

impl MediaAssetRow {
    pub fn into_domain(self) -> Result<MediaAsset, StoreError> {
        Ok(MediaAsset {
            id: MediaAssetId(self.id),
            media_type: MediaType::from_str(&self.media_type)
                .map_err(|_| StoreError::new(StoreErrorKind::Serialization(format!("unknown media type {}", self.media_type))))?,
            storage_path: self.storage_path,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes as u64,
            duration_seconds: self.duration_seconds,
            file_hash: self.file_hash,
            original_filename: self.original_filename,
        })
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = post_media)]
pub struct PostMediaRow {
    pub post_id: Uuid,
    pub media_asset_id: Uuid,
    pub sort_order: i32,
}

impl PostMediaRow {
    pub fn from_domain(link: &PostMediaLink) -> Self {
        Self {
            post_id: link.post_id.0,
            media_asset_id: link.media_asset_id.0,
            sort_order: link.sort_order,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = platform_credentials)]
pub struct CredentialsRow {
    pub platform: String,
    pub values_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialsRow {
    pub fn into_domain(self) -> Result<PlatformCredentials, StoreError> {
        let values: HashMap<String, String> = serde_json::from_str(&self.values_json)?;
        Ok(PlatformCredentials {
            platform: parse_platform(&self.platform)?,
            values,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub fn parse_platform(s: &str) -> Result<Platform, StoreError> {
    Platform::from_str(s)
        .map_err(|_| StoreError::new(StoreErrorKind::Serialization(format!("unknown platform {s}"))))
}

pub fn parse_post_status(s: &str) -> Result<PostStatus, StoreError> {
    PostStatus::from_str(s)
        .map_err(|_| StoreError::new(StoreErrorKind::Serialization(format!("unknown post status {s}"))))
}

pub fn parse_target_status(s: &str) -> Result<TargetStatus, StoreError> {
    TargetStatus::from_str(s)
        .map_err(|_| StoreError::new(StoreErrorKind::Serialization(format!("unknown target status {s}"))))
}
