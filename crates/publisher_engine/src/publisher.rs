//! The publish pipeline: `Publisher::publish_post` drives every due
//! target of one post through retry-gating, content resolution, adapter
//! dispatch, and post-status reduction.

use std::sync::Arc;

use chrono::Utc;
use publisher_adapters::AdapterRegistry;
use publisher_core::{reduce_post_status, PlatformTarget, Post, PostId, PostStatus, PublishAttempt, TargetId, TargetStatus};
use publisher_error::{PublishError, PublishErrorKind};
use publisher_store::{Store, TargetPatch};
use tracing::{info, instrument, warn};

use crate::content::resolve_effective_content;

const MAX_FAILURE_MESSAGE_LEN: usize = 500;

/// Drives posts through the publish pipeline against a store and adapter
/// registry.
pub struct Publisher {
    store: Arc<dyn Store>,
    registry: Arc<AdapterRegistry>,
    max_retries: u32,
}

impl Publisher {
    /// Build a publisher wired to a store and adapter registry.
    pub fn new(store: Arc<dyn Store>, registry: Arc<AdapterRegistry>, max_retries: u32) -> Self {
        Self { store, registry, max_retries }
    }

    /// Run the full publish pass for one post: every target with
    /// `publish_status ∈ {pending, failed}` is attempted in sequence, then
    /// the post's overall status is reduced and written back.
    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn publish_post(&self, post_id: PostId) -> Result<PostStatus, PublishError> {
        let mut post = self
            .store
            .load_post(post_id)
            .await
            .map_err(|e| PublishError::new(PublishErrorKind::StoreFailure(e.to_string())))?;

        for i in 0..post.targets.len() {
            if !matches!(post.targets[i].publish_status, TargetStatus::Pending | TargetStatus::Failed) {
                continue;
            }
            let outcome = self.run_target(&post, i).await;
            post.targets[i].publish_status = outcome;
        }

        let statuses: Vec<TargetStatus> = post.targets.iter().map(|t| t.publish_status).collect();
        let status = reduce_post_status(&statuses);

        self.store
            .set_post_status(post_id, status)
            .await
            .map_err(|e| PublishError::new(PublishErrorKind::StoreFailure(e.to_string())))?;

        info!(?status, "publish pass complete");
        Ok(status)
    }

    /// Run one target through the pipeline, returning its resulting status.
    /// Never returns an error: every failure mode is caught, recorded as a
    /// [`PublishAttempt`], and reflected in the target's stored state.
    async fn run_target(&self, post: &Post, target_index: usize) -> TargetStatus {
        let target = &post.targets[target_index];
        let target_id = target.id;

        // a. Retry gate.
        if target.publish_status == TargetStatus::Failed {
            match self.store.count_attempts(target_id).await {
                Ok(count) if count >= self.max_retries => {
                    warn!(%target_id, count, "retry cap reached, skipping");
                    return TargetStatus::Failed;
                }
                Err(e) => {
                    warn!(%target_id, error = %e, "failed to count attempts, skipping this tick");
                    return TargetStatus::Failed;
                }
                _ => {}
            }
        }

        // b. Transition to publishing.
        let now = Utc::now();
        if let Err(e) = self
            .store
            .update_target(
                target_id,
                TargetPatch {
                    publish_status: Some(TargetStatus::Publishing),
                    last_attempt_at: Some(now),
                    ..Default::default()
                },
            )
            .await
        {
            warn!(%target_id, error = %e, "failed to transition target to publishing");
            return TargetStatus::Failed;
        }

        match self.attempt(post, target).await {
            Ok(remote_post_id) => {
                self.finish(target_id, true, None, None, Some(remote_post_id)).await;
                TargetStatus::Published
            }
            Err((code, message)) => {
                self.finish(target_id, false, Some(code), Some(message), None).await;
                TargetStatus::Failed
            }
        }
    }

    /// Steps c-g: resolve content, resolve the adapter, validate, upload
    /// media, and publish. Returns the remote post id on success, or a
    /// `(code, message)` pair on any failure.
    async fn attempt(&self, post: &Post, target: &PlatformTarget) -> Result<String, (String, String)> {
        // c. Resolve effective content.
        let override_media = match &target.override_media_refs {
            Some(refs) if !refs.is_empty() => self
                .store
                .get_media_assets(refs)
                .await
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let content = resolve_effective_content(post, target, &override_media);

        // d. Resolve adapter.
        let adapter = self
            .registry
            .get_adapter(target.platform)
            .await
            .map_err(|_| ("PLATFORM_UNAVAILABLE".to_string(), "platform not configured or unavailable".to_string()))?;

        // e. Validate.
        let validation_errors = adapter.validate_post(&content);
        if !validation_errors.is_empty() {
            let message = validation_errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(("VALIDATION_FAILED".to_string(), message));
        }

        // f. Upload media, in order.
        let mut media_ids = Vec::with_capacity(content.media.len());
        for asset in &content.media {
            match adapter.upload_media(asset).await {
                Ok(id) => media_ids.push(id),
                Err(e) => {
                    let mapped = adapter.map_error(&e);
                    return Err((mapped.code, mapped.message));
                }
            }
        }

        // g. Publish.
        match adapter.publish_post(&content, &media_ids).await {
            Ok(remote_post_id) => Ok(remote_post_id),
            Err(e) => {
                let mapped = adapter.map_error(&e);
                Err((mapped.code, mapped.message))
            }
        }
    }

    /// Steps h-i: append the attempt and finalize the target's stored state.
    async fn finish(
        &self,
        target_id: TargetId,
        success: bool,
        error_code: Option<String>,
        error_message: Option<String>,
        remote_post_id: Option<String>,
    ) {
        let truncated_message = error_message.map(|m| truncate(&m, MAX_FAILURE_MESSAGE_LEN));

        let attempt = PublishAttempt {
            id: publisher_core::AttemptId::new(),
            target_id,
            attempted_at: Utc::now(),
            success,
            error_message: truncated_message.clone(),
            error_code: error_code.clone(),
        };
        if let Err(e) = self.store.append_attempt(attempt).await {
            warn!(%target_id, error = %e, "failed to record publish attempt");
        }

        let patch = TargetPatch {
            publish_status: Some(if success { TargetStatus::Published } else { TargetStatus::Failed }),
            remote_post_id,
            failure_reason: truncated_message,
            ..Default::default()
        };
        if let Err(e) = self.store.update_target(target_id, patch).await {
            warn!(%target_id, error = %e, "failed to finalize target state");
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        s.chars().take(max_chars).collect()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use publisher_core::Platform;
    use publisher_store::{InMemoryStore, NewPost, NewTarget};

    fn harness(max_retries: u32) -> (Arc<InMemoryStore>, Publisher) {
        let store = Arc::new(InMemoryStore::new());
        let http = Arc::new(reqwest::Client::new());
        let registry = Arc::new(AdapterRegistry::new(store.clone(), http));
        let publisher = Publisher::new(store.clone(), registry, max_retries);
        (store, publisher)
    }

    fn new_target(platform: Platform) -> NewTarget {
        NewTarget {
            platform,
            override_content: None,
            override_media_refs: None,
            override_options: None,
        }
    }

    // Neither Twitter nor Discord has a credentials row in these tests, so
    // `AdapterRegistry::get_adapter` rejects them with `NotConfigured` and
    // `attempt()` turns that into a PLATFORM_UNAVAILABLE failure without any
    // network call — enough to exercise the pipeline's failure path.

    #[tokio::test]
    async fn partial_failure_reduces_to_partially_published() {
        let (store, publisher) = harness(3);
        let post_id = store
            .create_post(NewPost {
                base_content: "hello".into(),
                scheduled_at_utc: Utc::now() - chrono::Duration::seconds(1),
                media_ids: Vec::new(),
                targets: vec![new_target(Platform::Twitter), new_target(Platform::Discord)],
            })
            .await
            .unwrap();

        let post = store.get_post(post_id).await.unwrap();
        let published_target = post.targets[0].id;
        store
            .update_target(
                published_target,
                TargetPatch {
                    publish_status: Some(TargetStatus::Published),
                    remote_post_id: Some("remote-1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let status = publisher.publish_post(post_id).await.unwrap();
        assert_eq!(status, PostStatus::PartiallyPublished);

        let post = store.get_post(post_id).await.unwrap();
        assert_eq!(post.targets[0].publish_status, TargetStatus::Published);
        assert_eq!(post.targets[1].publish_status, TargetStatus::Failed);
        assert!(post.targets[1]
            .failure_reason
            .as_deref()
            .unwrap_or_default()
            .contains("not configured"));
    }

    #[tokio::test]
    async fn retry_cap_stops_further_attempts() {
        let (store, publisher) = harness(2);
        let post_id = store
            .create_post(NewPost {
                base_content: "hello".into(),
                scheduled_at_utc: Utc::now() - chrono::Duration::seconds(1),
                media_ids: Vec::new(),
                targets: vec![new_target(Platform::Twitter)],
            })
            .await
            .unwrap();

        let post = store.get_post(post_id).await.unwrap();
        let target_id = post.targets[0].id;
        store
            .update_target(
                target_id,
                TargetPatch {
                    publish_status: Some(TargetStatus::Failed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        for _ in 0..2 {
            store
                .append_attempt(PublishAttempt {
                    id: publisher_core::AttemptId::new(),
                    target_id,
                    attempted_at: Utc::now(),
                    success: false,
                    error_message: Some("boom".into()),
                    error_code: Some("PLATFORM_UNAVAILABLE".into()),
                })
                .await
                .unwrap();
        }

        let status = publisher.publish_post(post_id).await.unwrap();
        assert_eq!(status, PostStatus::Failed);
        assert_eq!(
            store.count_attempts(target_id).await.unwrap(),
            2,
            "a target at the retry cap must not accumulate another attempt"
        );
    }

    #[tokio::test]
    async fn finish_truncates_failure_reason_to_500_chars() {
        let (store, publisher) = harness(3);
        let post_id = store
            .create_post(NewPost {
                base_content: "hello".into(),
                scheduled_at_utc: Utc::now() - chrono::Duration::seconds(1),
                media_ids: Vec::new(),
                targets: vec![new_target(Platform::Discord)],
            })
            .await
            .unwrap();
        let post = store.get_post(post_id).await.unwrap();
        let target_id = post.targets[0].id;

        let long_message = "x".repeat(600);
        publisher
            .finish(target_id, false, Some("SERVER_ERROR".into()), Some(long_message), None)
            .await;

        let post = store.get_post(post_id).await.unwrap();
        let target = &post.targets[0];
        assert_eq!(target.publish_status, TargetStatus::Failed);
        assert_eq!(target.failure_reason.as_ref().unwrap().chars().count(), 500);
    }
}
