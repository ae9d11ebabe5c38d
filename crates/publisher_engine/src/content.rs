//! Pure override-resolution logic for the publish pipeline. Kept free of
//! I/O so it can be unit-tested directly.

use publisher_core::{Content, MediaAsset, MediaRef, PlatformTarget, Post};

/// Resolve one target's effective `{text, media, options}` against its
/// post's base content and the target's overrides, plus any media assets
/// referenced by `override_media_refs` already looked up by the caller.
pub fn resolve_effective_content(
    post: &Post,
    target: &PlatformTarget,
    override_media: &[MediaAsset],
) -> Content {
    let text = match &target.override_content {
        Some(t) if !t.trim().is_empty() => t.clone(),
        _ => post.base_content.clone(),
    };

    let media = if target.override_media_refs.is_some() && !override_media.is_empty() {
        override_media.iter().map(to_media_ref).collect()
    } else {
        post.media.iter().map(to_media_ref).collect()
    };

    let options = target.override_options.clone().unwrap_or_default();

    Content { text, media, options }
}

fn to_media_ref(asset: &MediaAsset) -> MediaRef {
    MediaRef {
        id: asset.id,
        media_type: asset.media_type,
        storage_path: asset.storage_path.clone(),
        mime_type: asset.mime_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use publisher_core::{MediaAssetId, MediaType, Platform, PostId, PostStatus, TargetId, TargetStatus};

    fn base_post(media: Vec<MediaAsset>) -> Post {
        Post {
            id: PostId::new(),
            base_content: "base text".into(),
            scheduled_at_utc: Utc::now(),
            status: PostStatus::Scheduled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            targets: Vec::new(),
            media,
        }
    }

    fn asset() -> MediaAsset {
        MediaAsset {
            id: MediaAssetId::new(),
            media_type: MediaType::Image,
            storage_path: "/media/a.png".into(),
            mime_type: "image/png".into(),
            size_bytes: 10,
            duration_seconds: None,
            file_hash: "hash".into(),
            original_filename: "a.png".into(),
        }
    }

    fn base_target(post_id: PostId) -> PlatformTarget {
        PlatformTarget {
            id: TargetId::new(),
            post_id,
            platform: Platform::Mastodon,
            override_content: None,
            override_media_refs: None,
            override_options: None,
            publish_status: TargetStatus::Pending,
            remote_post_id: None,
            failure_reason: None,
            last_attempt_at: None,
        }
    }

    #[test]
    fn falls_back_to_base_content_when_override_is_empty() {
        let post = base_post(vec![]);
        let mut target = base_target(post.id);
        target.override_content = Some("   ".into());
        let content = resolve_effective_content(&post, &target, &[]);
        assert_eq!(content.text, "base text");
    }

    #[test]
    fn uses_override_content_when_non_empty() {
        let post = base_post(vec![]);
        let mut target = base_target(post.id);
        target.override_content = Some("override text".into());
        let content = resolve_effective_content(&post, &target, &[]);
        assert_eq!(content.text, "override text");
    }

    #[test]
    fn falls_back_to_base_media_when_override_refs_resolve_to_nothing() {
        let post = base_post(vec![asset()]);
        let mut target = base_target(post.id);
        target.override_media_refs = Some(vec![MediaAssetId::new()]);
        let content = resolve_effective_content(&post, &target, &[]);
        assert_eq!(content.media.len(), 1);
        assert_eq!(content.media[0].storage_path, "/media/a.png");
    }

    #[test]
    fn uses_resolved_override_media_when_present() {
        let post = base_post(vec![asset()]);
        let mut target = base_target(post.id);
        let override_asset = asset();
        target.override_media_refs = Some(vec![override_asset.id]);
        let content = resolve_effective_content(&post, &target, &[override_asset.clone()]);
        assert_eq!(content.media.len(), 1);
        assert_eq!(content.media[0].id, override_asset.id);
    }

    #[test]
    fn defaults_options_to_empty_map() {
        let post = base_post(vec![]);
        let target = base_target(post.id);
        let content = resolve_effective_content(&post, &target, &[]);
        assert!(content.options.is_empty());
    }
}
