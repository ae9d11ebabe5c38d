//! Bluesky adapter: AT Protocol session, blob upload, record creation.
//!
//! Detects link and mention facets in the post text so links render as
//! clickable spans and `@handle` mentions resolve, matching the client
//! behavior users expect from the official apps.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use publisher_core::{
    CharacterLimits, Content, CredentialField, CredentialFieldType, MediaRef, MediaType,
    OptionField, Platform, ValidationError,
};
use publisher_error::{AdapterError, AdapterErrorKind};
use regex::Regex;
use serde::Deserialize;
use tracing::instrument;

use crate::adapter::PlatformAdapter;

const MAX_CHARS: u32 = 300;
const MAX_IMAGES: usize = 4;

/// Credentials-driven adapter for the AT Protocol (Bluesky).
pub struct BlueskyAdapter {
    identifier: Option<String>,
    app_password: Option<String>,
    http: Arc<reqwest::Client>,
}

impl BlueskyAdapter {
    /// Build an adapter from a credentials map (`identifier`, `app_password`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            identifier: credentials.get("identifier").cloned(),
            app_password: credentials.get("app_password").cloned(),
            http,
        }
    }

    fn identifier(&self) -> Result<&str, AdapterError> {
        self.identifier
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing identifier".into())))
    }

    fn password(&self) -> Result<&str, AdapterError> {
        self.app_password
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing app_password".into())))
    }

    async fn session(&self) -> Result<Session, AdapterError> {
        let body = serde_json::json!({
            "identifier": self.identifier()?,
            "password": self.password()?,
        });
        let resp: Session = self
            .http
            .post("https://bsky.social/xrpc/com.atproto.server.createSession")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }

    fn build_facets(text: &str) -> Vec<serde_json::Value> {
        let mut facets = Vec::new();
        let link_re = Regex::new(r"https?://[^\s]+").expect("static pattern");
        for m in link_re.find_iter(text) {
            facets.push(serde_json::json!({
                "index": { "byteStart": m.start(), "byteEnd": m.end() },
                "features": [{ "$type": "app.bsky.richtext.facet#link", "uri": m.as_str() }],
            }));
        }
        let mention_re = Regex::new(r"@[a-zA-Z0-9.\-]+").expect("static pattern");
        for m in mention_re.find_iter(text) {
            facets.push(serde_json::json!({
                "index": { "byteStart": m.start(), "byteEnd": m.end() },
                "features": [{ "$type": "app.bsky.richtext.facet#mention", "did": m.as_str() }],
            }));
        }
        facets
    }
}

#[derive(Deserialize, Clone)]
struct Session {
    #[serde(rename = "accessJwt")]
    access_jwt: String,
    did: String,
}

#[derive(Deserialize)]
struct BlobResponse {
    blob: serde_json::Value,
}

#[derive(Deserialize)]
struct CreateRecordResponse {
    uri: String,
}

#[async_trait]
impl PlatformAdapter for BlueskyAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Bluesky
    }

    fn is_available(&self) -> bool {
        self.identifier.as_deref().is_some_and(|i| !i.is_empty())
            && self.app_password.as_deref().is_some_and(|p| !p.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("identifier", "Handle or email", CredentialFieldType::Text, true, None),
            CredentialField::new("app_password", "App password", CredentialFieldType::Password, true, None),
        ]
    }

    fn option_fields(&self) -> Vec<OptionField> {
        Vec::new()
    }

    fn character_limits(&self) -> CharacterLimits {
        CharacterLimits::new(MAX_CHARS, None, false)
    }

    fn validate_post(&self, content: &Content) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if content.text.chars().count() > MAX_CHARS as usize {
            errors.push(ValidationError {
                field: "text".into(),
                message: format!("text exceeds {MAX_CHARS} characters"),
            });
        }
        if content.media.iter().any(|m| m.media_type == MediaType::Video) {
            errors.push(ValidationError {
                field: "media".into(),
                message: "video is not supported".into(),
            });
        }
        if content.media.len() > MAX_IMAGES {
            errors.push(ValidationError {
                field: "media".into(),
                message: format!("at most {MAX_IMAGES} images"),
            });
        }
        errors
    }

    #[instrument(skip(self, asset))]
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError> {
        let session = self.session().await?;
        let bytes = tokio::fs::read(&asset.storage_path)
            .await
            .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
        let resp: BlobResponse = self
            .http
            .post("https://bsky.social/xrpc/com.atproto.repo.uploadBlob")
            .bearer_auth(&session.access_jwt)
            .header("content-type", &asset.mime_type)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.blob.to_string())
    }

    #[instrument(skip(self, content))]
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError> {
        let session = self.session().await?;
        let images: Vec<serde_json::Value> = media_ids
            .iter()
            .map(|blob_json| {
                let blob: serde_json::Value = serde_json::from_str(blob_json).unwrap_or(serde_json::Value::Null);
                serde_json::json!({ "image": blob, "alt": "" })
            })
            .collect();

        let mut record = serde_json::json!({
            "$type": "app.bsky.feed.post",
            "text": content.text,
            "createdAt": chrono::Utc::now().to_rfc3339(),
            "facets": Self::build_facets(&content.text),
        });
        if !images.is_empty() {
            record["embed"] = serde_json::json!({
                "$type": "app.bsky.embed.images",
                "images": images,
            });
        }

        let body = serde_json::json!({
            "repo": session.did,
            "collection": "app.bsky.feed.post",
            "record": record,
        });
        let resp: CreateRecordResponse = self
            .http
            .post("https://bsky.social/xrpc/com.atproto.repo.createRecord")
            .bearer_auth(&session.access_jwt)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.uri)
    }

    #[instrument(skip(self))]
    async fn verify_credentials(&self) -> Result<(), AdapterError> {
        self.session().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_a_link_facet() {
        let facets = BlueskyAdapter::build_facets("check https://example.com/post out");
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0]["features"][0]["uri"], "https://example.com/post");
    }

    #[test]
    fn finds_a_mention_facet() {
        let facets = BlueskyAdapter::build_facets("thanks @alice.bsky.social for the tip");
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0]["features"][0]["did"], "@alice.bsky.social");
    }

    #[test]
    fn finds_no_facets_in_plain_text() {
        assert!(BlueskyAdapter::build_facets("just a normal post").is_empty());
    }

    #[test]
    fn rejects_video_media() {
        let adapter = BlueskyAdapter::new(HashMap::new(), Arc::new(reqwest::Client::new()));
        let content = Content {
            text: "hi".into(),
            media: vec![MediaRef {
                id: publisher_core::MediaAssetId::new(),
                media_type: MediaType::Video,
                storage_path: "/tmp/a".into(),
                mime_type: "video/mp4".into(),
            }],
            options: HashMap::new(),
        };
        let errors = adapter.validate_post(&content);
        assert!(errors.iter().any(|e| e.field == "media"));
    }
}
