//! Twitter/X adapter: v1.1 media upload, v2 tweet creation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use publisher_core::{
    CharacterLimits, Content, CredentialField, CredentialFieldType, MediaRef, MediaType,
    OptionField, OptionFieldType, Platform, ValidationError,
};
use publisher_error::{AdapterError, AdapterErrorKind};
use serde::Deserialize;
use tracing::instrument;

use crate::adapter::PlatformAdapter;

const MAX_CHARS: u32 = 280;
const MAX_IMAGES: usize = 4;

/// Credentials-driven adapter for Twitter/X.
pub struct TwitterAdapter {
    bearer_token: Option<String>,
    http: Arc<reqwest::Client>,
}

impl TwitterAdapter {
    /// Build an adapter from a credentials map (`bearer_token`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            bearer_token: credentials.get("bearer_token").cloned(),
            http,
        }
    }

    fn token(&self) -> Result<&str, AdapterError> {
        self.bearer_token
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing bearer_token".into())))
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    media_id_string: String,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Twitter
    }

    fn is_available(&self) -> bool {
        self.bearer_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![CredentialField::new(
            "bearer_token",
            "Bearer token",
            CredentialFieldType::Password,
            true,
            None,
        )]
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
        let images = content.media.iter().filter(|m| m.media_type == MediaType::Image).count();
        let videos = content.media.iter().filter(|m| m.media_type == MediaType::Video).count();
        if videos > 1 || (videos > 0 && images > 0) {
            errors.push(ValidationError {
                field: "media".into(),
                message: "at most one video, not mixed with images".into(),
            });
        }
        if images > MAX_IMAGES {
            errors.push(ValidationError {
                field: "media".into(),
                message: format!("at most {MAX_IMAGES} images"),
            });
        }
        errors
    }

    #[instrument(skip(self, asset))]
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError> {
        let token = self.token()?;
        let bytes = tokio::fs::read(&asset.storage_path)
            .await
            .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
        let part = reqwest::multipart::Part::bytes(bytes).mime_str(&asset.mime_type).map_err(|e| {
            AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string()))
        })?;
        let form = reqwest::multipart::Form::new().part("media", part);
        let resp = self
            .http
            .post("https://upload.twitter.com/1.1/media/upload.json")
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        let parsed: UploadResponse = resp.json().await?;
        Ok(parsed.media_id_string)
    }

    #[instrument(skip(self, content))]
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError> {
        let token = self.token()?;
        let mut body = serde_json::json!({ "text": content.text });
        if !media_ids.is_empty() {
            body["media"] = serde_json::json!({ "media_ids": media_ids });
        }
        let resp = self
            .http
            .post("https://api.twitter.com/2/tweets")
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: TweetResponse = resp.json().await?;
        Ok(parsed.data.id)
    }

    #[instrument(skip(self))]
    async fn verify_credentials(&self) -> Result<(), AdapterError> {
        let token = self.token()?;
        self.http
            .get("https://api.twitter.com/2/users/me")
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn adapter() -> TwitterAdapter {
        TwitterAdapter::new(HashMap::new(), Arc::new(reqwest::Client::new()))
    }

    fn content(text: &str, media: Vec<MediaRef>) -> Content {
        Content {
            text: text.to_string(),
            media,
            options: HashMap::new(),
        }
    }

    fn media(media_type: MediaType) -> MediaRef {
        MediaRef {
            id: publisher_core::MediaAssetId::new(),
            media_type,
            storage_path: "/tmp/asset".into(),
            mime_type: "image/png".into(),
        }
    }

    #[test]
    fn rejects_text_over_280_characters() {
        let errors = adapter().validate_post(&content(&"a".repeat(281), vec![]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "text");
    }

    #[test]
    fn rejects_mixed_image_and_video() {
        let errors = adapter().validate_post(&content("hi", vec![media(MediaType::Image), media(MediaType::Video)]));
        assert!(errors.iter().any(|e| e.field == "media"));
    }

    #[test]
    fn accepts_four_images() {
        let media = (0..4).map(|_| media(MediaType::Image)).collect();
        assert!(adapter().validate_post(&content("hi", media)).is_empty());
    }

    #[test]
    fn is_not_available_without_credentials() {
        assert!(!adapter().is_available());
    }
}
