//! Mastodon adapter: v2 media upload with async-ready polling, then a
//! status post.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use publisher_core::{
    CharacterLimits, Content, CredentialField, CredentialFieldType, MediaRef, MediaType,
    OptionField, OptionFieldType, Platform, ValidationError,
};
use publisher_error::{AdapterError, AdapterErrorKind};
use serde::Deserialize;
use tracing::instrument;

use crate::adapter::PlatformAdapter;

const MAX_CHARS: u32 = 500;
const MAX_MEDIA: usize = 4;
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const POLL_DEADLINE: Duration = Duration::from_secs(60);

/// Credentials-driven adapter for a Mastodon instance.
pub struct MastodonAdapter {
    instance_url: Option<String>,
    access_token: Option<String>,
    http: Arc<reqwest::Client>,
}

impl MastodonAdapter {
    /// Build an adapter from a credentials map (`instance_url`, `access_token`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            instance_url: credentials.get("instance_url").cloned(),
            access_token: credentials.get("access_token").cloned(),
            http,
        }
    }

    fn instance(&self) -> Result<&str, AdapterError> {
        self.instance_url
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing instance_url".into())))
    }

    fn token(&self) -> Result<&str, AdapterError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing access_token".into())))
    }
}

#[derive(Deserialize)]
struct MediaResponse {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
}

#[async_trait]
impl PlatformAdapter for MastodonAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Mastodon
    }

    fn is_available(&self) -> bool {
        self.instance_url.as_deref().is_some_and(|u| !u.is_empty())
            && self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("instance_url", "Instance URL", CredentialFieldType::Text, true, Some("https://mastodon.social".into())),
            CredentialField::new("access_token", "Access token", CredentialFieldType::Password, true, None),
        ]
    }

    fn option_fields(&self) -> Vec<OptionField> {
        vec![OptionField::new(
            "visibility",
            "Visibility",
            OptionFieldType::Enum,
            Some(vec!["public".into(), "unlisted".into(), "private".into(), "direct".into()]),
            Some("Who can see this status".into()),
        )]
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
        let videos = content.media.iter().filter(|m| m.media_type == MediaType::Video).count();
        let images = content.media.iter().filter(|m| m.media_type == MediaType::Image).count();
        if videos > 0 && images > 0 {
            errors.push(ValidationError {
                field: "media".into(),
                message: "images and video cannot be mixed".into(),
            });
        }
        if content.media.len() > MAX_MEDIA {
            errors.push(ValidationError {
                field: "media".into(),
                message: format!("at most {MAX_MEDIA} media items"),
            });
        }
        errors
    }

    #[instrument(skip(self, asset))]
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError> {
        let instance = self.instance()?;
        let token = self.token()?;
        let bytes = tokio::fs::read(&asset.storage_path)
            .await
            .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
        let part = reqwest::multipart::Part::bytes(bytes).mime_str(&asset.mime_type).map_err(|e| {
            AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string()))
        })?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp: MediaResponse = self
            .http
            .post(format!("{instance}/api/v2/media"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if resp.url.is_some() {
            return Ok(resp.id);
        }

        let deadline = tokio::time::Instant::now() + POLL_DEADLINE;
        loop {
            let status = self
                .http
                .get(format!("{instance}/api/v1/media/{}", resp.id))
                .bearer_auth(token)
                .send()
                .await?;
            if status.status() == reqwest::StatusCode::OK {
                return Ok(resp.id);
            }
            if status.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                return Err(AdapterError::new(AdapterErrorKind::MediaProcessingFailed(resp.id)));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AdapterError::new(AdapterErrorKind::MediaProcessingTimeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    #[instrument(skip(self, content))]
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError> {
        let instance = self.instance()?;
        let token = self.token()?;
        let body = serde_json::json!({
            "status": content.text,
            "media_ids": media_ids,
        });
        let resp: StatusResponse = self
            .http
            .post(format!("{instance}/api/v1/statuses"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.id)
    }

    #[instrument(skip(self))]
    async fn verify_credentials(&self) -> Result<(), AdapterError> {
        let instance = self.instance()?;
        let token = self.token()?;
        self.http
            .get(format!("{instance}/api/v1/accounts/verify_credentials"))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
