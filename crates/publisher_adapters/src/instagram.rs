//! Instagram adapter: Graph API container → poll → publish flow.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use publisher_core::{
    CharacterLimits, Content, CredentialField, CredentialFieldType, MediaRef, MediaType,
    OptionField, Platform, ValidationError,
};
use publisher_error::{AdapterError, AdapterErrorKind};
use serde::Deserialize;
use tracing::instrument;

use crate::adapter::PlatformAdapter;

const MAX_CHARS: u32 = 2200;
const MAX_CAROUSEL: usize = 10;
const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_DEADLINE: Duration = Duration::from_secs(60);

/// Credentials-driven adapter for Instagram's Graph API.
pub struct InstagramAdapter {
    access_token: Option<String>,
    ig_user_id: Option<String>,
    http: Arc<reqwest::Client>,
}

impl InstagramAdapter {
    /// Build an adapter from a credentials map (`access_token`, `ig_user_id`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            access_token: credentials.get("access_token").cloned(),
            ig_user_id: credentials.get("ig_user_id").cloned(),
            http,
        }
    }

    fn token(&self) -> Result<&str, AdapterError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing access_token".into())))
    }

    fn user_id(&self) -> Result<&str, AdapterError> {
        self.ig_user_id
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing ig_user_id".into())))
    }

    async fn poll_until_ready(&self, container_id: &str, token: &str) -> Result<(), AdapterError> {
        let deadline = tokio::time::Instant::now() + POLL_DEADLINE;
        loop {
            let resp: StatusResponse = self
                .http
                .get(format!("https://graph.facebook.com/v19.0/{container_id}"))
                .query(&[("fields", "status_code"), ("access_token", token)])
                .send()
                .await?
                .json()
                .await?;
            match resp.status_code.as_str() {
                "FINISHED" => return Ok(()),
                "ERROR" => {
                    return Err(AdapterError::new(AdapterErrorKind::MediaProcessingFailed(
                        container_id.to_string(),
                    )))
                }
                _ if tokio::time::Instant::now() >= deadline => {
                    return Err(AdapterError::new(AdapterErrorKind::MediaProcessingTimeout))
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }
}

#[derive(Deserialize)]
struct ContainerResponse {
    id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status_code: String,
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Instagram
    }

    fn is_available(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.ig_user_id.as_deref().is_some_and(|u| !u.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("access_token", "Access token", CredentialFieldType::Password, true, None),
            CredentialField::new("ig_user_id", "Instagram user id", CredentialFieldType::Text, true, None),
        ]
    }

    fn option_fields(&self) -> Vec<OptionField> {
        Vec::new()
    }

    fn character_limits(&self) -> CharacterLimits {
        CharacterLimits::new(MAX_CHARS, None, true)
    }

    fn validate_post(&self, content: &Content) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if content.text.chars().count() > MAX_CHARS as usize {
            errors.push(ValidationError {
                field: "text".into(),
                message: format!("caption exceeds {MAX_CHARS} characters"),
            });
        }
        if content.media.is_empty() {
            errors.push(ValidationError {
                field: "media".into(),
                message: "at least one media item is required".into(),
            });
        }
        if content.media.len() > MAX_CAROUSEL {
            errors.push(ValidationError {
                field: "media".into(),
                message: format!("at most {MAX_CAROUSEL} items in a carousel"),
            });
        }
        errors
    }

    #[instrument(skip(self, asset))]
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError> {
        let token = self.token()?.to_string();
        let user_id = self.user_id()?.to_string();
        let media_url = format!("file://{}", asset.storage_path);
        let mut params = vec![("access_token".to_string(), token.clone())];
        if asset.media_type == MediaType::Video {
            params.push(("media_type".to_string(), "REELS".to_string()));
            params.push(("video_url".to_string(), media_url));
        } else {
            params.push(("image_url".to_string(), media_url));
        }
        let resp: ContainerResponse = self
            .http
            .post(format!("https://graph.facebook.com/v19.0/{user_id}/media"))
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        self.poll_until_ready(&resp.id, &token).await?;
        Ok(resp.id)
    }

    #[instrument(skip(self, content))]
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError> {
        let token = self.token()?.to_string();
        let user_id = self.user_id()?.to_string();

        let creation_id = if media_ids.len() > 1 {
            let children = media_ids.join(",");
            let params = [
                ("access_token", token.as_str()),
                ("media_type", "CAROUSEL"),
                ("caption", &content.text),
                ("children", &children),
            ];
            let resp: ContainerResponse = self
                .http
                .post(format!("https://graph.facebook.com/v19.0/{user_id}/media"))
                .form(&params)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            resp.id
        } else {
            media_ids
                .first()
                .cloned()
                .ok_or_else(|| AdapterError::new(AdapterErrorKind::InvalidResponse("no media container".into())))?
        };

        let resp: ContainerResponse = self
            .http
            .post(format!("https://graph.facebook.com/v19.0/{user_id}/media_publish"))
            .form(&[("access_token", token.as_str()), ("creation_id", &creation_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.id)
    }

    #[instrument(skip(self))]
    async fn verify_credentials(&self) -> Result<(), AdapterError> {
        let token = self.token()?;
        let user_id = self.user_id()?;
        self.http
            .get(format!("https://graph.facebook.com/v19.0/{user_id}"))
            .query(&[("fields", "id"), ("access_token", token)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
