//! Threads adapter: Graph API container → poll → publish flow.

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

const MAX_CHARS: u32 = 500;
const MAX_IMAGES: usize = 20;
const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_DEADLINE: Duration = Duration::from_secs(60);

/// Credentials-driven adapter for Meta's Threads Graph API.
pub struct ThreadsAdapter {
    access_token: Option<String>,
    user_id: Option<String>,
    http: Arc<reqwest::Client>,
}

impl ThreadsAdapter {
    /// Build an adapter from a credentials map (`access_token`, `user_id`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            access_token: credentials.get("access_token").cloned(),
            user_id: credentials.get("user_id").cloned(),
            http,
        }
    }

    fn token(&self) -> Result<&str, AdapterError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing access_token".into())))
    }

    fn user(&self) -> Result<&str, AdapterError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing user_id".into())))
    }

    async fn poll_until_ready(&self, container_id: &str, token: &str) -> Result<(), AdapterError> {
        let deadline = tokio::time::Instant::now() + POLL_DEADLINE;
        loop {
            let resp: StatusResponse = self
                .http
                .get(format!("https://graph.threads.net/v1.0/{container_id}"))
                .query(&[("fields", "status"), ("access_token", token)])
                .send()
                .await?
                .json()
                .await?;
            match resp.status.as_str() {
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
    status: String,
}

#[async_trait]
impl PlatformAdapter for ThreadsAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Threads
    }

    fn is_available(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.user_id.as_deref().is_some_and(|u| !u.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("access_token", "Access token", CredentialFieldType::Password, true, None),
            CredentialField::new("user_id", "Threads user id", CredentialFieldType::Text, true, None),
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
        let videos = content.media.iter().filter(|m| m.media_type == MediaType::Video).count();
        let images = content.media.iter().filter(|m| m.media_type == MediaType::Image).count();
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
        if !content.media.is_empty() && images == 0 && videos == 0 {
            errors.push(ValidationError {
                field: "media".into(),
                message: "media mode requires at least one image or video".into(),
            });
        }
        errors
    }

    #[instrument(skip(self, asset))]
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError> {
        let token = self.token()?.to_string();
        let user = self.user()?.to_string();
        let media_url = format!("file://{}", asset.storage_path);
        let media_type = if asset.media_type == MediaType::Video { "VIDEO" } else { "IMAGE" };
        let mut params = vec![
            ("access_token".to_string(), token.clone()),
            ("media_type".to_string(), media_type.to_string()),
        ];
        if asset.media_type == MediaType::Video {
            params.push(("video_url".to_string(), media_url));
        } else {
            params.push(("image_url".to_string(), media_url));
        }
        let resp: ContainerResponse = self
            .http
            .post(format!("https://graph.threads.net/v1.0/{user}/threads"))
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
        let user = self.user()?.to_string();

        let creation_id = if media_ids.is_empty() {
            let params = [
                ("access_token", token.as_str()),
                ("media_type", "TEXT"),
                ("text", &content.text),
            ];
            let resp: ContainerResponse = self
                .http
                .post(format!("https://graph.threads.net/v1.0/{user}/threads"))
                .form(&params)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            resp.id
        } else if media_ids.len() > 1 {
            let children = media_ids.join(",");
            let params = [
                ("access_token", token.as_str()),
                ("media_type", "CAROUSEL"),
                ("text", &content.text),
                ("children", &children),
            ];
            let resp: ContainerResponse = self
                .http
                .post(format!("https://graph.threads.net/v1.0/{user}/threads"))
                .form(&params)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            resp.id
        } else {
            media_ids[0].clone()
        };

        let resp: ContainerResponse = self
            .http
            .post(format!("https://graph.threads.net/v1.0/{user}/threads_publish"))
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
        let user = self.user()?;
        self.http
            .get(format!("https://graph.threads.net/v1.0/{user}"))
            .query(&[("fields", "id"), ("access_token", token)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
