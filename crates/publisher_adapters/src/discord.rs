//! Discord adapter: bot REST API, inline message attachments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use publisher_core::{
    CharacterLimits, Content, CredentialField, CredentialFieldType, MediaRef, OptionField,
    Platform, ValidationError,
};
use publisher_error::{AdapterError, AdapterErrorKind};
use serde::Deserialize;
use tracing::instrument;

use crate::adapter::PlatformAdapter;

const MAX_CHARS: u32 = 2000;

/// Credentials-driven adapter for a Discord bot posting to one channel.
pub struct DiscordAdapter {
    bot_token: Option<String>,
    channel_id: Option<String>,
    http: Arc<reqwest::Client>,
}

impl DiscordAdapter {
    /// Build an adapter from a credentials map (`bot_token`, `channel_id`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            bot_token: credentials.get("bot_token").cloned(),
            channel_id: credentials.get("channel_id").cloned(),
            http,
        }
    }

    fn token(&self) -> Result<&str, AdapterError> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing bot_token".into())))
    }

    fn channel(&self) -> Result<&str, AdapterError> {
        self.channel_id
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing channel_id".into())))
    }
}

#[derive(Deserialize)]
struct MessageResponse {
    id: String,
}

#[async_trait]
impl PlatformAdapter for DiscordAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Discord
    }

    fn is_available(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.channel_id.as_deref().is_some_and(|c| !c.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("bot_token", "Bot token", CredentialFieldType::Password, true, None),
            CredentialField::new("channel_id", "Channel id", CredentialFieldType::Text, true, None),
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
        if content.text.trim().is_empty() && content.media.is_empty() {
            errors.push(ValidationError {
                field: "text".into(),
                message: "a message needs text or media".into(),
            });
        }
        errors
    }

    #[instrument(skip(self, asset))]
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError> {
        // Discord attaches media inline on the message call; the local
        // path doubles as the opaque media id consumed by `publish_post`.
        let _ = asset;
        Ok(asset.storage_path.clone())
    }

    #[instrument(skip(self, content))]
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError> {
        let token = self.token()?;
        let channel = self.channel()?;
        let url = format!("https://discord.com/api/v10/channels/{channel}/messages");

        if media_ids.is_empty() {
            let resp: MessageResponse = self
                .http
                .post(&url)
                .header("Authorization", format!("Bot {token}"))
                .json(&serde_json::json!({ "content": content.text }))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            return Ok(resp.id);
        }

        let mut form = reqwest::multipart::Form::new()
            .text("payload_json", serde_json::json!({ "content": content.text }).to_string());
        for (i, (media_id, asset)) in media_ids.iter().zip(content.media.iter()).enumerate() {
            let bytes = tokio::fs::read(media_id)
                .await
                .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(asset.storage_path.clone())
                .mime_str(&asset.mime_type)
                .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
            form = form.part(format!("files[{i}]"), part);
        }
        let resp: MessageResponse = self
            .http
            .post(&url)
            .header("Authorization", format!("Bot {token}"))
            .multipart(form)
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
        let channel = self.channel()?;
        self.http
            .get(format!("https://discord.com/api/v10/channels/{channel}"))
            .header("Authorization", format!("Bot {token}"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
