//! Telegram adapter: Bot API, single message or media group.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use publisher_core::{
    CharacterLimits, Content, CredentialField, CredentialFieldType, MediaRef, MediaType,
    OptionField, Platform, ValidationError,
};
use publisher_error::{AdapterError, AdapterErrorKind};
use serde::Deserialize;
use tracing::instrument;

use crate::adapter::PlatformAdapter;

const MAX_TEXT: u32 = 4096;
const MAX_CAPTION: u32 = 1024;

/// Credentials-driven adapter for Telegram's Bot API.
pub struct TelegramAdapter {
    bot_token: Option<String>,
    chat_id: Option<String>,
    http: Arc<reqwest::Client>,
}

impl TelegramAdapter {
    /// Build an adapter from a credentials map (`bot_token`, `chat_id`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            bot_token: credentials.get("bot_token").cloned(),
            chat_id: credentials.get("chat_id").cloned(),
            http,
        }
    }

    fn base_url(&self) -> Result<String, AdapterError> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing bot_token".into())))?;
        Ok(format!("https://api.telegram.org/bot{token}"))
    }

    fn chat(&self) -> Result<&str, AdapterError> {
        self.chat_id
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing chat_id".into())))
    }
}

#[derive(Deserialize)]
struct SendMessageResult {
    message_id: i64,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
    result: Option<SendMessageResult>,
    description: Option<String>,
}

#[async_trait]
impl PlatformAdapter for TelegramAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Telegram
    }

    fn is_available(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.chat_id.as_deref().is_some_and(|c| !c.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("bot_token", "Bot token", CredentialFieldType::Password, true, None),
            CredentialField::new("chat_id", "Chat id", CredentialFieldType::Text, true, None),
        ]
    }

    fn option_fields(&self) -> Vec<OptionField> {
        Vec::new()
    }

    fn character_limits(&self) -> CharacterLimits {
        CharacterLimits::new(MAX_TEXT, Some(MAX_CAPTION), false)
    }

    fn validate_post(&self, content: &Content) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let limit = if content.media.is_empty() { MAX_TEXT } else { MAX_CAPTION };
        if content.text.chars().count() > limit as usize {
            errors.push(ValidationError {
                field: "text".into(),
                message: format!("text exceeds {limit} characters"),
            });
        }
        errors
    }

    #[instrument(skip(self, asset))]
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError> {
        // Telegram accepts media inline with the send call; the local path
        // doubles as the opaque media id consumed by `publish_post`.
        let _ = asset;
        Ok(asset.storage_path.clone())
    }

    #[instrument(skip(self, content))]
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError> {
        let base = self.base_url()?;
        let chat_id = self.chat();
        let chat_id = chat_id?;

        if media_ids.is_empty() {
            let body = serde_json::json!({ "chat_id": chat_id, "text": content.text });
            let resp: SendMessageResponse = self
                .http
                .post(format!("{base}/sendMessage"))
                .json(&body)
                .send()
                .await?
                .json()
                .await?;
            return finish(resp);
        }

        if media_ids.len() == 1 {
            let asset = &content.media[0];
            let endpoint = if asset.media_type == MediaType::Video { "sendVideo" } else { "sendPhoto" };
            let field = if asset.media_type == MediaType::Video { "video" } else { "photo" };
            let form = reqwest::multipart::Form::new()
                .text("chat_id", chat_id.to_string())
                .text("caption", content.text.clone())
                .part(field, file_part(&media_ids[0], asset).await?);
            let resp: SendMessageResponse = self
                .http
                .post(format!("{base}/{endpoint}"))
                .multipart(form)
                .send()
                .await?
                .json()
                .await?;
            return finish(resp);
        }

        // The Bot API's sendMediaGroup rejects raw local paths in `media`;
        // each file must be attached as its own multipart part and
        // referenced by `attach://<field name>`.
        let mut form = reqwest::multipart::Form::new().text("chat_id", chat_id.to_string());
        let mut media = Vec::with_capacity(media_ids.len());
        for (i, asset) in content.media.iter().enumerate() {
            let kind = if asset.media_type == MediaType::Video { "video" } else { "photo" };
            let field_name = format!("file{i}");
            let mut entry = serde_json::json!({ "type": kind, "media": format!("attach://{field_name}") });
            if i == 0 {
                entry["caption"] = serde_json::Value::String(content.text.clone());
            }
            media.push(entry);
            form = form.part(field_name, file_part(&media_ids[i], asset).await?);
        }
        let media_json = serde_json::to_string(&media)
            .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
        form = form.text("media", media_json);

        let resp: SendMessageResponse = self
            .http
            .post(format!("{base}/sendMediaGroup"))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        finish(resp)
    }

    #[instrument(skip(self))]
    async fn verify_credentials(&self) -> Result<(), AdapterError> {
        let base = self.base_url()?;
        let resp = self.http.get(format!("{base}/getMe")).send().await?;
        if !resp.status().is_success() {
            return Err(AdapterError::new(AdapterErrorKind::Authentication(
                "getMe rejected".into(),
            )));
        }
        Ok(())
    }
}

fn finish(resp: SendMessageResponse) -> Result<String, AdapterError> {
    if resp.ok {
        Ok(resp
            .result
            .map(|r| r.message_id.to_string())
            .unwrap_or_default())
    } else {
        Err(AdapterError::new(AdapterErrorKind::RemoteRejected {
            status: 400,
            message: resp.description.unwrap_or_default(),
        }))
    }
}

async fn file_part(path: &str, asset: &MediaRef) -> Result<reqwest::multipart::Part, AdapterError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
    reqwest::multipart::Part::bytes(bytes)
        .mime_str(&asset.mime_type)
        .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))
}
