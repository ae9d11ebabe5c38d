//! Facebook adapter: Graph API page feed.

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

const MAX_CHARS: u32 = 63_206;
const MAX_IMAGES: usize = 10;

/// Credentials-driven adapter for a Facebook page's Graph API feed.
pub struct FacebookAdapter {
    access_token: Option<String>,
    page_id: Option<String>,
    http: Arc<reqwest::Client>,
}

impl FacebookAdapter {
    /// Build an adapter from a credentials map (`access_token`, `page_id`).
    pub fn new(credentials: HashMap<String, String>, http: Arc<reqwest::Client>) -> Self {
        Self {
            access_token: credentials.get("access_token").cloned(),
            page_id: credentials.get("page_id").cloned(),
            http,
        }
    }

    fn token(&self) -> Result<&str, AdapterError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing access_token".into())))
    }

    fn page(&self) -> Result<&str, AdapterError> {
        self.page_id
            .as_deref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Unavailable("missing page_id".into())))
    }
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Deserialize)]
struct PhotoUploadResponse {
    id: String,
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    fn platform_name(&self) -> Platform {
        Platform::Facebook
    }

    fn is_available(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
            && self.page_id.as_deref().is_some_and(|p| !p.is_empty())
    }

    fn credential_fields(&self) -> Vec<CredentialField> {
        vec![
            CredentialField::new("access_token", "Page access token", CredentialFieldType::Password, true, None),
            CredentialField::new("page_id", "Page id", CredentialFieldType::Text, true, None),
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
        let page = self.page()?;
        let bytes = tokio::fs::read(&asset.storage_path)
            .await
            .map_err(|e| AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string())))?;
        let part = reqwest::multipart::Part::bytes(bytes).mime_str(&asset.mime_type).map_err(|e| {
            AdapterError::new(AdapterErrorKind::InvalidResponse(e.to_string()))
        })?;
        let endpoint = if asset.media_type == MediaType::Video { "videos" } else { "photos" };
        let field = if asset.media_type == MediaType::Video { "source" } else { "source" };
        let form = reqwest::multipart::Form::new()
            .text("published", "false")
            .text("access_token", token.to_string())
            .part(field, part);
        let resp: PhotoUploadResponse = self
            .http
            .post(format!("https://graph.facebook.com/v19.0/{page}/{endpoint}"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.id)
    }

    #[instrument(skip(self, content))]
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError> {
        let token = self.token()?;
        let page = self.page()?;
        let mut params = vec![("message".to_string(), content.text.clone()), ("access_token".to_string(), token.to_string())];
        for (i, id) in media_ids.iter().enumerate() {
            params.push((format!("attached_media[{i}]"), serde_json::json!({ "media_fbid": id }).to_string()));
        }
        let resp: IdResponse = self
            .http
            .post(format!("https://graph.facebook.com/v19.0/{page}/feed"))
            .form(&params)
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
        let page = self.page()?;
        self.http
            .get(format!("https://graph.facebook.com/v19.0/{page}"))
            .query(&[("fields", "id"), ("access_token", token)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
