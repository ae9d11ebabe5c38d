//! The capability contract every platform adapter implements.

use async_trait::async_trait;
use publisher_core::{CharacterLimits, Content, CredentialField, MappedAdapterError, MediaRef, OptionField, Platform, ValidationError};
use publisher_error::AdapterError;

/// One platform's publishing capability, as a stateless trait object.
///
/// Implementors hold no mutable state beyond an optional cached auth
/// session safe to re-derive; they never touch the store.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The platform this adapter speaks for.
    fn platform_name(&self) -> Platform;

    /// True iff credentials parse and every required field is present.
    fn is_available(&self) -> bool;

    /// Ordered credential fields the external UI must render.
    fn credential_fields(&self) -> Vec<CredentialField>;

    /// Per-platform override-option descriptors.
    fn option_fields(&self) -> Vec<OptionField>;

    /// This platform's hard-coded text/media limits.
    fn character_limits(&self) -> CharacterLimits;

    /// Validate resolved content against this platform's rules. An empty
    /// result means the content is valid.
    fn validate_post(&self, content: &Content) -> Vec<ValidationError>;

    /// Upload one media asset, returning an opaque platform-specific id.
    async fn upload_media(&self, asset: &MediaRef) -> Result<String, AdapterError>;

    /// Publish resolved content with already-uploaded media ids, in the
    /// same order as `content.media`. Returns the opaque remote post id.
    async fn publish_post(&self, content: &Content, media_ids: &[String]) -> Result<String, AdapterError>;

    /// Succeeds iff the adapter's credentials can authenticate against the
    /// remote service right now.
    async fn verify_credentials(&self) -> Result<(), AdapterError>;

    /// Classify a raw adapter error into a stable code, bounded message,
    /// and retryability flag.
    fn map_error(&self, err: &AdapterError) -> MappedAdapterError {
        let message = err.kind().to_string();
        let message = if message.chars().count() > 500 {
            message.chars().take(500).collect()
        } else {
            message
        };
        MappedAdapterError {
            code: err.kind().code().to_string(),
            message,
            retryable: err.is_retryable(),
        }
    }
}
