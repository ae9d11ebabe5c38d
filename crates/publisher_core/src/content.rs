use std::collections::HashMap;

use derive_getters::Getters;

use crate::ids::MediaAssetId;
use crate::model::MediaType;

/// A scalar value for a per-platform override option.
///
/// Option fields are typed per [`OptionFieldType`]; this is the runtime
/// value a target's `override_options` map carries for one key.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// A free-form string value.
    String(String),
    /// A boolean toggle.
    Bool(bool),
    /// One of a fixed set of enumerated strings.
    Enum(String),
}

/// One media item, resolved and ready to hand to `uploadMedia`.
#[derive(Debug, Clone)]
pub struct MediaRef {
    /// The media asset's identifier.
    pub id: MediaAssetId,
    /// Image or video.
    pub media_type: MediaType,
    /// Local filesystem path to read the bytes from.
    pub storage_path: String,
    /// MIME type, passed through to the multipart upload.
    pub mime_type: String,
}

/// The resolved `{text, media[], options}` triple a target's publish pass
/// hands to `validatePost`/`uploadMedia`/`publishPost`.
///
/// Produced by the publisher's override-resolution step; adapters never
/// see `base_content`/`override_content` directly, only this
/// already-resolved shape.
#[derive(Debug, Clone)]
pub struct Content {
    /// Effective text: the target's override if non-empty, else the post's
    /// base content.
    pub text: String,
    /// Effective ordered media: the target's resolved override media if
    /// non-empty, else the post's base media.
    pub media: Vec<MediaRef>,
    /// Effective per-platform options, defaulting to empty.
    pub options: HashMap<String, OptionValue>,
}

/// One field the external credentials UI must render for a platform.
#[derive(Debug, Clone, Getters)]
pub struct CredentialField {
    key: String,
    label: String,
    field_type: CredentialFieldType,
    required: bool,
    placeholder: Option<String>,
}

impl CredentialField {
    /// Describe a new credential field.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        field_type: CredentialFieldType,
        required: bool,
        placeholder: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required,
            placeholder,
        }
    }
}

/// Rendering hint for a [`CredentialField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFieldType {
    /// Plain visible text.
    Text,
    /// Masked input.
    Password,
}

/// One per-platform override option the external compose UI may expose.
#[derive(Debug, Clone, Getters)]
pub struct OptionField {
    key: String,
    label: String,
    field_type: OptionFieldType,
    enum_values: Option<Vec<String>>,
    description: Option<String>,
}

impl OptionField {
    /// Describe a new option field.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        field_type: OptionFieldType,
        enum_values: Option<Vec<String>>,
        description: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            enum_values,
            description,
        }
    }
}

/// Type of an [`OptionField`]'s value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionFieldType {
    /// Free-form string.
    String,
    /// Boolean toggle.
    Boolean,
    /// One of `enum_values`.
    Enum,
}

/// A platform's text/media limits, as declared by its adapter.
#[derive(Debug, Clone, Copy, Getters)]
pub struct CharacterLimits {
    max_chars: u32,
    max_chars_with_media: Option<u32>,
    requires_media: bool,
}

impl CharacterLimits {
    /// Declare a platform's character limits.
    pub fn new(max_chars: u32, max_chars_with_media: Option<u32>, requires_media: bool) -> Self {
        Self {
            max_chars,
            max_chars_with_media,
            requires_media,
        }
    }
}

/// One field-level validation failure from `validatePost`.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field this error concerns (e.g. `"text"`, `"media"`).
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

/// The result of `mapError`: a stable code, a bounded message, and a
/// retryability classification.
#[derive(Debug, Clone)]
pub struct MappedAdapterError {
    /// Stable short error code, used as `PublishAttempt.error_code`.
    pub code: String,
    /// Human-readable message, truncated to 500 characters before
    /// persistence by the publisher.
    pub message: String,
    /// Whether the same request may succeed later without changing inputs.
    pub retryable: bool,
}
