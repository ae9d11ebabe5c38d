//! Domain model for the publisher scheduling and publishing engine.
//!
//! This crate defines the domain entities (`Post`, `PlatformTarget`,
//! `PublishAttempt`, `MediaAsset`, `PostMediaLink`, `PlatformCredentials`),
//! the closed-set `Platform` and status enumerations, and the resolved
//! [`Content`] shape the adapter contract operates on. It has no I/O and
//! no knowledge of persistence or HTTP — those live in `publisher_store`
//! and `publisher_adapters`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod content;
mod ids;
mod model;
mod platform;
mod status;

pub use content::{
    CharacterLimits, Content, CredentialField, CredentialFieldType, MappedAdapterError,
    MediaRef, OptionField, OptionFieldType, OptionValue, ValidationError,
};
pub use ids::{AttemptId, MediaAssetId, PostId, TargetId};
pub use model::{MediaAsset, MediaType, Post, PlatformCredentials, PlatformTarget, PostMediaLink, PublishAttempt};
pub use platform::Platform;
pub use status::{PostStatus, TargetStatus, reduce_post_status};
