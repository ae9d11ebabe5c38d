//! Top-level error that unifies every subsystem error.

use crate::{AdapterError, ConfigError, PublishError, RegistryError, SchedulerError};
#[cfg(feature = "store")]
use crate::StoreError;

/// Union of every subsystem error in the publisher engine.
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PublisherErrorKind {
    /// A store/persistence failure.
    #[from(StoreError)]
    #[cfg(feature = "store")]
    Store(StoreError),
    /// A platform adapter failure.
    #[from(AdapterError)]
    Adapter(AdapterError),
    /// An adapter registry failure.
    #[from(RegistryError)]
    Registry(RegistryError),
    /// A publish pipeline failure.
    #[from(PublishError)]
    Publish(PublishError),
    /// A scheduler loop failure.
    #[from(SchedulerError)]
    Scheduler(SchedulerError),
    /// A configuration failure.
    #[from(ConfigError)]
    Config(ConfigError),
}

/// The publisher engine's top-level error type.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Publisher Error: {}", _0)]
pub struct PublisherError(Box<PublisherErrorKind>);

impl PublisherError {
    /// Wrap a subsystem error kind.
    pub fn new(kind: PublisherErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// The wrapped error kind.
    pub fn kind(&self) -> &PublisherErrorKind {
        &self.0
    }
}

impl<T> From<T> for PublisherError
where
    T: Into<PublisherErrorKind>,
{
    fn from(value: T) -> Self {
        Self::new(value.into())
    }
}

/// Convenience alias for `Result<T, PublisherError>`.
pub type PublisherResult<T> = std::result::Result<T, PublisherError>;
