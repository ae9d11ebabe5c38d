//! Error types for the publisher scheduling and publishing engine.
//!
//! # Error Hierarchy
//!
//! Each subsystem defines its own `*ErrorKind` enum describing the specific
//! conditions it can fail with, wrapped in a struct that also carries the
//! source location the error was constructed at (`line`, `file`). The
//! top-level [`PublisherError`] unifies every subsystem error behind one
//! type via `derive_more::From`, so callers that only care about "did this
//! fail" can match on one enum, while callers that care about the specific
//! subsystem can still match on the nested kind.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod engine;
mod error;
mod registry;
mod scheduler;
#[cfg(feature = "store")]
mod store;

pub use adapter::{AdapterError, AdapterErrorKind};
pub use config::{ConfigError, ConfigErrorKind};
pub use engine::{PublishError, PublishErrorKind};
pub use error::{PublisherError, PublisherErrorKind, PublisherResult};
pub use registry::{RegistryError, RegistryErrorKind};
pub use scheduler::{SchedulerError, SchedulerErrorKind};
#[cfg(feature = "store")]
pub use store::{StoreError, StoreErrorKind};
