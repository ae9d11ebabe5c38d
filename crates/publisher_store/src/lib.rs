//! Persistence layer: the [`Store`] trait and its implementations.
//!
//! [`pg::PgStore`] is the production backend. [`memory::InMemoryStore`]
//! backs local smoke-testing when no `DATABASE_URL` is configured, and the
//! unit tests elsewhere in the workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod memory;
mod migrations;
mod models;
mod pg;
mod schema;
mod store;

pub use connection::{build_pool, PgPool};
pub use memory::InMemoryStore;
pub use migrations::run_pending;
pub use pg::PgStore;
pub use store::{NewPost, NewTarget, PostPatch, Store, StoreResult, TargetPatch};
