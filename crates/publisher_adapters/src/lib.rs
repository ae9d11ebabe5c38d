//! Platform adapters and the adapter registry.
//!
//! Every adapter implements [`PlatformAdapter`] against one remote HTTP
//! API. Adapters are pure functions of their credentials plus the remote
//! service: they hold no mutable state beyond an optional cached auth
//! session, and they never touch the [`publisher_store::Store`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod bluesky;
mod discord;
mod facebook;
mod instagram;
mod mastodon;
mod registry;
mod telegram;
mod threads;
mod twitter;

pub use adapter::PlatformAdapter;
pub use registry::{AdapterFactory, AdapterRegistry};

pub use bluesky::BlueskyAdapter;
pub use discord::DiscordAdapter;
pub use facebook::FacebookAdapter;
pub use instagram::InstagramAdapter;
pub use mastodon::MastodonAdapter;
pub use telegram::TelegramAdapter;
pub use threads::ThreadsAdapter;
pub use twitter::TwitterAdapter;
