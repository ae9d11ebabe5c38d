/// The closed set of platforms the engine can publish to.
///
/// Represented as a tagged variant with explicit exhaustiveness rather than
/// a free string, even though the store serializes it as text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Twitter/X.
    Twitter,
    /// Telegram, via the Bot API.
    Telegram,
    /// Instagram, via the Graph API container flow.
    Instagram,
    /// Facebook, via the Graph API page feed.
    Facebook,
    /// Mastodon, via the v2 media + statuses API.
    Mastodon,
    /// Bluesky, via the AT Protocol.
    Bluesky,
    /// Discord, via inline message attachments.
    Discord,
    /// Threads, via the Graph API container flow.
    Threads,
}

impl Platform {
    /// All eight platforms, in a stable order, for `listAll()`.
    pub fn all() -> [Platform; 8] {
        [
            Platform::Twitter,
            Platform::Telegram,
            Platform::Instagram,
            Platform::Facebook,
            Platform::Mastodon,
            Platform::Bluesky,
            Platform::Discord,
            Platform::Threads,
        ]
    }
}
