//! The adapter registry: platform tag → adapter factory.

use std::collections::HashMap;
use std::sync::Arc;

use publisher_core::{CharacterLimits, CredentialField, OptionField, Platform};
use publisher_error::{RegistryError, RegistryErrorKind};
use publisher_store::Store;
use tracing::instrument;

use crate::adapter::PlatformAdapter;
use crate::{
    BlueskyAdapter, DiscordAdapter, FacebookAdapter, InstagramAdapter, MastodonAdapter,
    TelegramAdapter, ThreadsAdapter, TwitterAdapter,
};

/// Builds one platform's adapter from a (possibly empty) credentials map.
pub type AdapterFactory =
    Box<dyn Fn(&HashMap<String, String>, Arc<reqwest::Client>) -> Arc<dyn PlatformAdapter> + Send + Sync>;

/// Static platform → factory mapping plus the store and HTTP client every
/// adapter is built with.
pub struct AdapterRegistry {
    factories: HashMap<Platform, AdapterFactory>,
    store: Arc<dyn Store>,
    http: Arc<reqwest::Client>,
}

fn factory_for(platform: Platform) -> AdapterFactory {
    match platform {
        Platform::Twitter => Box::new(|creds, http| Arc::new(TwitterAdapter::new(creds.clone(), http))),
        Platform::Telegram => Box::new(|creds, http| Arc::new(TelegramAdapter::new(creds.clone(), http))),
        Platform::Instagram => Box::new(|creds, http| Arc::new(InstagramAdapter::new(creds.clone(), http))),
        Platform::Facebook => Box::new(|creds, http| Arc::new(FacebookAdapter::new(creds.clone(), http))),
        Platform::Mastodon => Box::new(|creds, http| Arc::new(MastodonAdapter::new(creds.clone(), http))),
        Platform::Bluesky => Box::new(|creds, http| Arc::new(BlueskyAdapter::new(creds.clone(), http))),
        Platform::Discord => Box::new(|creds, http| Arc::new(DiscordAdapter::new(creds.clone(), http))),
        Platform::Threads => Box::new(|creds, http| Arc::new(ThreadsAdapter::new(creds.clone(), http))),
    }
}

impl AdapterRegistry {
    /// Build a registry wired to `store` for credential lookups, with all
    /// eight platforms' factories pre-registered.
    pub fn new(store: Arc<dyn Store>, http: Arc<reqwest::Client>) -> Self {
        let mut factories = HashMap::new();
        for platform in Platform::all() {
            factories.insert(platform, factory_for(platform));
        }
        Self { factories, store, http }
    }

    /// Load a platform's credentials, instantiate its adapter, and confirm
    /// it reports itself available. Returns `NotConfigured` if there is no
    /// credentials row or the adapter considers itself unavailable.
    #[instrument(skip(self))]
    pub async fn get_adapter(&self, platform: Platform) -> Result<Arc<dyn PlatformAdapter>, RegistryError> {
        let creds = self
            .store
            .get_credentials(platform)
            .await
            .map_err(|e| RegistryError::new(RegistryErrorKind::NotConfigured(e.to_string())))?
            .ok_or_else(|| RegistryError::new(RegistryErrorKind::NotConfigured(platform.to_string())))?;

        let adapter = self.build(platform, &creds.values)?;
        if !adapter.is_available() {
            return Err(RegistryError::new(RegistryErrorKind::NotConfigured(platform.to_string())));
        }
        Ok(adapter)
    }

    /// All eight supported platform tags, for the credentials UI.
    pub fn list_all(&self) -> Vec<Platform> {
        Platform::all().to_vec()
    }

    /// Platforms with a credentials row whose adapter reports itself
    /// available.
    #[instrument(skip(self))]
    pub async fn list_configured(&self) -> Result<Vec<Platform>, RegistryError> {
        let configured = self
            .store
            .list_configured_platforms()
            .await
            .map_err(|e| RegistryError::new(RegistryErrorKind::NotConfigured(e.to_string())))?;
        let mut available = Vec::new();
        for platform in configured {
            if let Ok(adapter) = self.get_adapter(platform).await {
                if adapter.is_available() {
                    available.push(platform);
                }
            }
        }
        Ok(available)
    }

    /// Instantiate a platform's adapter with no credentials, purely to
    /// read its static capability descriptors. These must not depend on
    /// live credentials.
    pub fn metadata(&self, platform: Platform) -> Result<AdapterMetadata, RegistryError> {
        let adapter = self.build(platform, &HashMap::new())?;
        Ok(AdapterMetadata {
            credential_fields: adapter.credential_fields(),
            option_fields: adapter.option_fields(),
            character_limits: adapter.character_limits(),
        })
    }

    /// True iff `platform` has a registered factory (always true for the
    /// eight built-in platforms; kept for parity with the teacher's
    /// registry shape for future extensibility).
    pub fn has_platform(&self, platform: Platform) -> bool {
        self.factories.contains_key(&platform)
    }

    /// Reject `platforms` containing anything not currently in
    /// [`AdapterRegistry::list_configured`]. Used before a post is created
    /// so a target can never point at a platform with no usable
    /// credentials.
    #[instrument(skip(self))]
    pub async fn ensure_targets_configured(&self, platforms: &[Platform]) -> Result<(), RegistryError> {
        let configured = self.list_configured().await?;
        for platform in platforms {
            if !configured.contains(platform) {
                return Err(RegistryError::new(RegistryErrorKind::NotConfigured(platform.to_string())));
            }
        }
        Ok(())
    }

    /// Build `platform`'s adapter from a candidate credentials map (not
    /// yet persisted) and confirm it authenticates against the remote.
    /// Used by `setCredentials` to verify before writing.
    #[instrument(skip(self, values))]
    pub async fn verify_candidate_credentials(
        &self,
        platform: Platform,
        values: &HashMap<String, String>,
    ) -> Result<(), RegistryError> {
        let adapter = self.build(platform, values)?;
        adapter.verify_credentials().await.map_err(|e| {
            RegistryError::new(RegistryErrorKind::VerificationFailed {
                platform: platform.to_string(),
                reason: e.to_string(),
            })
        })
    }

    fn build(&self, platform: Platform, values: &HashMap<String, String>) -> Result<Arc<dyn PlatformAdapter>, RegistryError> {
        let factory = self
            .factories
            .get(&platform)
            .ok_or_else(|| RegistryError::new(RegistryErrorKind::UnknownPlatform(platform.to_string())))?;
        Ok(factory(values, Arc::clone(&self.http)))
    }
}

/// A platform's static capability descriptors, read with null credentials.
pub struct AdapterMetadata {
    /// Ordered credential fields the external UI must render.
    pub credential_fields: Vec<CredentialField>,
    /// Per-platform override-option descriptors.
    pub option_fields: Vec<OptionField>,
    /// This platform's hard-coded text/media limits.
    pub character_limits: CharacterLimits,
}
