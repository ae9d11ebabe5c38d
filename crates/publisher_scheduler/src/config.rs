//! Runtime configuration, loaded from a TOML file with `.env`-backed
//! environment fallbacks.

use std::path::Path;

use publisher_error::ConfigError;
use serde::Deserialize;

fn default_poll_interval_ms() -> u64 {
    15_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_media_storage_path() -> String {
    "./media".to_string()
}

fn default_stuck_publishing_threshold_secs() -> u64 {
    150
}

/// Recognized configuration options for the scheduler and publish
/// pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// Tick period for the scheduler loop.
    #[serde(default = "default_poll_interval_ms")]
    pub scheduler_poll_interval_ms: u64,
    /// Cap on total attempts per target before it stops being retried.
    #[serde(default = "default_max_retries")]
    pub scheduler_max_retries: u32,
    /// Root directory for on-disk media, read by adapters via each asset's
    /// `storage_path`.
    #[serde(default = "default_media_storage_path")]
    pub media_storage_path: String,
    /// How long a post may sit in `publishing` before the scheduler
    /// considers it stuck and resets it for re-claiming (ten poll
    /// intervals by default).
    #[serde(default = "default_stuck_publishing_threshold_secs")]
    pub stuck_publishing_threshold_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            scheduler_poll_interval_ms: default_poll_interval_ms(),
            scheduler_max_retries: default_max_retries(),
            media_storage_path: default_media_storage_path(),
            stuck_publishing_threshold_secs: default_stuck_publishing_threshold_secs(),
        }
    }
}

impl PublisherConfig {
    /// Load configuration from a TOML file. Missing fields fall back to
    /// their documented defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Non-fatal configuration warnings, in the spirit of a sanity check
    /// rather than validation that blocks startup.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.scheduler_poll_interval_ms < 1000 {
            warnings.push("scheduler_poll_interval_ms below 1000ms may overwhelm the database".to_string());
        }
        if self.scheduler_max_retries == 0 {
            warnings.push("scheduler_max_retries is 0: failed targets will never be retried".to_string());
        }
        if self.stuck_publishing_threshold_secs * 1000 < self.scheduler_poll_interval_ms {
            warnings.push("stuck_publishing_threshold_secs is shorter than one poll interval".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_spec() {
        let config = PublisherConfig::default();
        assert_eq!(config.scheduler_poll_interval_ms, 15_000);
        assert_eq!(config.scheduler_max_retries, 3);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: PublisherConfig = toml::from_str("scheduler_max_retries = 5\n").unwrap();
        assert_eq!(config.scheduler_max_retries, 5);
        assert_eq!(config.scheduler_poll_interval_ms, 15_000);
    }

    #[test]
    fn warns_on_zero_retries() {
        let mut config = PublisherConfig::default();
        config.scheduler_max_retries = 0;
        assert!(!config.validate().is_empty());
    }
}
