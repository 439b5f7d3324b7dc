//! Application configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{dedup, files, playback, polling};
use crate::error::Result;

/// Default donation platform endpoint.
pub const DEFAULT_DONATION_API_URL: &str = "https://streamlabs.com/api/v2.0";
/// Default tip platform endpoint.
pub const DEFAULT_TIP_API_URL: &str = "https://api.streamelements.com/kappa/v2";

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The application name
    app_name: String,
    /// The application version
    app_version: String,
    /// Directory holding the per-feature JSON documents
    pub data_dir: PathBuf,
    /// Donation platform base URL
    pub donation_api_url: String,
    /// Donation platform access token
    pub donation_api_token: String,
    /// Seconds between donation polls
    pub donation_poll_secs: u64,
    /// Tip platform base URL
    pub tip_api_url: String,
    /// Tip platform JWT
    pub tip_api_token: String,
    /// Tip platform channel id
    pub tip_channel_id: String,
    /// Seconds between tip polls
    pub tip_poll_secs: u64,
    /// Minimum seconds an overlay stays up before being replaced
    pub min_hold_secs: u64,
    /// Capacity of the redemption dedup tracker
    pub redemption_dedup_capacity: usize,
    /// Capacity of each poller's dedup tracker
    pub poll_dedup_capacity: usize,
}

impl Config {
    /// Get the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: default_data_dir(),
            donation_api_url: DEFAULT_DONATION_API_URL.to_string(),
            donation_api_token: String::new(),
            donation_poll_secs: polling::DONATION_INTERVAL_SECS,
            tip_api_url: DEFAULT_TIP_API_URL.to_string(),
            tip_api_token: String::new(),
            tip_channel_id: String::new(),
            tip_poll_secs: polling::TIP_INTERVAL_SECS,
            min_hold_secs: playback::MIN_HOLD_SECS,
            redemption_dedup_capacity: dedup::REDEMPTION_CAPACITY,
            poll_dedup_capacity: dedup::POLL_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    #[allow(clippy::unnecessary_wraps)] // Returns Result for forward-compatible API
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self::default();

        if let Ok(path) = env::var("ALERTDECK_DATA_DIR") {
            config.data_dir = PathBuf::from(shellexpand::tilde(&path).to_string());
        }

        if let Ok(url) = env::var("DONATION_API_URL") {
            config.donation_api_url = url;
        }
        if let Ok(token) = env::var("DONATION_API_TOKEN") {
            config.donation_api_token = token;
        }
        if let Ok(url) = env::var("TIP_API_URL") {
            config.tip_api_url = url;
        }
        if let Ok(token) = env::var("TIP_API_TOKEN") {
            config.tip_api_token = token;
        }
        if let Ok(channel) = env::var("TIP_CHANNEL_ID") {
            config.tip_channel_id = channel;
        }

        // Numeric settings keep their defaults when unparseable
        override_parsed("DONATION_POLL_SECS", &mut config.donation_poll_secs);
        override_parsed("TIP_POLL_SECS", &mut config.tip_poll_secs);
        override_parsed("MIN_HOLD_SECS", &mut config.min_hold_secs);
        override_parsed("REDEMPTION_DEDUP_CAPACITY", &mut config.redemption_dedup_capacity);
        override_parsed("POLL_DEDUP_CAPACITY", &mut config.poll_dedup_capacity);

        Ok(config)
    }

    /// Check if the donation poller can run
    pub fn has_donation_credentials(&self) -> bool {
        !self.donation_api_token.is_empty()
    }

    /// Check if the tip poller can run
    pub fn has_tip_credentials(&self) -> bool {
        !self.tip_api_token.is_empty() && !self.tip_channel_id.is_empty()
    }

    /// Same configuration, keeping its documents under `dir`.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Minimum overlay hold as a `Duration`.
    pub const fn min_hold(&self) -> Duration {
        Duration::from_secs(self.min_hold_secs)
    }

    /// Path of the goal document.
    pub fn goals_path(&self) -> PathBuf {
        self.data_dir.join(files::GOALS)
    }

    /// Path of the redemption catalog document.
    pub fn redemptions_path(&self) -> PathBuf {
        self.data_dir.join(files::REDEMPTIONS)
    }

    /// Path of the cooldown table document.
    pub fn cooldowns_path(&self) -> PathBuf {
        self.data_dir.join(files::COOLDOWNS)
    }

    /// Data directory as a borrowed path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn override_parsed<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!("Ignoring unparseable {key}={raw}"),
        }
    }
}

/// Platform data directory, falling back to the working directory
fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".alertdeck"), |d| d.join("alertdeck"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_pollers() {
        let config = Config::default();
        assert!(!config.has_donation_credentials());
        assert!(!config.has_tip_credentials());
        assert_eq!(config.min_hold(), Duration::from_secs(playback::MIN_HOLD_SECS));
    }

    #[test]
    fn tip_credentials_need_channel() {
        let config = Config {
            tip_api_token: "jwt".to_string(),
            ..Config::default()
        };
        assert!(!config.has_tip_credentials());

        let config = Config {
            tip_channel_id: "abc".to_string(),
            ..config
        };
        assert!(config.has_tip_credentials());
    }

    #[test]
    fn document_paths_live_in_data_dir() {
        let config = Config::default().with_data_dir("/tmp/deck");
        assert_eq!(config.data_dir(), Path::new("/tmp/deck"));
        assert_eq!(config.app_name(), env!("CARGO_PKG_NAME"));
        assert_eq!(config.goals_path(), PathBuf::from("/tmp/deck/goals.json"));
        assert_eq!(config.cooldowns_path(), PathBuf::from("/tmp/deck/cooldowns.json"));
    }
}
