//! `AlertDeck` - stream alert engine.
//!
//! Turns chat, channel-point, donation and tip events into overlay playback
//! requests, enforcing deduplication, cooldowns, single-flight playback per
//! layer, and incremental goal progression.

// Re-export public modules for use in integration tests and the binaries
pub mod config;
pub mod constants;
pub mod cooldown;
pub mod dedup;
pub mod donations;
pub mod error;
pub mod goals;
pub mod poller;
pub mod presentation;
pub mod redemptions;
pub mod scheduler;
pub mod services;
pub mod shutdown;
pub mod store;
pub mod tips;
pub mod types;
