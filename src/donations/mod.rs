//! Donation platform integration.
//!
//! Polls the donation API for recent donations and feeds new ones into the
//! alert pipeline through the generic background poller.

/// REST client for the donation API
pub mod api;
/// Data types representing donation resources
pub mod types;

// Re-export key components
pub use api::DonationClient;
pub use types::Donation;
