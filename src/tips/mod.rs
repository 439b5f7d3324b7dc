//! Tip platform integration.
//!
//! Same polling pattern as donations, against the tip platform's channel
//! activity listing.

/// REST client for the tip API
pub mod api;
/// Data types representing tip resources
pub mod types;

pub use api::TipClient;
pub use types::Tip;
