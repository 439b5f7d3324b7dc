//! Donation data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EventId;

/// One donation as reported by the donation platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    /// Platform id, stable across polls.
    pub id: EventId,
    /// Amount in the streamer's currency units
    pub amount: f64,
    /// ISO currency code.
    pub currency: String,
    /// Donor display name
    pub name: String,
    /// Note left with the donation.
    #[serde(default)]
    pub message: String,
    /// When the donation was made.
    pub created_at: DateTime<Utc>,
}
