//! Tip data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EventId;

/// One tip as reported by the tip platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    /// Platform id, stable across polls.
    pub id: EventId,
    /// Amount in `currency`.
    pub amount: f64,
    /// ISO currency code.
    pub currency: String,
    /// Tipper username
    pub name: String,
    /// Note left with the tip.
    #[serde(default)]
    pub message: String,
    /// When the tip was made.
    pub created_at: DateTime<Utc>,
}
