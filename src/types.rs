//! Core type definitions shared across features.
//!
//! Newtype wrappers keep external event identifiers and display layers from
//! being mixed up with arbitrary strings at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::playback::DEFAULT_LAYER;

/// External event identifier (redemption id, donation id, tip id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// Create a new `EventId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Independent display channel. Visuals on different layers never contend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Layer(pub String);

impl Layer {
    /// Create a new `Layer` from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self(DEFAULT_LAYER.to_string())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Layer {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// On-screen rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Placement {
    /// Distance from the top edge.
    pub top: i32,
    /// Distance from the left edge.
    pub left: i32,
    /// Width of the visual.
    pub width: u32,
    /// Height of the visual.
    pub height: u32,
}

impl Placement {
    /// Build a placement from its four edges.
    pub const fn new(top: i32, left: i32, width: u32, height: u32) -> Self {
        Self { top, left, width, height }
    }
}

/// One overlay playback request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Opaque visual reference understood by the presentation layer.
    pub visual: String,
    /// Where the visual is drawn.
    #[serde(default)]
    pub placement: Placement,
    /// Draw horizontally flipped.
    #[serde(default)]
    pub mirrored: bool,
    /// Target display layer.
    #[serde(default)]
    pub layer: Layer,
}

impl QueueItem {
    /// Create an unmirrored item on the default layer.
    pub fn new(visual: impl Into<String>, placement: Placement) -> Self {
        Self {
            visual: visual.into(),
            placement,
            mirrored: false,
            layer: Layer::default(),
        }
    }

    /// Same item targeting another layer.
    #[must_use]
    pub fn on_layer(self, layer: impl Into<Layer>) -> Self {
        Self { layer: layer.into(), ..self }
    }

    /// Same item at another placement.
    #[must_use]
    pub const fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

/// A claimed channel-point reward. Lives only for the duration of routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionEvent {
    /// Platform redemption id; retried notifications repeat it.
    pub id: EventId,
    /// Viewer display name.
    pub display_name: String,
    /// Reward title as configured on the platform.
    pub reward_title: String,
    /// Point cost of the reward.
    pub cost: u32,
    /// Free text the viewer typed, possibly empty.
    #[serde(default)]
    pub message: String,
}
