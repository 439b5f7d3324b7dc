//! Application constants.
//!
//! Centralizes magic numbers and configuration defaults.

/// Deduplication tracker capacities.
pub mod dedup {
    /// Recently seen channel-point redemption ids kept per process.
    pub const REDEMPTION_CAPACITY: usize = 100;

    /// Recently seen donation/tip ids kept per poller.
    pub const POLL_CAPACITY: usize = 200;
}

/// Background polling defaults.
pub mod polling {
    /// Seconds between donation API polls.
    pub const DONATION_INTERVAL_SECS: u64 = 20;

    /// Seconds between tip API polls.
    pub const TIP_INTERVAL_SECS: u64 = 30;

    /// Items requested per poll.
    pub const FETCH_LIMIT: usize = 25;

    /// HTTP timeout for a single poll request.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Playback scheduling defaults.
pub mod playback {
    /// Minimum seconds an active overlay stays up before a waiting one replaces it.
    pub const MIN_HOLD_SECS: u64 = 5;

    /// Layer used when a command or definition names none.
    pub const DEFAULT_LAYER: &str = "main";
}

/// Persisted document file names inside the data directory.
pub mod files {
    /// Goal list and weights.
    pub const GOALS: &str = "goals.json";

    /// Alert catalog and custom redemption triggers.
    pub const REDEMPTIONS: &str = "redemptions.json";

    /// Cooldown windows.
    pub const COOLDOWNS: &str = "cooldowns.json";
}

/// Sticker canvas used when a viewer does not give coordinates.
pub mod canvas {
    /// Canvas width in pixels.
    pub const WIDTH: u32 = 1920;

    /// Canvas height in pixels.
    pub const HEIGHT: u32 = 1080;
}
