//! Time-windowed rate limiting for users and features.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Last-permitted timestamps keyed by subject (`user:<name>`, `alert:<name>`, ...).
///
/// State is created lazily and never swept; the subject count is bounded by
/// the audience of a single channel.
#[derive(Debug, Default)]
pub struct CooldownGate {
    stamps: HashMap<String, DateTime<Utc>>,
}

impl CooldownGate {
    /// Create an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit and stamp `now` if `subject` has no stamp or its window elapsed.
    pub fn try_acquire(&mut self, subject: &str, min_interval: Duration, now: DateTime<Utc>) -> bool {
        let permitted = self
            .stamps
            .get(subject)
            .map_or(true, |last| now.signed_duration_since(*last) >= min_interval);
        if permitted {
            self.stamps.insert(subject.to_string(), now);
        }
        permitted
    }

    /// Time left before `subject` is permitted again.
    pub fn remaining(&self, subject: &str, min_interval: Duration, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.stamps.get(subject)?;
        let left = min_interval - now.signed_duration_since(*last);
        (left > Duration::zero()).then_some(left)
    }

    /// Number of subjects with a stamp.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Whether no subject has been stamped.
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

/// Persisted cooldown windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    /// Seconds a viewer waits between chat-triggered alerts.
    pub user_command_secs: u64,
    /// Overrides for individual features, keyed by feature name.
    pub features: HashMap<String, u64>,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            user_command_secs: 60,
            features: HashMap::new(),
        }
    }
}

impl CooldownSettings {
    /// Window for viewer-triggered chat commands.
    pub fn user_window(&self) -> Duration {
        secs(self.user_command_secs)
    }

    /// Window for `feature`, preferring an override over `fallback_secs`.
    ///
    /// Override keys match case-insensitively, with or without an `alert:` prefix.
    pub fn feature_window(&self, feature: &str, fallback_secs: u64) -> Duration {
        let wanted = feature_key(feature);
        let configured = self
            .features
            .iter()
            .find(|(key, _)| feature_key(key) == wanted)
            .map(|(_, value)| *value);
        secs(configured.unwrap_or(fallback_secs))
    }
}

fn feature_key(name: &str) -> String {
    let name = name.trim().to_lowercase();
    name.strip_prefix("alert:").unwrap_or(&name).to_string()
}

fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value.min(u64::from(u32::MAX))).unwrap_or_default())
}

/// Cooldown subject key for a viewer.
pub fn user_subject(name: &str) -> String {
    format!("user:{}", name.to_lowercase())
}

/// Cooldown subject key for a feature.
pub fn feature_subject(name: &str) -> String {
    format!("alert:{}", name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn window_blocks_until_elapsed() {
        let mut gate = CooldownGate::new();
        let window = Duration::seconds(60);

        assert!(gate.try_acquire("viewer", window, t0()));
        assert!(!gate.try_acquire("viewer", window, t0() + Duration::seconds(30)));
        assert!(gate.try_acquire("viewer", window, t0() + Duration::seconds(61)));
    }

    #[test]
    fn denied_attempt_does_not_restamp() {
        let mut gate = CooldownGate::new();
        let window = Duration::seconds(60);

        assert!(gate.try_acquire("viewer", window, t0()));
        assert!(!gate.try_acquire("viewer", window, t0() + Duration::seconds(59)));
        assert!(gate.try_acquire("viewer", window, t0() + Duration::seconds(60)));
    }

    #[test]
    fn subjects_are_independent() {
        let mut gate = CooldownGate::new();
        let window = Duration::seconds(60);

        assert!(gate.try_acquire(&user_subject("Alice"), window, t0()));
        assert!(gate.try_acquire(&user_subject("Bob"), window, t0()));
        assert!(!gate.try_acquire(&user_subject("alice"), window, t0()));
        assert_eq!(gate.len(), 2);
    }

    #[test]
    fn remaining_reports_time_left() {
        let mut gate = CooldownGate::new();
        let window = Duration::seconds(60);
        gate.try_acquire("x", window, t0());

        assert_eq!(
            gate.remaining("x", window, t0() + Duration::seconds(45)),
            Some(Duration::seconds(15))
        );
        assert_eq!(gate.remaining("x", window, t0() + Duration::seconds(90)), None);
        assert_eq!(gate.remaining("y", window, t0()), None);
    }

    #[test]
    fn feature_override_beats_fallback() {
        let mut settings = CooldownSettings::default();
        settings.features.insert("alert:hype".to_string(), 10);
        settings.features.insert("Sticker".to_string(), 30);

        assert_eq!(settings.feature_window("Hype", 99), Duration::seconds(10));
        assert_eq!(settings.feature_window("alert:hype", 99), Duration::seconds(10));
        assert_eq!(settings.feature_window("sticker", 99), Duration::seconds(30));
        assert_eq!(settings.feature_window("other", 99), Duration::seconds(99));
    }
}
