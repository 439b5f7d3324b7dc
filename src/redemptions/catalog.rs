//! Persisted alert catalog and custom trigger settings.

use serde::{Deserialize, Serialize};

use crate::types::{QueueItem, RedemptionEvent};

/// A named overlay that rewards, cheers or chat commands can trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDefinition {
    /// Unique display name, also the cooldown key.
    pub name: String,
    /// Keyword matched against reward titles, messages and chat commands.
    pub command: String,
    /// Exact channel-point cost that triggers it, if any.
    #[serde(default)]
    pub cost: Option<u32>,
    /// Exact cheer amount that triggers it, if any.
    #[serde(default)]
    pub bits: Option<u32>,
    /// Viewers may trigger it with `!command` in chat.
    #[serde(default)]
    pub chat_enabled: bool,
    /// Seconds before it may play again.
    #[serde(default)]
    pub cooldown_secs: u64,
    /// Overlay to play.
    pub item: QueueItem,
}

/// Shared gating for custom triggers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerGate {
    /// Trigger is switched on.
    pub enabled: bool,
    /// Minimum reward cost.
    pub min_cost: u32,
    /// Text that must appear in the reward title or message. Empty matches all.
    pub command: String,
}

impl TriggerGate {
    /// Whether `event` passes this gate.
    pub fn admits(&self, event: &RedemptionEvent) -> bool {
        if !self.enabled || event.cost < self.min_cost {
            return false;
        }
        let command = self.command.trim().to_lowercase();
        command.is_empty()
            || event.reward_title.to_lowercase().contains(&command)
            || event.message.to_lowercase().contains(&command)
    }
}

/// Viewer-placed sticker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StickerTrigger {
    /// When a redemption places a sticker.
    pub gate: TriggerGate,
    /// Sticker visual; its placement supplies width and height.
    pub item: Option<QueueItem>,
}

/// On-screen countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownTrigger {
    /// When a redemption starts a countdown.
    pub gate: TriggerGate,
    /// Length of the countdown.
    pub seconds: u32,
}

impl Default for CountdownTrigger {
    fn default() -> Self {
        Self {
            gate: TriggerGate::default(),
            seconds: 60,
        }
    }
}

/// A backdrop viewers can choose by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBackdrop {
    /// Name viewers type in the redemption message.
    pub name: String,
    /// Visual reference hung behind the scene.
    pub visual: String,
}

/// Backdrop change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropTrigger {
    /// When a redemption changes the backdrop.
    pub gate: TriggerGate,
    /// Choices; an unnamed request picks one at random.
    pub backdrops: Vec<NamedBackdrop>,
}

/// Giveaway entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GiveawayTrigger {
    /// When a redemption enters the viewer.
    pub gate: TriggerGate,
}

/// Alert for donations and tips at or above an amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyAlert {
    /// Smallest amount that plays it.
    pub min_amount: f64,
    /// Overlay to play.
    pub item: QueueItem,
}

/// Persisted redemption catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedemptionCatalog {
    /// Reward-title keyword that plays a random catalog alert.
    pub random_keyword: String,
    /// Named alerts.
    pub alerts: Vec<AlertDefinition>,
    /// Sticker placement.
    pub sticker: StickerTrigger,
    /// Countdown timer.
    pub countdown: CountdownTrigger,
    /// Backdrop change.
    pub backdrop: BackdropTrigger,
    /// Giveaway entry.
    pub giveaway: GiveawayTrigger,
    /// Donation and tip alerts by amount.
    pub money_alerts: Vec<MoneyAlert>,
}

impl Default for RedemptionCatalog {
    fn default() -> Self {
        Self {
            random_keyword: "random alert".to_string(),
            alerts: Vec::new(),
            sticker: StickerTrigger::default(),
            countdown: CountdownTrigger::default(),
            backdrop: BackdropTrigger::default(),
            giveaway: GiveawayTrigger::default(),
            money_alerts: Vec::new(),
        }
    }
}

impl RedemptionCatalog {
    /// Alert whose command equals `command` (case-insensitive, `!` optional).
    pub fn by_command(&self, command: &str) -> Option<&AlertDefinition> {
        let wanted = command.trim().trim_start_matches('!');
        if wanted.is_empty() {
            return None;
        }
        self.alerts
            .iter()
            .find(|a| a.command.trim_start_matches('!').eq_ignore_ascii_case(wanted))
    }

    /// Chat-enabled alert for `!command`.
    pub fn chat_alert(&self, command: &str) -> Option<&AlertDefinition> {
        self.by_command(command).filter(|a| a.chat_enabled)
    }

    /// Alert bound to exactly `bits`.
    pub fn cheer_alert(&self, bits: u32) -> Option<&AlertDefinition> {
        self.alerts.iter().find(|a| a.bits == Some(bits))
    }

    /// Highest money alert whose threshold `amount` reaches.
    pub fn money_alert(&self, amount: f64) -> Option<&MoneyAlert> {
        self.money_alerts
            .iter()
            .filter(|m| amount >= m.min_amount)
            .max_by(|a, b| a.min_amount.total_cmp(&b.min_amount))
    }
}
