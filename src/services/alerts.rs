//! The alert service: every ingestion port wired to the core components.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::cooldown::{feature_subject, user_subject, CooldownGate, CooldownSettings};
use crate::dedup::DeduplicationTracker;
use crate::donations::Donation;
use crate::error::Result;
use crate::goals::{ContributionSource, GoalProgressionEngine, SubTier};
use crate::poller::PollHandler;
use crate::presentation::Presenter;
use crate::redemptions::{route, Giveaway, RedemptionCatalog, RouteAction};
use crate::scheduler::PlaybackScheduler;
use crate::store::JsonStore;
use crate::tips::Tip;
use crate::types::{EventId, Layer, QueueItem, RedemptionEvent};

/// `Cheer100`-style tokens the chat platform embeds in cheer messages.
#[allow(clippy::expect_used)]
static RE_CHEER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcheer\d+\b").expect("valid regex: RE_CHEER_TOKEN"));

/// Remove cheer tokens and collapse the whitespace they leave behind.
pub fn strip_cheer_tokens(text: &str) -> String {
    RE_CHEER_TOKEN
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which money platform a payment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payment {
    Donation,
    Tip,
}

impl Payment {
    const fn label(self) -> &'static str {
        match self {
            Self::Donation => "donation",
            Self::Tip => "tip",
        }
    }
}

/// Receives chat, redemption and payment events and turns them into
/// playback, goal and presentation requests.
///
/// Configuration documents are owned here: each mutation is persisted before
/// the lock guarding it is released.
pub struct AlertService {
    scheduler: PlaybackScheduler,
    goals: Arc<GoalProgressionEngine>,
    presenter: Arc<dyn Presenter>,
    catalog: Mutex<RedemptionCatalog>,
    catalog_store: JsonStore<RedemptionCatalog>,
    cooldown_settings: Mutex<CooldownSettings>,
    cooldown_store: JsonStore<CooldownSettings>,
    cooldowns: Mutex<CooldownGate>,
    redemptions_seen: Mutex<DeduplicationTracker>,
    payments_seen: Mutex<DeduplicationTracker>,
    giveaway: Mutex<Giveaway>,
    rng: Mutex<StdRng>,
}

impl AlertService {
    /// Load the catalog and cooldown documents from `config.data_dir`.
    pub fn new(
        config: &Config,
        scheduler: PlaybackScheduler,
        goals: Arc<GoalProgressionEngine>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let catalog_store: JsonStore<RedemptionCatalog> = JsonStore::new(config.redemptions_path());
        let cooldown_store: JsonStore<CooldownSettings> = JsonStore::new(config.cooldowns_path());
        let catalog = catalog_store.load();
        info!(alerts = catalog.alerts.len(), "redemption catalog loaded");

        Self {
            scheduler,
            goals,
            presenter,
            catalog: Mutex::new(catalog),
            catalog_store,
            cooldown_settings: Mutex::new(cooldown_store.load()),
            cooldown_store,
            cooldowns: Mutex::new(CooldownGate::new()),
            redemptions_seen: Mutex::new(DeduplicationTracker::new(config.redemption_dedup_capacity)),
            payments_seen: Mutex::new(DeduplicationTracker::new(config.poll_dedup_capacity)),
            giveaway: Mutex::new(Giveaway::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the random source, for reproducible picks.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    // --- Ingestion ports ---

    /// A chat line, optionally carrying a cheer.
    pub async fn on_chat_message(&self, text: &str, display_name: &str, bits: u32, is_broadcaster: bool) {
        if bits > 0 {
            self.on_cheer(display_name, bits).await;
        }

        let text = strip_cheer_tokens(text);
        let Some(rest) = text.strip_prefix('!') else {
            return;
        };
        let mut words = rest.split_whitespace();
        let Some(command) = words.next() else {
            return;
        };
        let command = command.to_lowercase();
        let args: Vec<&str> = words.collect();

        if is_broadcaster && self.broadcaster_command(&command, &args).await {
            return;
        }
        self.viewer_command(display_name, &command).await;
    }

    /// A channel-point redemption. Retried deliveries of the same id are ignored.
    pub async fn on_reward_redeemed(&self, event: RedemptionEvent) {
        if !self.redemptions_seen.lock().await.check_and_record(event.id.as_str()) {
            debug!(id = %event.id, "duplicate redemption ignored");
            return;
        }

        let actions = {
            let catalog = self.catalog.lock().await;
            let mut rng = self.rng.lock().await;
            route(&catalog, &event, &mut *rng)
        };
        info!(
            id = %event.id,
            viewer = %event.display_name,
            reward = %event.reward_title,
            actions = actions.len(),
            "redemption routed"
        );

        for action in actions {
            self.execute(action).await;
        }
    }

    /// A donation from the donation platform.
    pub async fn on_donation(&self, id: &EventId, amount: f64, name: &str, message: &str, timestamp: DateTime<Utc>) {
        self.on_payment(Payment::Donation, id, amount, name, message, timestamp).await;
    }

    /// A tip from the tip platform.
    pub async fn on_tip(&self, id: &EventId, amount: f64, name: &str, message: &str, timestamp: DateTime<Utc>) {
        self.on_payment(Payment::Tip, id, amount, name, message, timestamp).await;
    }

    /// A new or renewed subscription.
    pub async fn on_subscription(&self, name: &str, tier: SubTier) {
        info!(viewer = name, ?tier, "subscription");
        self.goals
            .apply_value(name, 1.0, ContributionSource::Subscription, Some(tier))
            .await;
    }

    // --- Administration ---

    /// Show `item` outside the queue so its placement can be tuned.
    pub fn preview(&self, item: &QueueItem) {
        self.presenter.update_test_visual(item);
    }

    /// Remove the placement preview.
    pub fn stop_preview(&self) {
        self.presenter.stop_test_visual();
    }

    /// Copy of the current catalog.
    pub async fn catalog(&self) -> RedemptionCatalog {
        self.catalog.lock().await.clone()
    }

    /// Replace and persist the redemption catalog.
    pub async fn update_catalog(&self, catalog: RedemptionCatalog) -> Result<()> {
        let mut current = self.catalog.lock().await;
        self.catalog_store.save(&catalog)?;
        *current = catalog;
        Ok(())
    }

    /// Replace and persist the cooldown windows.
    pub async fn update_cooldowns(&self, settings: CooldownSettings) -> Result<()> {
        let mut current = self.cooldown_settings.lock().await;
        self.cooldown_store.save(&settings)?;
        *current = settings;
        Ok(())
    }

    /// Number of giveaway entrants.
    pub async fn giveaway_entries(&self) -> usize {
        self.giveaway.lock().await.len()
    }

    // --- Internals ---

    async fn on_cheer(&self, name: &str, bits: u32) {
        info!(viewer = name, bits, "cheer");
        self.goals
            .apply_value(name, f64::from(bits), ContributionSource::Cheer, None)
            .await;

        let alert = self.catalog.lock().await.cheer_alert(bits).cloned();
        if let Some(alert) = alert {
            self.play_alert(&alert.name, alert.item, alert.cooldown_secs, false).await;
        }
    }

    async fn on_payment(
        &self,
        kind: Payment,
        id: &EventId,
        amount: f64,
        name: &str,
        message: &str,
        timestamp: DateTime<Utc>,
    ) {
        let key = format!("{}:{id}", kind.label());
        if !self.payments_seen.lock().await.check_and_record(&key) {
            debug!(id = %id, source = kind.label(), "duplicate payment ignored");
            return;
        }
        info!(source = kind.label(), viewer = name, amount, message, at = %timestamp, "payment received");

        // Donations share the tip weight
        self.goals.apply_value(name, amount, ContributionSource::Tip, None).await;

        let alert = self.catalog.lock().await.money_alert(amount).map(|m| m.item.clone());
        if let Some(item) = alert {
            self.scheduler.enqueue(item);
        }
    }

    /// Broadcaster-only moderation commands. Returns false for unknown commands.
    async fn broadcaster_command(&self, command: &str, args: &[&str]) -> bool {
        match command {
            "takedown" => {
                let layer = args.first().map_or_else(Layer::default, |name| Layer::new(*name));
                info!(layer = %layer, "forced take-down");
                self.scheduler.force_clear(layer);
            }
            "backdrop" if args.first().is_some_and(|a| a.eq_ignore_ascii_case("off")) => {
                self.presenter.take_down_backdrop();
            }
            "draw" => {
                let winner = {
                    let mut pool = self.giveaway.lock().await;
                    let mut rng = self.rng.lock().await;
                    pool.draw(&mut *rng)
                };
                match winner {
                    Some(name) => {
                        info!(winner = %name, "giveaway drawn");
                        self.presenter.giveaway_winner(&name);
                    }
                    None => debug!("giveaway draw with no entries"),
                }
            }
            "entries" if args.first().is_some_and(|a| a.eq_ignore_ascii_case("clear")) => {
                self.giveaway.lock().await.clear();
            }
            "rebalance" => {
                if let Err(e) = self.goals.rebalance().await {
                    warn!("Goal rebalance failed: {e}");
                }
            }
            _ => return false,
        }
        true
    }

    /// `!command` from chat for alerts viewers may trigger.
    async fn viewer_command(&self, viewer: &str, command: &str) {
        let alert = self.catalog.lock().await.chat_alert(command).cloned();
        let Some(alert) = alert else {
            return;
        };

        let (user_window, feature_window) = {
            let settings = self.cooldown_settings.lock().await;
            (settings.user_window(), settings.feature_window(&alert.name, alert.cooldown_secs))
        };
        let now = Utc::now();
        let feature = feature_subject(&alert.name);

        let permitted = {
            let mut gate = self.cooldowns.lock().await;
            gate.remaining(&feature, feature_window, now).is_none()
                && gate.try_acquire(&user_subject(viewer), user_window, now)
                && gate.try_acquire(&feature, feature_window, now)
        };
        if !permitted {
            debug!(viewer, alert = %alert.name, "chat command on cooldown");
            return;
        }
        info!(viewer, alert = %alert.name, "chat command");
        self.scheduler.enqueue(alert.item);
    }

    async fn execute(&self, action: RouteAction) {
        match action {
            RouteAction::PlayAlert {
                name,
                item,
                cooldown_secs,
                bypass_cooldown,
            } => self.play_alert(&name, item, cooldown_secs, bypass_cooldown).await,
            RouteAction::PlaceSticker(item) => {
                if self.feature_ready("sticker", 0).await {
                    self.scheduler.enqueue(item);
                }
            }
            RouteAction::StartCountdown { label, seconds } => {
                if self.feature_ready("countdown", 0).await {
                    self.presenter.countdown(&label, seconds);
                }
            }
            RouteAction::HangBackdrop(payload) => {
                if self.feature_ready("backdrop", 0).await {
                    self.presenter.hang_backdrop(payload);
                }
            }
            RouteAction::EnterGiveaway(name) => {
                if !self.giveaway.lock().await.enter(&name) {
                    debug!(viewer = %name, "already entered giveaway");
                }
            }
        }
    }

    async fn play_alert(&self, name: &str, item: QueueItem, cooldown_secs: u64, bypass_cooldown: bool) {
        if !bypass_cooldown && !self.feature_ready(name, cooldown_secs).await {
            debug!(alert = name, "alert on cooldown");
            return;
        }
        debug!(alert = name, layer = %item.layer, "alert queued");
        self.scheduler.enqueue(item);
    }

    /// Acquire `feature`'s cooldown, using its override or `fallback_secs`.
    async fn feature_ready(&self, feature: &str, fallback_secs: u64) -> bool {
        let window = self.cooldown_settings.lock().await.feature_window(feature, fallback_secs);
        self.cooldowns
            .lock()
            .await
            .try_acquire(&feature_subject(feature), window, Utc::now())
    }
}

#[async_trait]
impl PollHandler<Donation> for Arc<AlertService> {
    async fn handle(&self, item: Donation) {
        self.on_donation(&item.id, item.amount, &item.name, &item.message, item.created_at)
            .await;
    }
}

#[async_trait]
impl PollHandler<Tip> for Arc<AlertService> {
    async fn handle(&self, item: Tip) {
        self.on_tip(&item.id, item.amount, &item.name, &item.message, item.created_at)
            .await;
    }
}
