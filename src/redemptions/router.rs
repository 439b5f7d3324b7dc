//! Fan-out routing of channel-point redemptions.
//!
//! Categories are evaluated in a fixed order and every category that matches
//! contributes an action; within a category the first match wins. Routing is
//! pure: it decides, the alert service executes.

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

use crate::constants::canvas;
use crate::presentation::BackdropPayload;
use crate::redemptions::catalog::{AlertDefinition, NamedBackdrop, RedemptionCatalog};
use crate::types::{Placement, QueueItem, RedemptionEvent};

/// `x,y` or `x y` pixel coordinates in a sticker message.
#[allow(clippy::expect_used)]
static RE_COORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d{1,5})\s*[,x ]\s*(-?\d{1,5})").expect("valid regex: RE_COORDS")
});

/// One thing a redemption asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Queue a catalog alert.
    PlayAlert {
        /// Catalog name, the cooldown key.
        name: String,
        /// Overlay to queue.
        item: QueueItem,
        /// The alert's own cooldown.
        cooldown_secs: u64,
        /// Random picks skip the alert's own cooldown.
        bypass_cooldown: bool,
    },
    /// Queue a sticker at the viewer's coordinates.
    PlaceSticker(QueueItem),
    /// Show a countdown.
    StartCountdown {
        /// Text shown beside the timer.
        label: String,
        /// Length of the countdown.
        seconds: u32,
    },
    /// Hang a backdrop.
    HangBackdrop(BackdropPayload),
    /// Add the named viewer to the giveaway.
    EnterGiveaway(String),
}

/// Decide every action `event` triggers under `catalog`.
pub fn route<R: Rng + ?Sized>(
    catalog: &RedemptionCatalog,
    event: &RedemptionEvent,
    rng: &mut R,
) -> Vec<RouteAction> {
    let mut actions = Vec::new();
    let title = event.reward_title.to_lowercase();

    // 1. Feature keyword in the title
    let keyword = catalog.random_keyword.trim().to_lowercase();
    if !keyword.is_empty() && title.contains(&keyword) {
        if let Some(alert) = catalog.alerts.choose(rng) {
            push_alert(&mut actions, alert, true);
        }
    }

    // 2. Command typed into the message
    if let Some(word) = event.message.split_whitespace().next() {
        if let Some(alert) = catalog
            .by_command(word)
            .filter(|a| a.cost.map_or(true, |cost| event.cost >= cost))
        {
            push_alert(&mut actions, alert, false);
        }
    }

    // 3. Custom triggers, each gated independently
    if catalog.sticker.gate.admits(event) {
        if let Some(item) = &catalog.sticker.item {
            let placement = sticker_placement(&event.message, item.placement, rng);
            actions.push(RouteAction::PlaceSticker(item.clone().at(placement)));
        }
    }
    if catalog.countdown.gate.admits(event) {
        actions.push(RouteAction::StartCountdown {
            label: event.display_name.clone(),
            seconds: catalog.countdown.seconds,
        });
    }
    if catalog.backdrop.gate.admits(event) {
        if let Some(backdrop) = pick_backdrop(&catalog.backdrop.backdrops, &event.message, rng) {
            actions.push(RouteAction::HangBackdrop(BackdropPayload {
                visual: backdrop.visual.clone(),
                requested_by: event.display_name.clone(),
            }));
        }
    }
    if catalog.giveaway.gate.admits(event) {
        actions.push(RouteAction::EnterGiveaway(event.display_name.clone()));
    }

    // 4. Title keyword plus exact cost, else 5. cost alone
    let titled = catalog.alerts.iter().find(|a| {
        let command = a.command.trim().trim_start_matches('!').to_lowercase();
        !command.is_empty() && title.contains(&command) && a.cost == Some(event.cost)
    });
    let catalog_match = titled.or_else(|| catalog.alerts.iter().find(|a| a.cost == Some(event.cost)));
    if let Some(alert) = catalog_match {
        push_alert(&mut actions, alert, false);
    }

    actions
}

/// Add a catalog alert unless this redemption already queued it.
fn push_alert(actions: &mut Vec<RouteAction>, alert: &AlertDefinition, bypass_cooldown: bool) {
    let duplicate = actions
        .iter()
        .any(|a| matches!(a, RouteAction::PlayAlert { name, .. } if *name == alert.name));
    if duplicate {
        return;
    }
    actions.push(RouteAction::PlayAlert {
        name: alert.name.clone(),
        item: alert.item.clone(),
        cooldown_secs: alert.cooldown_secs,
        bypass_cooldown,
    });
}

/// Viewer coordinates if given, otherwise a random spot fully on canvas.
fn sticker_placement<R: Rng + ?Sized>(message: &str, base: Placement, rng: &mut R) -> Placement {
    let max_left = i32::try_from(canvas::WIDTH.saturating_sub(base.width)).unwrap_or(0);
    let max_top = i32::try_from(canvas::HEIGHT.saturating_sub(base.height)).unwrap_or(0);

    let (left, top) = RE_COORDS
        .captures(message)
        .and_then(|caps| Some((caps[1].parse::<i32>().ok()?, caps[2].parse::<i32>().ok()?)))
        .unwrap_or_else(|| (rng.gen_range(0..=max_left), rng.gen_range(0..=max_top)));

    Placement {
        top: top.clamp(0, max_top),
        left: left.clamp(0, max_left),
        ..base
    }
}

/// Backdrop named in the message, otherwise a random one.
fn pick_backdrop<'a, R: Rng + ?Sized>(
    backdrops: &'a [NamedBackdrop],
    message: &str,
    rng: &mut R,
) -> Option<&'a NamedBackdrop> {
    let message = message.to_lowercase();
    backdrops
        .iter()
        .find(|b| !b.name.is_empty() && message.contains(&b.name.to_lowercase()))
        .or_else(|| backdrops.choose(rng))
}
