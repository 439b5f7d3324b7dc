//! Goal list, milestones, and contribution weighting.
//!
//! All progression arithmetic lives here as plain methods on
//! [`GoalSettings`] so it can be exercised without a runtime; the engine
//! wraps it with locking, persistence and notifications.

use serde::{Deserialize, Serialize};

use crate::types::QueueItem;

/// Where a contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionSource {
    /// Bits cheered in chat.
    Cheer,
    /// Money from the tip or donation platforms.
    Tip,
    /// A paid subscription, weighted by tier.
    Subscription,
    /// Surplus carried over from a completed goal. Always weight 1.
    Rollover,
}

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTier {
    /// Tier 1 and Prime.
    #[default]
    Tier1,
    /// Tier 2.
    Tier2,
    /// Tier 3.
    Tier3,
}

impl SubTier {
    /// Parse the platform's plan codes (`1000`, `2000`, `3000`, `Prime`).
    pub fn from_plan(plan: &str) -> Self {
        match plan.trim() {
            "2000" | "2" | "tier2" => Self::Tier2,
            "3000" | "3" | "tier3" => Self::Tier3,
            _ => Self::Tier1,
        }
    }
}

/// Multiplier applied to raw amounts per source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Per bit.
    pub cheer: f64,
    /// Per currency unit, donations included.
    pub tip: f64,
    /// Per tier 1 subscription.
    pub tier1: f64,
    /// Per tier 2 subscription.
    pub tier2: f64,
    /// Per tier 3 subscription.
    pub tier3: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            cheer: 0.01,
            tip: 1.0,
            tier1: 5.0,
            tier2: 10.0,
            tier3: 25.0,
        }
    }
}

impl Weights {
    /// Weight for `source`; subscriptions without a tier count as tier 1.
    pub fn weight(&self, source: ContributionSource, tier: Option<SubTier>) -> f64 {
        match source {
            ContributionSource::Cheer => self.cheer,
            ContributionSource::Tip => self.tip,
            ContributionSource::Rollover => 1.0,
            ContributionSource::Subscription => match tier.unwrap_or_default() {
                SubTier::Tier1 => self.tier1,
                SubTier::Tier2 => self.tier2,
                SubTier::Tier3 => self.tier3,
            },
        }
    }
}

/// Which sources may move goals at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceToggles {
    /// Cheers count toward goals.
    pub cheers: bool,
    /// Tips and donations count toward goals.
    pub tips: bool,
    /// Subscriptions count toward goals.
    pub subscriptions: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            cheers: true,
            tips: true,
            subscriptions: true,
        }
    }
}

impl SourceToggles {
    /// Whether `source` is accepted.
    pub const fn allows(&self, source: ContributionSource) -> bool {
        match source {
            ContributionSource::Cheer => self.cheers,
            ContributionSource::Tip => self.tips,
            ContributionSource::Subscription => self.subscriptions,
            ContributionSource::Rollover => true,
        }
    }
}

/// A one-shot alert at a percentage of the goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Threshold, 0 to 100.
    pub percent: f64,
    /// Overlay played when the threshold is crossed.
    #[serde(default)]
    pub alert: Option<QueueItem>,
    /// Fired since the goal last reset.
    #[serde(default)]
    pub triggered: bool,
}

/// One entry in the ordered goal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Shown on the goal bar.
    pub title: String,
    /// Weighted amount that completes the goal. Zero or less means the goal is skipped.
    pub target: f64,
    /// Weighted progress so far.
    #[serde(default)]
    pub current: f64,
    /// Whether contributions currently land here. At most one goal is active.
    #[serde(default)]
    pub active: bool,
    /// Start over at zero instead of handing off to the next goal.
    #[serde(default)]
    pub reset_on_complete: bool,
    /// Percentage alerts, fired once per lap.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl Goal {
    /// New inactive goal with no progress.
    pub fn new(title: impl Into<String>, target: f64) -> Self {
        Self {
            title: title.into(),
            target,
            current: 0.0,
            active: false,
            reset_on_complete: false,
            milestones: Vec::new(),
        }
    }

    /// Progress as a percentage of target.
    pub fn percent(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        self.current / self.target * 100.0
    }

    fn clear_milestones(&mut self) {
        for milestone in &mut self.milestones {
            milestone.triggered = false;
        }
    }

    /// Mark and return every unfired milestone now at or below progress,
    /// lowest threshold first.
    fn fire_crossed(&mut self) -> Vec<FiredMilestone> {
        let percent = self.percent();
        let mut order: Vec<usize> = (0..self.milestones.len()).collect();
        order.sort_by(|&a, &b| self.milestones[a].percent.total_cmp(&self.milestones[b].percent));

        let mut fired = Vec::new();
        for idx in order {
            let milestone = &mut self.milestones[idx];
            if milestone.triggered || milestone.percent > percent {
                continue;
            }
            milestone.triggered = true;
            fired.push(FiredMilestone {
                goal: self.title.clone(),
                percent: milestone.percent,
                alert: milestone.alert.clone(),
            });
        }
        fired
    }
}

/// A milestone that crossed during an update.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredMilestone {
    /// Title of the goal it belongs to.
    pub goal: String,
    /// Threshold that was crossed.
    pub percent: f64,
    /// Overlay to enqueue, if any.
    pub alert: Option<QueueItem>,
}

/// Goal bar state after an update.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalView {
    /// Goal title.
    pub title: String,
    /// Progress.
    pub current: f64,
    /// Target.
    pub target: f64,
}

impl From<&Goal> for GoalView {
    fn from(goal: &Goal) -> Self {
        Self {
            title: goal.title.clone(),
            current: goal.current,
            target: goal.target,
        }
    }
}

/// What one accepted contribution did.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// Weighted amount added.
    pub applied: f64,
    /// Milestones fired, in firing order.
    pub fired: Vec<FiredMilestone>,
    /// Titles of goals completed, once per completion.
    pub completed: Vec<String>,
    /// Surplus left over after the last goal completed with no successor.
    pub unallocated: f64,
    /// Goal bar to display afterwards.
    pub view: Option<GoalView>,
}

/// Why a contribution was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The amount, or its weighted value, was not a positive number.
    NonPositive,
    /// Contributions from this source are switched off.
    SourceDisabled,
    /// Every goal is complete, or the list is empty.
    NoActiveGoal,
}

/// Persisted goal document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalSettings {
    /// Sources allowed to move goals.
    pub sources: SourceToggles,
    /// Per-source multipliers.
    pub weights: Weights,
    /// Ordered goal list; surplus rolls from one entry to the next.
    pub goals: Vec<Goal>,
}

impl GoalSettings {
    /// Index of the active goal.
    pub fn active_index(&self) -> Option<usize> {
        self.goals.iter().position(|g| g.active)
    }

    /// The active goal.
    pub fn active(&self) -> Option<&Goal> {
        self.active_index().map(|idx| &self.goals[idx])
    }

    /// Add a weighted contribution to the active goal, rolling surplus forward.
    ///
    /// Rollover is iterative over the goal list; a reset-on-complete goal
    /// absorbs whole laps of surplus at once and keeps the remainder.
    pub fn apply(
        &mut self,
        raw: f64,
        source: ContributionSource,
        tier: Option<SubTier>,
    ) -> Result<ApplyOutcome, Rejection> {
        if !raw.is_finite() || raw <= 0.0 {
            return Err(Rejection::NonPositive);
        }
        if !self.sources.allows(source) {
            return Err(Rejection::SourceDisabled);
        }
        let mut idx = self.active_index().ok_or(Rejection::NoActiveGoal)?;
        let applied = raw * self.weights.weight(source, tier);
        if applied <= 0.0 {
            return Err(Rejection::NonPositive);
        }

        let mut outcome = ApplyOutcome {
            applied,
            fired: Vec::new(),
            completed: Vec::new(),
            unallocated: 0.0,
            view: None,
        };
        let mut carry = applied;

        loop {
            let goal = &mut self.goals[idx];
            // Goals without a target take nothing and pass the carry on
            if goal.target > 0.0 {
                goal.current += carry;
                outcome.fired.extend(goal.fire_crossed());

                if goal.current < goal.target {
                    break;
                }
                carry = goal.current - goal.target;
                goal.current = goal.target;
                goal.clear_milestones();
                outcome.completed.push(goal.title.clone());

                if goal.reset_on_complete {
                    goal.current = 0.0;
                    let laps = (carry / goal.target).floor();
                    if laps >= 1.0 {
                        carry -= laps * goal.target;
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let lap_count = laps.min(f64::from(u16::MAX)) as u32;
                        for _ in 0..lap_count {
                            outcome.completed.push(goal.title.clone());
                        }
                    }
                    if carry <= 0.0 {
                        break;
                    }
                    continue;
                }
            }

            goal.active = false;
            let next = idx + 1;
            if next >= self.goals.len() {
                outcome.unallocated = carry;
                break;
            }
            self.goals[next].active = true;
            idx = next;
            if carry <= 0.0 && self.goals[idx].target > 0.0 {
                break;
            }
        }

        outcome.view = Some(GoalView::from(&self.goals[idx]));
        Ok(outcome)
    }

    /// Recompute active flags and carried surplus after goals were edited.
    ///
    /// Fires nothing: milestone flags are cleared, then the list is walked
    /// in order carrying surplus exactly like [`GoalSettings::apply`].
    pub fn rebalance(&mut self) {
        for goal in &mut self.goals {
            goal.active = false;
            goal.clear_milestones();
        }

        let mut carry = 0.0;
        for goal in &mut self.goals {
            if goal.target <= 0.0 {
                continue;
            }
            goal.current += carry;
            carry = 0.0;
            if goal.current < goal.target {
                goal.active = true;
                return;
            }
            carry = goal.current - goal.target;
            goal.current = goal.target;
            if goal.reset_on_complete {
                goal.current = carry % goal.target;
                goal.active = true;
                return;
            }
        }
    }
}
