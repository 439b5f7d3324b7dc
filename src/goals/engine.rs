//! Async owner of the goal document.
//!
//! Serializes every goal mutation, persists it, and then redraws the goal bar
//! and queues milestone alerts.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::goals::model::{ApplyOutcome, ContributionSource, GoalSettings, GoalView, SubTier};
use crate::presentation::Presenter;
use crate::scheduler::PlaybackScheduler;
use crate::store::JsonStore;

/// Owns the goal list; the only writer of goal progress.
///
/// Mutation and persistence happen under one lock acquisition, so readers
/// never observe progress that is not yet on disk.
pub struct GoalProgressionEngine {
    state: Mutex<GoalSettings>,
    store: JsonStore<GoalSettings>,
    presenter: Arc<dyn Presenter>,
    scheduler: PlaybackScheduler,
}

impl GoalProgressionEngine {
    /// Load the goal document and take ownership of it.
    pub fn new(
        store: JsonStore<GoalSettings>,
        presenter: Arc<dyn Presenter>,
        scheduler: PlaybackScheduler,
    ) -> Self {
        let settings = store.load();
        info!(goals = settings.goals.len(), "goal list loaded");
        Self {
            state: Mutex::new(settings),
            store,
            presenter,
            scheduler,
        }
    }

    /// Credit `subject`'s contribution to the active goal.
    ///
    /// Returns `None` when the contribution was ignored (non-positive amount,
    /// disabled source, or no active goal).
    pub async fn apply_value(
        &self,
        subject: &str,
        raw: f64,
        source: ContributionSource,
        tier: Option<SubTier>,
    ) -> Option<ApplyOutcome> {
        let mut state = self.state.lock().await;
        let outcome = match state.apply(raw, source, tier) {
            Ok(outcome) => outcome,
            Err(reason) => {
                debug!(subject, raw, ?source, ?reason, "contribution ignored");
                return None;
            }
        };
        self.persist(&state);
        drop(state);

        info!(
            subject,
            applied = outcome.applied,
            completed = outcome.completed.len(),
            "goal progressed"
        );
        if outcome.unallocated > 0.0 {
            debug!(unallocated = outcome.unallocated, "final goal complete; surplus dropped");
        }
        for milestone in &outcome.fired {
            info!(goal = %milestone.goal, percent = milestone.percent, "milestone reached");
            if let Some(alert) = &milestone.alert {
                self.scheduler.enqueue(alert.clone());
            }
        }
        if let Some(view) = &outcome.view {
            self.notify(view);
        }
        Some(outcome)
    }

    /// Recompute active flags and carried surplus, persist, and redraw.
    pub async fn rebalance(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.rebalance();
        self.store.save(&state)?;
        let view = state.active().map(GoalView::from);
        drop(state);

        if let Some(view) = view {
            self.notify(&view);
        }
        Ok(())
    }

    /// Replace the goal list with an edited one, rebalancing it first.
    pub async fn replace(&self, mut settings: GoalSettings) -> Result<()> {
        settings.rebalance();
        let mut state = self.state.lock().await;
        self.store.save(&settings)?;
        *state = settings;
        let view = state.active().map(GoalView::from);
        drop(state);

        if let Some(view) = view {
            self.notify(&view);
        }
        Ok(())
    }

    /// Copy of the current goal document.
    pub async fn snapshot(&self) -> GoalSettings {
        self.state.lock().await.clone()
    }

    /// Redraw the goal bar with the active goal.
    pub async fn refresh(&self) {
        let view = self.state.lock().await.active().map(GoalView::from);
        if let Some(view) = view {
            self.notify(&view);
        }
    }

    fn notify(&self, view: &GoalView) {
        self.presenter.update_goal(view.current, view.target, &view.title);
    }

    fn persist(&self, settings: &GoalSettings) {
        if let Err(e) = self.store.save(settings) {
            warn!("Failed to persist goals to {}: {e}", self.store.path().display());
        }
    }
}
