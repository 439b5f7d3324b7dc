//! Incremental goal progression.
//!
//! Weighted contributions fill an ordered list of goals. Completing a goal
//! either resets it or hands the surplus to the next one, and percentage
//! milestones queue their alerts as they are crossed.

/// Async owner of the goal document
pub mod engine;
/// Goal data and progression arithmetic
pub mod model;

pub use engine::GoalProgressionEngine;
pub use model::{
    ApplyOutcome, ContributionSource, Goal, GoalSettings, Milestone, SubTier, Weights,
};
