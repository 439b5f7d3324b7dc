//! Goal progression across completion, rollover and rebalancing.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use alertdeck::goals::{ContributionSource, Goal, GoalProgressionEngine, GoalSettings, Milestone, Weights};
use alertdeck::presentation::{BroadcastPresenter, PresentationEvent, Presenter};
use alertdeck::scheduler::PlaybackScheduler;
use alertdeck::shutdown::Shutdown;
use alertdeck::store::JsonStore;
use alertdeck::types::{Placement, QueueItem};
use std::sync::Arc;
use std::time::Duration;

fn milestone(percent: f64) -> Milestone {
    Milestone {
        percent,
        alert: Some(QueueItem::new(format!("milestone-{percent}.webm"), Placement::default())),
        triggered: false,
    }
}

fn settings(reset_on_complete: bool) -> GoalSettings {
    let mut first = Goal::new("Emotes", 100.0);
    first.active = true;
    first.reset_on_complete = reset_on_complete;
    first.milestones = vec![milestone(50.0), milestone(90.0)];
    GoalSettings {
        weights: Weights {
            tip: 1.0,
            ..Weights::default()
        },
        goals: vec![first, Goal::new("Camera", 100.0)],
        ..GoalSettings::default()
    }
}

#[test]
fn completion_hands_surplus_to_next_goal() {
    let mut goals = settings(false);
    let first = goals.apply(90.0, ContributionSource::Tip, None).unwrap();
    let second = goals.apply(15.0, ContributionSource::Tip, None).unwrap();

    assert_eq!(goals.goals[0].current, 100.0);
    assert!(!goals.goals[0].active);
    assert_eq!(goals.goals[1].current, 5.0);
    assert!(goals.goals[1].active);

    let fired: Vec<f64> = first.fired.iter().chain(&second.fired).map(|m| m.percent).collect();
    assert_eq!(fired, vec![50.0, 90.0]);
}

#[test]
fn reset_goal_tops_itself_up() {
    let mut goals = settings(true);
    let first = goals.apply(90.0, ContributionSource::Tip, None).unwrap();
    let second = goals.apply(15.0, ContributionSource::Tip, None).unwrap();

    assert_eq!(goals.goals[0].current, 5.0);
    assert!(goals.goals[0].active);
    assert!(!goals.goals[1].active);
    assert_eq!(second.completed, vec!["Emotes".to_string()]);

    let fired: Vec<f64> = first.fired.iter().chain(&second.fired).map(|m| m.percent).collect();
    assert_eq!(fired, vec![50.0, 90.0]);
    assert!(goals.goals[0].milestones.iter().all(|m| !m.triggered));
}

#[test]
fn rebalance_after_manual_edit() {
    let mut goals = GoalSettings {
        goals: vec![
            Goal {
                current: 120.0,
                ..Goal::new("Emotes", 100.0)
            },
            Goal::new("Camera", 50.0),
        ],
        ..GoalSettings::default()
    };
    goals.goals[0].milestones = vec![Milestone {
        triggered: true,
        ..milestone(50.0)
    }];

    goals.rebalance();

    assert_eq!(goals.goals[0].current, 100.0);
    assert!(!goals.goals[0].active);
    assert_eq!(goals.goals[1].current, 20.0);
    assert!(goals.goals[1].active);
    assert!(!goals.goals[0].milestones[0].triggered);
}

#[test]
fn disabled_source_is_a_no_op() {
    let mut goals = settings(false);
    goals.sources.cheers = false;
    assert!(goals.apply(500.0, ContributionSource::Cheer, None).is_err());
    assert_eq!(goals.goals[0].current, 0.0);
}

#[tokio::test]
async fn engine_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store: JsonStore<GoalSettings> = JsonStore::new(dir.path().join("goals.json"));
    store.save(&settings(false)).unwrap();

    let presenter = BroadcastPresenter::new(32);
    let mut events = presenter.subscribe();
    let presenter: Arc<dyn Presenter> = Arc::new(presenter);
    let (shutdown, listener) = Shutdown::new();
    let (scheduler, handle) =
        PlaybackScheduler::spawn(Duration::from_secs(5), Arc::clone(&presenter), listener);

    let engine = GoalProgressionEngine::new(store.clone(), Arc::clone(&presenter), scheduler.clone());
    engine.apply_value("kim", 105.0, ContributionSource::Tip, None).await.unwrap();
    drop(engine);

    let reloaded = GoalProgressionEngine::new(store, presenter, scheduler);
    let snapshot = reloaded.snapshot().await;
    assert_eq!(snapshot.goals[1].current, 5.0);
    assert!(snapshot.goals[1].active);

    let mut goal_updates = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(100), events.recv()).await {
        if let PresentationEvent::UpdateGoal { title, current, .. } = event {
            goal_updates.push((title, current));
        }
    }
    assert_eq!(goal_updates, vec![("Camera".to_string(), 5.0)]);

    shutdown.trigger();
    handle.await.unwrap();
}
