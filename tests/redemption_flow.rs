//! End-to-end redemption handling through the alert service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use alertdeck::config::Config;
use alertdeck::goals::{GoalProgressionEngine, GoalSettings};
use alertdeck::presentation::{BroadcastPresenter, PresentationEvent, Presenter};
use alertdeck::redemptions::{AlertDefinition, RedemptionCatalog, TriggerGate};
use alertdeck::scheduler::PlaybackScheduler;
use alertdeck::services::{ingress, AlertService};
use alertdeck::shutdown::Shutdown;
use alertdeck::store::JsonStore;
use alertdeck::types::{EventId, Placement, QueueItem, RedemptionEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

struct Rig {
    service: Arc<AlertService>,
    events: broadcast::Receiver<PresentationEvent>,
    shutdown: Shutdown,
    _dir: tempfile::TempDir,
}

fn rig() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default().with_data_dir(dir.path());

    let mut catalog = RedemptionCatalog {
        alerts: vec![AlertDefinition {
            name: "Hype".to_string(),
            command: "hype".to_string(),
            cost: Some(500),
            bits: None,
            chat_enabled: false,
            cooldown_secs: 0,
            item: QueueItem::new("hype.webm", Placement::new(100, 100, 640, 360)),
        }],
        ..RedemptionCatalog::default()
    };
    catalog.countdown.gate = TriggerGate {
        enabled: true,
        min_cost: 100,
        command: "countdown".to_string(),
    };
    catalog.countdown.seconds = 30;
    JsonStore::new(config.redemptions_path()).save(&catalog).unwrap();

    let presenter = BroadcastPresenter::new(64);
    let events = presenter.subscribe();
    let presenter: Arc<dyn Presenter> = Arc::new(presenter);
    let (shutdown, listener) = Shutdown::new();
    let (scheduler, _handle) =
        PlaybackScheduler::spawn(Duration::from_secs(5), Arc::clone(&presenter), listener);
    let goals = Arc::new(GoalProgressionEngine::new(
        JsonStore::<GoalSettings>::new(config.goals_path()),
        Arc::clone(&presenter),
        scheduler.clone(),
    ));
    let service = AlertService::new(&config, scheduler, goals, presenter).with_rng(StdRng::seed_from_u64(1));

    Rig {
        service: Arc::new(service),
        events,
        shutdown,
        _dir: dir,
    }
}

async fn drain(rx: &mut broadcast::Receiver<PresentationEvent>) -> Vec<PresentationEvent> {
    let mut out = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await {
        out.push(event);
    }
    out
}

fn redemption(id: &str) -> RedemptionEvent {
    RedemptionEvent {
        id: EventId::new(id),
        display_name: "Mika".to_string(),
        reward_title: "Hype countdown".to_string(),
        cost: 500,
        message: String::new(),
    }
}

#[tokio::test]
async fn fans_out_once_and_ignores_retries() {
    let mut rig = rig();

    rig.service.on_reward_redeemed(redemption("r-1")).await;
    rig.service.on_reward_redeemed(redemption("r-1")).await;

    let events = drain(&mut rig.events).await;
    let shows = events
        .iter()
        .filter(|e| matches!(e, PresentationEvent::Show { visual, .. } if visual == "hype.webm"))
        .count();
    let countdowns = events
        .iter()
        .filter(|e| matches!(e, PresentationEvent::Countdown { seconds: 30, .. }))
        .count();
    assert_eq!(shows, 1);
    assert_eq!(countdowns, 1);
    assert_eq!(events.len(), 2);

    rig.shutdown.trigger();
}

#[tokio::test]
async fn distinct_redemptions_both_route() {
    let mut rig = rig();

    rig.service.on_reward_redeemed(redemption("r-1")).await;
    rig.service.on_reward_redeemed(redemption("r-2")).await;

    let countdowns = drain(&mut rig.events)
        .await
        .into_iter()
        .filter(|e| matches!(e, PresentationEvent::Countdown { .. }))
        .count();
    assert_eq!(countdowns, 2);
}

#[tokio::test]
async fn ingress_lines_reach_the_service() {
    let mut rig = rig();
    let input = concat!(
        r#"{"type":"reward_redeemed","id":"x1","display_name":"Jo","reward_title":"Hype","cost":500}"#,
        "\n",
        "garbage\n",
        "\n",
        r#"{"type":"chat_message","text":"!takedown","display_name":"streamer","is_broadcaster":true}"#,
        "\n",
    );

    let dispatched = ingress::pump(input.as_bytes(), &rig.service, rig.shutdown.listener()).await;
    assert_eq!(dispatched, 2);

    let events = drain(&mut rig.events).await;
    assert!(matches!(
        events.as_slice(),
        [PresentationEvent::Show { .. }, PresentationEvent::Hide { .. }]
    ));
}
