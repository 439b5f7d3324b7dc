//! `AlertDeck` - stream alert service.
//!
//! Reads platform events as JSON lines on stdin, polls the donation and tip
//! platforms, and writes presentation events as JSON lines on stdout. Logs go
//! to stderr.

use alertdeck::config::Config;
use alertdeck::donations::DonationClient;
use alertdeck::goals::GoalProgressionEngine;
use alertdeck::poller::{BackgroundPoller, PollerOptions};
use alertdeck::presentation::{BroadcastPresenter, PresentationEvent, Presenter};
use alertdeck::scheduler::PlaybackScheduler;
use alertdeck::services::{ingress, AlertService};
use alertdeck::shutdown::{Shutdown, ShutdownListener};
use alertdeck::store::JsonStore;
use alertdeck::tips::TipClient;
use anyhow::Context;
use futures::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Buffered presentation events per output connection.
const PRESENTATION_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().context("Failed to load config")?;
    info!(
        "Starting {} {} (data: {})",
        config.app_name(),
        config.app_version(),
        config.data_dir().display()
    );

    let (shutdown, listener) = Shutdown::new();
    let presenter = BroadcastPresenter::new(PRESENTATION_BUFFER);
    let mut tasks: Vec<(&'static str, JoinHandle<()>)> = vec![(
        "output",
        tokio::spawn(print_events(presenter.subscribe(), listener.clone())),
    )];
    let presenter: Arc<dyn Presenter> = Arc::new(presenter);

    let (scheduler, scheduler_task) =
        PlaybackScheduler::spawn(config.min_hold(), Arc::clone(&presenter), listener.clone());
    tasks.push(("scheduler", scheduler_task));

    let goals = Arc::new(GoalProgressionEngine::new(
        JsonStore::new(config.goals_path()),
        Arc::clone(&presenter),
        scheduler.clone(),
    ));
    goals.refresh().await;
    let service = Arc::new(AlertService::new(&config, scheduler, goals, presenter));

    if config.has_donation_credentials() {
        let poller = BackgroundPoller::new(
            DonationClient::new(&config),
            Arc::clone(&service),
            poller_options(&config, config.donation_poll_secs),
        );
        tasks.push(("donations", poller.spawn(listener.clone())));
    } else {
        info!("Donation polling disabled; set DONATION_API_TOKEN to enable");
    }

    if config.has_tip_credentials() {
        let poller = BackgroundPoller::new(
            TipClient::new(&config),
            Arc::clone(&service),
            poller_options(&config, config.tip_poll_secs),
        );
        tasks.push(("tips", poller.spawn(listener.clone())));
    } else {
        info!("Tip polling disabled; set TIP_API_TOKEN and TIP_CHANNEL_ID to enable");
    }

    let ingress_service = Arc::clone(&service);
    let ingress_listener = listener.clone();
    let ingress = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        let dispatched = ingress::pump(stdin, &ingress_service, ingress_listener).await;
        info!(dispatched, "ingress finished");
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }
    shutdown.trigger();

    // Stdin reads block a runtime thread and cannot be interrupted
    ingress.abort();

    let (names, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
    for (name, result) in names.into_iter().zip(future::join_all(handles).await) {
        if let Err(e) = result {
            error!(task = name, "Task failed: {e}");
        }
    }
    info!("Stopped");
    std::process::exit(0);
}

fn poller_options(config: &Config, interval_secs: u64) -> PollerOptions {
    PollerOptions {
        interval: Duration::from_secs(interval_secs.max(1)),
        dedup_capacity: config.poll_dedup_capacity,
        prime_on_start: true,
    }
}

/// Write every presentation event to stdout as one JSON line.
async fn print_events(mut rx: broadcast::Receiver<PresentationEvent>, mut shutdown: ShutdownListener) {
    let mut stdout = tokio::io::stdout();
    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            () = shutdown.triggered() => break,
        };
        let event = match event {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Presentation output lagging; events dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let line = match serde_json::to_string(&event) {
            Ok(line) => line + "\n",
            Err(e) => {
                warn!("Failed to encode presentation event: {e}");
                continue;
            }
        };
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            warn!("Failed to write presentation event: {e}");
            break;
        }
        if let Err(e) = stdout.flush().await {
            warn!("Failed to flush presentation events: {e}");
            break;
        }
    }
}
