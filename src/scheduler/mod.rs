//! Single-flight overlay playback.
//!
//! Producers push requests into an unbounded channel and return immediately.
//! One consumer task owns every [`LayerQueue`], sleeps until the earliest
//! hold deadline or the next request, and is the only code that tells the
//! presentation port to show or hide queued overlays.

/// Per-layer state machine
pub mod layer;

pub use layer::{ActiveSlot, LayerQueue, Transition};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::presentation::Presenter;
use crate::shutdown::ShutdownListener;
use crate::types::{Layer, QueueItem};

#[derive(Debug)]
enum Command {
    Enqueue(QueueItem),
    ForceClear(Layer),
}

/// Producer handle to the playback consumer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    tx: mpsc::UnboundedSender<Command>,
}

impl PlaybackScheduler {
    /// Start the consumer task.
    pub fn spawn(
        min_hold: Duration,
        presenter: Arc<dyn Presenter>,
        shutdown: ShutdownListener,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = Consumer {
            min_hold,
            presenter,
            layers: HashMap::new(),
        };
        let handle = tokio::spawn(consumer.run(rx, shutdown));
        (Self { tx }, handle)
    }

    /// Queue an overlay. Never blocks; dropped only if the consumer has stopped.
    pub fn enqueue(&self, item: QueueItem) {
        if self.tx.send(Command::Enqueue(item)).is_err() {
            debug!("playback consumer stopped; overlay dropped");
        }
    }

    /// Take `layer` down now, keeping anything queued behind it.
    pub fn force_clear(&self, layer: Layer) {
        if self.tx.send(Command::ForceClear(layer)).is_err() {
            debug!("playback consumer stopped; clear dropped");
        }
    }
}

struct Consumer {
    min_hold: Duration,
    presenter: Arc<dyn Presenter>,
    layers: HashMap<Layer, LayerQueue>,
}

impl Consumer {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>, mut shutdown: ShutdownListener) {
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                () = sleep_until(deadline) => {}
                () = shutdown.triggered() => {
                    info!("playback scheduler stopping");
                    break;
                }
            }
            self.advance(Instant::now());
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Enqueue(item) => {
                let min_hold = self.min_hold;
                self.layers
                    .entry(item.layer.clone())
                    .or_insert_with_key(|layer| LayerQueue::new(layer.clone(), min_hold))
                    .enqueue(item);
            }
            Command::ForceClear(layer) => {
                let cleared = self.layers.get_mut(&layer).and_then(LayerQueue::force_clear);
                match cleared {
                    Some(transition) => self.emit(transition),
                    None => debug!(layer = %layer, "nothing to clear"),
                }
            }
        }
    }

    fn advance(&mut self, now: Instant) {
        let transitions: Vec<Transition> = self
            .layers
            .values_mut()
            .flat_map(|queue| queue.advance(now))
            .collect();
        for transition in transitions {
            self.emit(transition);
        }
    }

    fn emit(&self, transition: Transition) {
        match transition {
            Transition::Show(item) => {
                debug!(layer = %item.layer, visual = %item.visual, "show");
                self.presenter
                    .show(&item.layer, &item.visual, item.placement, item.mirrored);
            }
            Transition::Hide(layer) => {
                debug!(layer = %layer, "hide");
                self.presenter.hide(&layer);
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.layers.values().filter_map(LayerQueue::next_deadline).min()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
