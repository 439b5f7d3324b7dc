//! Outbound presentation port.
//!
//! Everything the engine wants drawn leaves through a [`Presenter`]. Calls are
//! fire-and-forget: no acknowledgement is awaited, so a slow or absent
//! overlay client never stalls scheduling.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Layer, Placement, QueueItem};

/// Backdrop hung behind the scene by a redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackdropPayload {
    /// Visual reference of the backdrop.
    pub visual: String,
    /// Viewer who asked for it.
    pub requested_by: String,
}

/// One notification pushed to overlay clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresentationEvent {
    /// Draw an overlay.
    Show {
        /// Layer the overlay occupies.
        layer: Layer,
        /// Visual reference.
        visual: String,
        /// Where to draw it.
        placement: Placement,
        /// Flip horizontally.
        mirrored: bool,
    },
    /// Clear a layer.
    Hide {
        /// Layer to clear.
        layer: Layer,
    },
    /// Redraw the goal bar.
    UpdateGoal {
        /// Progress.
        current: f64,
        /// Target.
        target: f64,
        /// Goal title.
        title: String,
    },
    /// Hang a backdrop.
    HangBackdrop(BackdropPayload),
    /// Remove the backdrop.
    TakeDownBackdrop,
    /// Show a placement preview outside the queue.
    UpdateTestVisual(QueueItem),
    /// Remove the placement preview.
    StopTestVisual,
    /// Start a countdown.
    Countdown {
        /// Text shown beside the timer.
        label: String,
        /// Length in seconds.
        seconds: u32,
    },
    /// Announce a giveaway winner.
    GiveawayWinner {
        /// Winner's display name.
        name: String,
    },
}

/// Sink for presentation notifications.
///
/// Implementors only provide [`Presenter::notify`]; the named helpers mirror
/// the operations overlay clients understand.
pub trait Presenter: Send + Sync {
    /// Deliver one event, best effort.
    fn notify(&self, event: PresentationEvent);

    /// Display `visual` on `layer`.
    fn show(&self, layer: &Layer, visual: &str, placement: Placement, mirrored: bool) {
        self.notify(PresentationEvent::Show {
            layer: layer.clone(),
            visual: visual.to_string(),
            placement,
            mirrored,
        });
    }

    /// Remove whatever `layer` is showing.
    fn hide(&self, layer: &Layer) {
        self.notify(PresentationEvent::Hide { layer: layer.clone() });
    }

    /// Redraw the goal bar.
    fn update_goal(&self, current: f64, target: f64, title: &str) {
        self.notify(PresentationEvent::UpdateGoal {
            current,
            target,
            title: title.to_string(),
        });
    }

    /// Hang a backdrop.
    fn hang_backdrop(&self, payload: BackdropPayload) {
        self.notify(PresentationEvent::HangBackdrop(payload));
    }

    /// Remove the current backdrop.
    fn take_down_backdrop(&self) {
        self.notify(PresentationEvent::TakeDownBackdrop);
    }

    /// Show a placement preview outside the playback queue.
    fn update_test_visual(&self, item: &QueueItem) {
        self.notify(PresentationEvent::UpdateTestVisual(item.clone()));
    }

    /// Remove the placement preview.
    fn stop_test_visual(&self) {
        self.notify(PresentationEvent::StopTestVisual);
    }

    /// Start an on-screen countdown.
    fn countdown(&self, label: &str, seconds: u32) {
        self.notify(PresentationEvent::Countdown {
            label: label.to_string(),
            seconds,
        });
    }

    /// Announce a giveaway winner.
    fn giveaway_winner(&self, name: &str) {
        self.notify(PresentationEvent::GiveawayWinner { name: name.to_string() });
    }
}

/// Fans events out to every subscribed overlay connection.
///
/// Lagging subscribers lose the oldest events instead of applying backpressure.
#[derive(Debug, Clone)]
pub struct BroadcastPresenter {
    tx: broadcast::Sender<PresentationEvent>,
}

impl BroadcastPresenter {
    /// Create a presenter buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attach a new overlay connection.
    pub fn subscribe(&self) -> broadcast::Receiver<PresentationEvent> {
        self.tx.subscribe()
    }
}

impl Presenter for BroadcastPresenter {
    fn notify(&self, event: PresentationEvent) {
        // No subscribers is not an error; the overlay may simply be closed.
        if self.tx.send(event).is_err() {
            tracing::trace!("presentation event dropped: no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PresentationEvent::Hide { layer: Layer::new("main") };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "hide");
        assert_eq!(json["layer"], "main");
    }

    #[test]
    fn notify_without_subscribers_is_silent() {
        let presenter = BroadcastPresenter::new(4);
        presenter.take_down_backdrop();
    }

    #[tokio::test]
    async fn subscribers_receive_helpers_output() {
        let presenter = BroadcastPresenter::new(4);
        let mut rx = presenter.subscribe();

        presenter.show(&Layer::new("main"), "hype.gif", Placement::new(0, 0, 100, 100), true);
        presenter.update_goal(40.0, 100.0, "Sub goal");

        match rx.recv().await.unwrap() {
            PresentationEvent::Show { visual, mirrored, .. } => {
                assert_eq!(visual, "hype.gif");
                assert!(mirrored);
            }
            other => unreachable!("unexpected {other:?}"),
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            PresentationEvent::UpdateGoal {
                current: 40.0,
                target: 100.0,
                title: "Sub goal".to_string()
            }
        );
    }
}
