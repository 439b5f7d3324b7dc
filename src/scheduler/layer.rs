//! Per-layer playback state machine.
//!
//! Pure and clock-agnostic: callers pass `now`, which keeps the hold rules
//! testable without a runtime.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use crate::types::{Layer, QueueItem};

/// The item currently on screen and when it went up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSlot {
    /// What is showing.
    pub item: QueueItem,
    /// When the show was issued.
    pub since: Instant,
}

/// A command the scheduler must forward to the presentation port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Put this item on screen.
    Show(QueueItem),
    /// Take the layer's current item down.
    Hide(Layer),
}

/// FIFO queue plus single active slot for one layer.
///
/// Idle + waiting item: the head is shown at once. Active + waiting item: the
/// active one is hidden once it has been up for `min_hold`. Active with
/// nothing waiting: stays up indefinitely.
#[derive(Debug)]
pub struct LayerQueue {
    layer: Layer,
    min_hold: Duration,
    queue: VecDeque<QueueItem>,
    active: Option<ActiveSlot>,
}

impl LayerQueue {
    /// Empty, idle queue for `layer`.
    pub fn new(layer: Layer, min_hold: Duration) -> Self {
        Self {
            layer,
            min_hold,
            queue: VecDeque::new(),
            active: None,
        }
    }

    /// Layer this queue drives.
    pub const fn layer(&self) -> &Layer {
        &self.layer
    }

    /// Append an item. Never reorders.
    pub fn enqueue(&mut self, item: QueueItem) {
        self.queue.push_back(item);
    }

    /// Item on screen, if any.
    pub const fn active(&self) -> Option<&ActiveSlot> {
        self.active.as_ref()
    }

    /// Items waiting behind the active one.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply every transition that is due at `now`.
    pub fn advance(&mut self, now: Instant) -> Vec<Transition> {
        let mut transitions = Vec::new();
        loop {
            match &self.active {
                None => {
                    let Some(item) = self.queue.pop_front() else { break };
                    transitions.push(Transition::Show(item.clone()));
                    self.active = Some(ActiveSlot { item, since: now });
                }
                Some(slot) => {
                    let held = now.saturating_duration_since(slot.since);
                    if self.queue.is_empty() || held < self.min_hold {
                        break;
                    }
                    transitions.push(Transition::Hide(self.layer.clone()));
                    self.active = None;
                }
            }
        }
        transitions
    }

    /// When the next transition becomes due, if one is pending at all.
    ///
    /// A hold too long to represent as an instant never comes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.active {
            Some(slot) if !self.queue.is_empty() => slot.since.checked_add(self.min_hold),
            None if !self.queue.is_empty() => Some(Instant::now()),
            _ => None,
        }
    }

    /// Take the active item down regardless of hold time. Queued items stay.
    pub fn force_clear(&mut self) -> Option<Transition> {
        self.active.take().map(|_| Transition::Hide(self.layer.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Placement;

    fn item(name: &str) -> QueueItem {
        QueueItem::new(name, Placement::new(0, 0, 320, 240))
    }

    fn hold() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn idle_layer_shows_head_immediately() {
        let t0 = Instant::now();
        let mut layer = LayerQueue::new(Layer::default(), hold());
        layer.enqueue(item("a"));

        assert_eq!(layer.advance(t0), vec![Transition::Show(item("a"))]);
        assert_eq!(layer.active().map(|s| s.since), Some(t0));
    }

    #[test]
    fn second_item_waits_for_min_hold() {
        let t0 = Instant::now();
        let mut layer = LayerQueue::new(Layer::default(), hold());
        for name in ["a", "b", "c"] {
            layer.enqueue(item(name));
        }

        assert_eq!(layer.advance(t0).len(), 1);
        assert!(layer.advance(t0 + Duration::from_millis(4_999)).is_empty());
        assert_eq!(layer.next_deadline(), Some(t0 + hold()));

        let at_hold = layer.advance(t0 + hold());
        assert_eq!(
            at_hold,
            vec![Transition::Hide(Layer::default()), Transition::Show(item("b"))]
        );
        assert_eq!(layer.pending(), 1);

        // The hold restarts for "b"
        assert!(layer.advance(t0 + Duration::from_secs(9)).is_empty());
        assert_eq!(layer.advance(t0 + Duration::from_secs(10)).len(), 2);
    }

    #[test]
    fn lone_active_item_is_never_auto_hidden() {
        let t0 = Instant::now();
        let mut layer = LayerQueue::new(Layer::default(), hold());
        layer.enqueue(item("a"));
        layer.advance(t0);

        assert!(layer.advance(t0 + Duration::from_secs(3_600)).is_empty());
        assert!(layer.active().is_some());
        assert_eq!(layer.next_deadline(), None);
    }

    #[test]
    fn late_arrival_replaces_long_held_item_at_once() {
        let t0 = Instant::now();
        let mut layer = LayerQueue::new(Layer::default(), hold());
        layer.enqueue(item("a"));
        layer.advance(t0);

        layer.enqueue(item("b"));
        let later = t0 + Duration::from_secs(60);
        assert_eq!(
            layer.advance(later),
            vec![Transition::Hide(Layer::default()), Transition::Show(item("b"))]
        );
    }

    #[test]
    fn force_clear_keeps_queue() {
        let t0 = Instant::now();
        let mut layer = LayerQueue::new(Layer::default(), hold());
        layer.enqueue(item("a"));
        layer.enqueue(item("b"));
        layer.advance(t0);

        assert_eq!(layer.force_clear(), Some(Transition::Hide(Layer::default())));
        assert_eq!(layer.force_clear(), None);
        assert_eq!(layer.pending(), 1);

        // Idle again, so "b" goes up without waiting out the hold
        assert_eq!(
            layer.advance(t0 + Duration::from_secs(1)),
            vec![Transition::Show(item("b"))]
        );
    }

    #[test]
    fn unrepresentable_hold_has_no_deadline() {
        let t0 = Instant::now();
        let mut layer = LayerQueue::new(Layer::default(), Duration::from_secs(u64::MAX));
        layer.enqueue(item("a"));
        layer.enqueue(item("b"));

        assert_eq!(layer.advance(t0).len(), 1);
        assert_eq!(layer.next_deadline(), None);
        assert!(layer.advance(t0 + Duration::from_secs(86_400)).is_empty());
        assert_eq!(layer.pending(), 1);
    }

    #[test]
    fn zero_hold_drains_to_last_item() {
        let t0 = Instant::now();
        let mut layer = LayerQueue::new(Layer::default(), Duration::ZERO);
        for name in ["a", "b", "c"] {
            layer.enqueue(item(name));
        }

        let transitions = layer.advance(t0);
        assert_eq!(transitions.len(), 5);
        assert_eq!(layer.active().map(|s| s.item.visual.as_str()), Some("c"));
    }
}
