//! Bounded record of recently seen external event ids.
//!
//! Eviction is FIFO by first arrival: re-recording an id that is already
//! present does not refresh its position.

use std::collections::{HashSet, VecDeque};

/// Insertion-ordered set holding at most `capacity` ids.
///
/// Not synchronized; owners wrap it in a lock when shared.
#[derive(Debug, Clone)]
pub struct DeduplicationTracker {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl DeduplicationTracker {
    /// Create a tracker remembering up to `capacity` ids. A zero capacity is
    /// raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Whether `id` is currently recorded.
    pub fn seen(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Record `id`, evicting the oldest entry when full.
    pub fn record(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.members.contains(&id) {
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.members.insert(id.clone());
        self.order.push_back(id);
    }

    /// Record `id` and report whether it was new.
    pub fn check_and_record(&mut self, id: &str) -> bool {
        if self.seen(id) {
            return false;
        }
        self.record(id);
        true
    }

    /// Number of ids currently held.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Configured capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
