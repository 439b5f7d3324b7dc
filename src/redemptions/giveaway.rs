//! In-memory giveaway entry pool.

use rand::Rng;

/// Unique giveaway entrants, in entry order.
#[derive(Debug, Default, Clone)]
pub struct Giveaway {
    entries: Vec<String>,
}

impl Giveaway {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name`; returns false if they already entered (case-insensitive).
    pub fn enter(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.entries.iter().any(|e| e.eq_ignore_ascii_case(name)) {
            return false;
        }
        self.entries.push(name.to_string());
        true
    }

    /// Pick and remove a winner.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.entries.len());
        Some(self.entries.swap_remove(index))
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entrants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No one has entered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
