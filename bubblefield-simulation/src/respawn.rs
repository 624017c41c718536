use bubblefield_core::Millis;
use std::collections::VecDeque;

/// FIFO of timestamps at which a new bubble should appear, one per pop.
#[derive(Debug, Clone, Default)]
pub struct RespawnQueue {
    due: VecDeque<Millis>,
}

impl RespawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: Millis) {
        self.due.push_back(at);
    }

    /// Removes every timestamp that is due at `now` and returns how many there were
    pub fn take_due(&mut self, now: Millis) -> usize {
        let mut count = 0;
        while self.due.front().is_some_and(|&at| at <= now) {
            self.due.pop_front();
            count += 1;
        }
        count
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.due.front().copied()
    }

    pub fn len(&self) -> usize {
        self.due.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    pub fn clear(&mut self) {
        self.due.clear();
    }
}
