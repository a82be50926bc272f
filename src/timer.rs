//! Cancellable deadline queue
//!
//! Timers are plain data: a deadline and a payload. Owners poll the queue with
//! the current instant and act on whatever came due. Cancelling a timer removes
//! it outright, so a cancelled timer can never fire late.

use std::time::Instant;

/// Handle returned by [`TimerQueue::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    deadline: Instant,
    payload: T,
}

/// Pending timers ordered by deadline, then by scheduling order
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    next_id: u64,
    timers: Vec<Timer<T>>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            timers: Vec::new(),
        }
    }

    /// Schedule `payload` to come due at `deadline`
    pub fn schedule(&mut self, deadline: Instant, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        // Keep sorted; equal deadlines stay in scheduling order
        let pos = self
            .timers
            .iter()
            .position(|t| t.deadline > deadline)
            .unwrap_or(self.timers.len());
        self.timers.insert(
            pos,
            Timer {
                id,
                deadline,
                payload,
            },
        );
        id
    }

    /// Cancel a pending timer, returning its payload if it had not fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let idx = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(idx).payload)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.timers.iter().find(|t| t.id == id).map(|t| t.deadline)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.first().map(|t| t.deadline)
    }

    /// Remove and return every timer whose deadline is at or before `now`
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerId, T)> {
        let split = self
            .timers
            .iter()
            .position(|t| t.deadline > now)
            .unwrap_or(self.timers.len());
        self.timers
            .drain(..split)
            .map(|t| (t.id, t.payload))
            .collect()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
