//! Transient notifications

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::timer::{TimerId, TimerQueue};

const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    #[serde(skip)]
    timer: TimerId,
}

/// Newest-last queue of notifications, each with its own expiry timer
#[derive(Debug)]
pub struct ToastQueue {
    duration: Duration,
    toasts: Vec<Toast>,
    timers: TimerQueue<()>,
}

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            toasts: Vec::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Info, message.into(), now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Error, message.into(), now);
    }

    fn push(&mut self, kind: ToastKind, message: String, now: Instant) {
        let timer = self.timers.schedule(now + self.duration, ());
        self.toasts.push(Toast {
            kind,
            message,
            timer,
        });
        while self.toasts.len() > MAX_VISIBLE {
            let dropped = self.toasts.remove(0);
            self.timers.cancel(dropped.timer);
        }
    }

    /// Drop expired toasts. Returns how many were removed.
    pub fn poll(&mut self, now: Instant) -> usize {
        let fired = self.timers.take_due(now);
        let before = self.toasts.len();
        self.toasts
            .retain(|t| !fired.iter().any(|(id, _)| *id == t.timer));
        before - self.toasts.len()
    }

    /// Dismiss everything
    pub fn clear(&mut self) {
        self.toasts.clear();
        self.timers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
