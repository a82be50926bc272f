//! Injectable time source
//!
//! Every timer in the crate (quick-switch hold delay, undo expiry, toast
//! lifetime) reads time through [`Clock`], so tests can simulate "held for
//! 20ms" by advancing a [`ManualClock`] instead of sleeping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A monotonic time source plus a wall clock for record timestamps
pub trait Clock: Send + Sync {
    /// Monotonic instant used for deadlines
    fn now(&self) -> Instant;

    /// Wall-clock time used for `updated_at` style timestamps
    fn wall(&self) -> DateTime<Utc>;
}

/// Real time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same underlying offset.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new(wall_origin: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        *offset += by;
    }

    /// Jump to an absolute offset from the origin. Never moves backwards.
    pub fn set_elapsed(&self, elapsed: Duration) {
        let mut offset = self.offset.lock();
        if elapsed > *offset {
            *offset = elapsed;
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }

    /// The instant corresponding to the clock's origin
    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn wall(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.elapsed()).unwrap_or(chrono::Duration::zero());
        self.wall_origin + elapsed
    }
}
