//! Time management for the scheduler
//!
//! The core never reads a clock on its own. The scheduler is handed a
//! timestamp on every tick, which keeps it testable and lets boards plug in
//! whatever monotonic counter they have:
//! - Hardware timer / `millis()` equivalent
//! - RTOS tick counter
//! - [`FixedTime`] in tests and simulations

use fugit::MillisDurationU64;

/// Timestamp in milliseconds since device boot
pub type Timestamp = u64;

/// Interval type used for every scheduler cadence
pub type Interval = MillisDurationU64;

/// Source of monotonic time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Milliseconds elapsed from `since` to `now`, zero if the clock went backwards
pub fn elapsed(now: Timestamp, since: Timestamp) -> Interval {
    Interval::millis(now.saturating_sub(since))
}

/// Checks whether `interval` has passed since `last`; `None` means "never ran"
pub fn due(now: Timestamp, last: Option<Timestamp>, interval: Interval) -> bool {
    match last {
        None => true,
        Some(last) => elapsed(now, last) >= interval,
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug, Clone, Default)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Clock stopped at `timestamp`
    pub const fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Jumps to `timestamp`
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Moves forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.timestamp = self.timestamp.saturating_add(ms);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}
