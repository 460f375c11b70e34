//! Scheduler drivers
//!
//! Integration tests move time by hand. [`Driver`] keeps the clock and
//! knows how far to advance it for the next discovery attempt or read pass.

use senseloop_core::time::{FixedTime, Interval, TimeSource};
use senseloop_core::{Scheduler, SchedulerState, SensorConfig, Services, Timestamp};

/// Fastest read interval the configuration accepts
pub const READ_MS: u64 = 1_000;

/// Configuration with short intervals and one read per report
pub fn fast_config() -> SensorConfig {
    SensorConfig::default()
        .with_read_interval(Interval::millis(READ_MS))
        .with_init_interval(Interval::millis(READ_MS))
        .with_report_every(1)
}

/// Manual clock for a scheduler
#[derive(Debug, Default)]
pub struct Driver {
    clock: FixedTime,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Ticks without moving time until the scheduler is reading, or gives
    /// up after a few ticks. Returns whether it got there.
    pub fn start(&mut self, scheduler: &mut Scheduler, services: &mut Services<'_>) -> bool {
        for _ in 0..4 {
            if scheduler.state() == SchedulerState::Reading {
                return true;
            }
            scheduler.run(&self.clock, services);
        }
        scheduler.state() == SchedulerState::Reading
    }

    /// Advances by `ms` and ticks once
    pub fn advance(&mut self, scheduler: &mut Scheduler, services: &mut Services<'_>, ms: u64) {
        self.clock.advance(ms);
        scheduler.run(&self.clock, services);
    }

    /// Runs exactly one read pass
    pub fn read(&mut self, scheduler: &mut Scheduler, services: &mut Services<'_>) {
        let step = scheduler.config().read_interval.to_millis();
        self.advance(scheduler, services, step);
    }

    /// Runs `passes` read passes
    pub fn read_n(&mut self, scheduler: &mut Scheduler, services: &mut Services<'_>, passes: usize) {
        for _ in 0..passes {
            self.read(scheduler, services);
        }
    }
}
