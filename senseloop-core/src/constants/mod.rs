//! Constants for the senseloop core
//!
//! Build-time defaults and hard limits live here so that the scheduler,
//! registry and arbiters never carry magic numbers. Anything a user may tune
//! at runtime has a matching settings key (see [`crate::settings::keys`]); the
//! values below are the fallbacks when that key is absent.
//!
//! ## Organization
//!
//! - **Scheduler**: read / report / init / save cadences and their bounds
//! - **Sensors**: per-type defaults for corrections and delta thresholds
//! - **Energy**: split-precision accumulator limits
//! - **Bus**: two-wire address space and recovery timings
//! - **Buffers**: compile-time capacities for fixed-size tables

/// Scheduler cadences and their bounds.
pub mod scheduler;

/// Per-magnitude-type defaults.
pub mod sensors;

/// Energy accumulator limits.
pub mod energy;

/// Two-wire bus address space and recovery timings.
pub mod bus;

/// Capacities of fixed-size tables.
pub mod buffers;

pub use scheduler::{
    READ_INTERVAL_MS, READ_MIN_INTERVAL_MS, READ_MAX_INTERVAL_MS,
    REPORT_EVERY, REPORT_MIN_EVERY, REPORT_MAX_EVERY,
    INIT_INTERVAL_MS, SAVE_EVERY,
};

pub use energy::{KWH_MULTIPLIER, KWH_LIMIT};

pub use buffers::{MAX_SOURCES, MAX_MAGNITUDES, MAX_OBSERVERS, MAX_FILTER_CAPACITY};
