//! Measurement orchestration core for senseloop
//!
//! Discovers sensor sources, turns their channels into typed magnitudes,
//! filters and calibrates raw readings, and hands processed values to
//! consumers on a fixed read / report cadence. Also arbitrates the shared
//! two-wire bus and GPIO pins between sources and keeps energy totals
//! across reboots.
//!
//! Key constraints:
//! - Single cooperative loop, no threads
//! - Fixed-size tables, no allocation in the read path
//! - Runs on ESP8266 class devices (~40KB free RAM)
//!
//! ```no_run
//! use senseloop_core::{MemorySettings, Scheduler, SensorConfig, Services};
//!
//! let mut settings = MemorySettings::new();
//! let mut scheduler = Scheduler::new(SensorConfig::default());
//! // scheduler.add_source(Box::new(MySensor::new()))?;
//!
//! let mut services = Services::new(&mut settings);
//! loop {
//!     # let now = 0;
//!     scheduler.tick(now, &mut services);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! sns_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! sns_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! sns_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! sns_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! sns_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! sns_warn {
    ($($arg:tt)*) => {};
}

pub mod bus;
pub mod config;
pub mod constants;
pub mod energy;
pub mod errors;
pub mod filters;
pub mod gpio;
pub mod magnitude;
pub mod report;
pub mod retained;
pub mod scheduler;
pub mod settings;
pub mod source;
pub mod time;
pub mod units;

// Public API
pub use bus::{clear_bus, BusArbiter, RecoveryError};
pub use config::{DiscoveryPolicy, SensorConfig};
pub use energy::Energy;
pub use errors::{SensorError, SensorResult};
pub use filters::{Filter, FilterType, MagnitudeFilter};
pub use gpio::{GpioLocks, InterruptRouter};
pub use magnitude::{Magnitude, MagnitudeKind, Registry};
pub use report::{MagnitudeObserver, ProducedValue};
pub use retained::{RetainedBlock, RetainedEnergy};
pub use scheduler::{RelayStatus, Scheduler, SchedulerState, Services};
pub use settings::{MemorySettings, SettingsStore};
pub use source::{EnergyMeter, MeasurementSource, RatioKind, Resources};
pub use time::{FixedTime, Interval, TimeSource, Timestamp};
pub use units::Unit;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
