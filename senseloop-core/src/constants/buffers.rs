//! Fixed Table Capacities
//!
//! Every table in the core is a `heapless` collection; these are their
//! compile-time sizes. Raise them for boards with more sensors attached.

use super::scheduler::REPORT_MAX_EVERY;

/// Maximum number of measurement sources owned by a registry.
pub const MAX_SOURCES: usize = 16;

/// Maximum number of magnitudes across all sources.
pub const MAX_MAGNITUDES: usize = 32;

/// Maximum number of read/report observers attached to a scheduler.
pub const MAX_OBSERVERS: usize = 8;

/// Capacity of a windowed filter (median, moving average).
pub const MAX_FILTER_CAPACITY: usize = REPORT_MAX_EVERY as usize;

/// Number of energy slots in the retained memory block.
pub const RETAINED_ENERGY_SLOTS: usize = 4;

/// Capacity of a settings key, e.g. `pwrModSZeroThreshold12`.
pub const SETTINGS_KEY_LEN: usize = 32;

/// Capacity of a settings value.
pub const SETTINGS_VALUE_LEN: usize = 48;

/// Capacity of a produced topic, e.g. `energy_delta/3`.
pub const TOPIC_LEN: usize = 32;

/// Capacity of a formatted value.
pub const FORMATTED_LEN: usize = 32;
