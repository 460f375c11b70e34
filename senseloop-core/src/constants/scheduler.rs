//! Scheduler Cadences
//!
//! All intervals are in milliseconds, cadences are counted in read cycles.

// ===== READ INTERVAL =====

/// Default interval between two read passes (milliseconds).
///
/// Six seconds keeps slow sensors (DHT, serial particle meters) happy while
/// still giving a report every minute with the default cadence.
pub const READ_INTERVAL_MS: u64 = 6_000;

/// Lower bound for a configured read interval (milliseconds).
pub const READ_MIN_INTERVAL_MS: u64 = 1_000;

/// Upper bound for a configured read interval (milliseconds).
pub const READ_MAX_INTERVAL_MS: u64 = 3_600_000;

// ===== REPORT CADENCE =====

/// Default number of reads between two reports.
pub const REPORT_EVERY: u8 = 10;

/// Lower bound for the report cadence.
pub const REPORT_MIN_EVERY: u8 = 1;

/// Upper bound for the report cadence.
///
/// Also the capacity of every windowed filter.
pub const REPORT_MAX_EVERY: u8 = 60;

// ===== DISCOVERY =====

/// Interval between two discovery attempts while sources are not ready
/// (milliseconds).
pub const INIT_INTERVAL_MS: u64 = 10_000;

// ===== PERSISTENCE =====

/// Default number of reports between two energy writes to the settings
/// store. Zero disables settings persistence; retained memory is still used.
pub const SAVE_EVERY: u16 = 0;

// ===== VALUE SELECTION =====

/// Whether queries return the last raw value instead of the last report.
pub const REALTIME_VALUES: bool = false;

/// Whether topics always carry the index, even for a single instance.
pub const USE_INDEX: bool = false;

/// Whether power magnitudes are forced to zero while the only relay is off.
pub const POWER_CHECK_STATUS: bool = true;
