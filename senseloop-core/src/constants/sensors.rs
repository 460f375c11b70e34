//! Per-Type Defaults
//!
//! Offsets and thresholds used when neither an indexed nor a legacy
//! unindexed settings key exists.

// ===== CORRECTIONS =====

/// Additive temperature offset (in the magnitude's output unit).
pub const TEMPERATURE_CORRECTION: f64 = 0.0;

/// Additive relative humidity offset (%).
pub const HUMIDITY_CORRECTION: f64 = 0.0;

/// Additive illuminance offset (lux).
pub const LUX_CORRECTION: f64 = 0.0;

/// Additive pressure offset (hPa).
pub const PRESSURE_CORRECTION: f64 = 0.0;

// ===== REPORT THRESHOLDS =====

/// Minimum temperature change to report. Zero reports every window.
pub const TEMPERATURE_MIN_CHANGE: f64 = 0.0;

/// Minimum humidity change to report.
pub const HUMIDITY_MIN_CHANGE: f64 = 0.0;

/// Energy change that forces an immediate report. Zero disables it.
pub const ENERGY_MAX_CHANGE: f64 = 0.0;
