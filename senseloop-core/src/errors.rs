//! Error Types for Measurement Sources and the Orchestration Core
//!
//! ## Design Philosophy
//!
//! Errors in this crate describe a *kind* of failure, not a call stack:
//!
//! 1. **Small Size**: Every variant is a bare discriminant. Each source keeps its
//!    last error around and the registry can hand it out at any time, so the
//!    type has to stay one byte wide and `Copy`.
//!
//! 2. **No Heap Allocation**: Messages are `&'static str` produced by `Display`.
//!    The same strings end up in logs and in administrative queries.
//!
//! 3. **Never Fatal**: Nothing here aborts the tick loop. A source that fails a
//!    read simply has its magnitudes skipped for that tick, and a failed
//!    discovery is retried on the next init interval.
//!
//! ## Error Categories
//!
//! ### Reading problems
//! - `OutOfRange`, `WarmUp`, `Crc`, `Overflow`
//!
//! ### Hardware ownership and access
//! - `UnknownId`: nothing acknowledged on any candidate address
//! - `BusError`: the shared bus is stuck or the address is already locked
//! - `GpioAlreadyUsed`: another source owns the pin
//! - `Timeout`: a bounded wait expired
//!
//! ### Lifecycle and configuration
//! - `NotReady`, `Calibration`, `Config`, `Unsupported`, `Other`
//!
//! ## Usage
//!
//! ```rust
//! use senseloop_core::SensorError;
//!
//! fn describe(error: Option<SensorError>) -> &'static str {
//!     match error {
//!         None => "OK",
//!         Some(SensorError::WarmUp) => "still warming up, try again later",
//!         Some(_) => "failed",
//!     }
//! }
//!
//! assert_eq!(describe(None), "OK");
//! ```

use thiserror_no_std::Error;

/// Result type for source and orchestration operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Error kinds a measurement source or the core can report
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SensorError {
    /// Result out of sensor range
    #[error("Out of Range")]
    OutOfRange = 1,

    /// Sensor is warming up
    #[error("Warming Up")]
    WarmUp = 2,

    /// Response from sensor timed out
    #[error("Timeout")]
    Timeout = 3,

    /// Sensor did not report a known ID, or nothing acknowledged on the bus
    #[error("Unknown ID")]
    UnknownId = 4,

    /// Sensor data corrupted
    #[error("CRC / Data Error")]
    Crc = 5,

    /// Wrong or locked bus address, or the bus is stuck
    #[error("I2C Error")]
    BusError = 6,

    /// The GPIO is already in use
    #[error("GPIO Already Used")]
    GpioAlreadyUsed = 7,

    /// Calibration error or not calibrated
    #[error("Calibration Error")]
    Calibration = 8,

    /// Counter or accumulator overflowed
    #[error("Overflow")]
    Overflow = 9,

    /// Source has not finished `begin()` yet
    #[error("Not Ready")]
    NotReady = 10,

    /// Invalid configuration
    #[error("Configuration Error")]
    Config = 11,

    /// Operation or unit not supported by this source
    #[error("Not Supported")]
    Unsupported = 12,

    /// Any other error
    #[error("Other / Unknown Error")]
    Other = 99,
}

impl SensorError {
    /// Numeric code, stable across builds
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable description for an optional error, `"OK"` when absent
    pub fn describe(error: Option<Self>) -> &'static str {
        match error {
            None => "OK",
            Some(error) => error.as_str(),
        }
    }

    /// Same text as `Display`, without going through a formatter
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfRange => "Out of Range",
            Self::WarmUp => "Warming Up",
            Self::Timeout => "Timeout",
            Self::UnknownId => "Unknown ID",
            Self::Crc => "CRC / Data Error",
            Self::BusError => "I2C Error",
            Self::GpioAlreadyUsed => "GPIO Already Used",
            Self::Calibration => "Calibration Error",
            Self::Overflow => "Overflow",
            Self::NotReady => "Not Ready",
            Self::Config => "Configuration Error",
            Self::Unsupported => "Not Supported",
            Self::Other => "Other / Unknown Error",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str} ({=u8})", self.as_str(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        use core::fmt::Write;

        let all = [
            SensorError::OutOfRange,
            SensorError::WarmUp,
            SensorError::Timeout,
            SensorError::UnknownId,
            SensorError::Crc,
            SensorError::BusError,
            SensorError::GpioAlreadyUsed,
            SensorError::Calibration,
            SensorError::Overflow,
            SensorError::NotReady,
            SensorError::Config,
            SensorError::Unsupported,
            SensorError::Other,
        ];

        for error in all {
            let mut out: heapless::String<32> = heapless::String::new();
            write!(out, "{}", error).unwrap();
            assert_eq!(out.as_str(), error.as_str());
        }
    }

    #[test]
    fn describe_absent_error() {
        assert_eq!(SensorError::describe(None), "OK");
        assert_eq!(SensorError::describe(Some(SensorError::Crc)), "CRC / Data Error");
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(SensorError::OutOfRange.code(), 1);
        assert_eq!(SensorError::GpioAlreadyUsed.code(), 7);
        assert_eq!(SensorError::Other.code(), 99);
    }
}
