//! Two-Wire Bus Constants
//!
//! Timings for the recovery sequence follow the usual "clock out up to nine
//! bits twice" approach; a stretched clock is polled rather than waited on
//! blindly so the whole procedure has a hard upper bound of
//! `RECOVERY_CLOCK_PULSES * RECOVERY_STRETCH_POLLS * RECOVERY_STRETCH_POLL_MS`.

/// Number of addresses covered by the lock table (7-bit space).
pub const ADDRESS_SPACE: usize = 128;

/// First address probed by a bus scan. 0x00 is the general call address.
pub const SCAN_ADDRESS_MIN: u8 = 0x01;

/// Last address probed by a bus scan (exclusive). 0x7F is reserved.
pub const SCAN_ADDRESS_MAX: u8 = 0x7F;

/// Maximum clock pulses sent while the data line is held low.
pub const RECOVERY_CLOCK_PULSES: u8 = 20;

/// Half-period of a recovery clock pulse (microseconds).
pub const RECOVERY_HALF_PERIOD_US: u32 = 10;

/// Number of polls while waiting for a stretched clock to be released.
pub const RECOVERY_STRETCH_POLLS: u8 = 20;

/// Delay between two stretched-clock polls (milliseconds). Twenty polls give
/// the two second upper bound per pulse.
pub const RECOVERY_STRETCH_POLL_MS: u32 = 100;

/// Settle time after releasing both lines, before the first sample
/// (milliseconds). Some real-time clock modules need it on first power up.
pub const RECOVERY_SETTLE_MS: u32 = 2_500;
