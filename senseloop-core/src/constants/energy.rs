//! Energy Accumulator Limits

/// Watt-seconds in one kilowatt-hour.
pub const KWH_MULTIPLIER: u32 = 3_600_000;

/// Modulus applied to the kWh part when converting back to watt-seconds.
///
/// `KWH_LIMIT * KWH_MULTIPLIER` stays below `1 << 31`, so the result also
/// fits consumers that treat watt-seconds as a signed 32-bit counter.
pub const KWH_LIMIT: u32 = (1u32 << 31) / KWH_MULTIPLIER;

/// Watt-seconds in one watt-hour.
pub const WH_MULTIPLIER: u32 = 3_600;
