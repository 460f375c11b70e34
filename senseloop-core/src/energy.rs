//! Split-Precision Energy Counter
//!
//! ## Overview
//!
//! Energy totals grow for years, but the meters feeding them deliver small
//! watt-second increments and the targets only have cheap 32-bit integer
//! arithmetic. Accumulating in a single float loses the small increments
//! once the total gets large; accumulating watt-seconds in a `u32` overflows
//! after ~1193 kWh.
//!
//! [`Energy`] keeps two integers instead:
//!
//! ```text
//! Energy { kwh: 1234, ws: 1_800_000 }  ==  1234.5 kWh
//!          ^^^^^^^^^  ^^^^^^^^^^^^^
//!          whole kWh  residual, always < 3_600_000 (one kWh)
//! ```
//!
//! Every addition is exact and the residual invariant is restored after
//! each one by folding whole kilowatt-hours into `kwh`.
//!
//! ## Persistence format
//!
//! Totals are stored as text: `"<kwh>"` when the residual is zero, otherwise
//! `"<kwh>+<ws>"`. Anything else fails to parse and the caller treats the
//! stored value as absent.

use core::fmt;
use core::ops::{Add, AddAssign};
use core::str::FromStr;

use thiserror_no_std::Error;

use crate::constants::energy::{KWH_LIMIT, KWH_MULTIPLIER, WH_MULTIPLIER};

/// Energy total as whole kilowatt-hours plus residual watt-seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Energy {
    kwh: u32,
    ws: u32,
}

impl Energy {
    /// Zero energy
    pub const ZERO: Energy = Energy { kwh: 0, ws: 0 };

    /// Creates a total, folding any excess watt-seconds into `kwh`
    pub fn new(kwh: u32, ws: u32) -> Self {
        let mut energy = Energy { kwh, ws: 0 };
        energy += ws;
        energy
    }

    /// Creates a total from watt-seconds
    pub fn from_watt_seconds(ws: u32) -> Self {
        Self::new(0, ws)
    }

    /// Creates a total from watt-hours
    pub fn from_watt_hours(wh: u32) -> Self {
        let kwh = wh / 1000;
        let ws = (wh % 1000) * WH_MULTIPLIER;
        Self::new(kwh, ws)
    }

    /// Splits a kilowatt-hour reading into whole kWh and residual
    ///
    /// Negative or non-finite readings become zero, readings past `u32::MAX`
    /// kWh saturate.
    pub fn from_kwh(kwh: f64) -> Self {
        if !kwh.is_finite() || kwh <= 0.0 {
            return Self::ZERO;
        }

        let whole = libm::floor(kwh);
        if whole >= u32::MAX as f64 {
            return Energy { kwh: u32::MAX, ws: 0 };
        }

        let residual = libm::floor((kwh - whole) * KWH_MULTIPLIER as f64) as u32;
        Self::new(whole as u32, residual)
    }

    /// Whole kilowatt-hours
    pub const fn kwh(&self) -> u32 {
        self.kwh
    }

    /// Residual watt-seconds, always below one kilowatt-hour
    pub const fn ws(&self) -> u32 {
        self.ws
    }

    /// Total in kilowatt-hours
    pub fn as_kwh(&self) -> f64 {
        self.kwh as f64 + (self.ws as f64 / KWH_MULTIPLIER as f64)
    }

    /// Total in watt-seconds
    ///
    /// The kWh component is reduced modulo [`KWH_LIMIT`] first, so the result
    /// wraps around instead of overflowing. Consumers needing the full total
    /// should use [`Energy::as_kwh`].
    pub fn as_watt_seconds(&self) -> u32 {
        (self.kwh % KWH_LIMIT) * KWH_MULTIPLIER + self.ws
    }

    /// Whether both components are zero
    pub const fn is_zero(&self) -> bool {
        self.kwh == 0 && self.ws == 0
    }

    /// Clears the total
    pub fn reset(&mut self) {
        *self = Self::ZERO;
    }
}

impl AddAssign<u32> for Energy {
    /// Adds watt-seconds
    fn add_assign(&mut self, ws: u32) {
        self.kwh = self.kwh.wrapping_add(ws / KWH_MULTIPLIER);
        let ws = ws % KWH_MULTIPLIER;

        let headroom = KWH_MULTIPLIER - self.ws;
        if ws >= headroom {
            self.kwh = self.kwh.wrapping_add(1);
            self.ws = ws - headroom;
        } else {
            self.ws += ws;
        }
    }
}

impl Add<u32> for Energy {
    type Output = Energy;

    fn add(mut self, ws: u32) -> Energy {
        self += ws;
        self
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ws == 0 {
            write!(f, "{}", self.kwh)
        } else {
            write!(f, "{}+{}", self.kwh, self.ws)
        }
    }
}

/// Stored energy total that is not `"<kwh>"` or `"<kwh>+<ws>"`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Malformed energy total")]
pub struct EnergyParseError;

impl FromStr for Energy {
    type Err = EnergyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn number(s: &str) -> Result<u32, EnergyParseError> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(EnergyParseError);
            }
            s.parse().map_err(|_| EnergyParseError)
        }

        match s.split_once('+') {
            Some((kwh, ws)) => Ok(Energy::new(number(kwh)?, number(ws)?)),
            None => Ok(Energy::new(number(s)?, 0)),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Energy {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}+{}", self.kwh, self.ws)
    }
}
