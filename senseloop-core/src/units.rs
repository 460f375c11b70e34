//! Physical Units and Conversions
//!
//! ## Overview
//!
//! Sources report values in their *native* unit (a thermometer speaks °C, a
//! power meter speaks W). A magnitude may be configured to *output* a
//! different but compatible unit. This module holds the unit catalogue and
//! the stateless conversions between compatible pairs:
//!
//! - Temperature: °C ↔ °F ↔ K
//! - Power: W ↔ kW, VA ↔ kVA, VAR ↔ kVAR
//! - Energy: kWh ↔ J (watt-second)
//!
//! Converting between incompatible units leaves the value untouched; the
//! registry never asks for that since output units are validated against the
//! magnitude kind first.
//!
//! ## Rounding
//!
//! Every processed value is rounded to the magnitude's decimals with
//! [`round_to`], which uses `libm` so it behaves the same with and without
//! `std`.

use crate::constants::energy::KWH_MULTIPLIER;

/// Unit of a measured value
///
/// The numeric ids are persisted in settings (`tmpUnits0 = 3`), keep them
/// stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Unit {
    None = 1,
    Celsius = 2,
    Fahrenheit = 3,
    Kelvin = 4,
    Percentage = 5,
    Hectopascal = 6,
    Ampere = 7,
    Volt = 8,
    Voltampere = 9,
    Kilovoltampere = 10,
    VoltampereReactive = 11,
    KilovoltampereReactive = 12,
    Watt = 13,
    Kilowatt = 14,
    /// Also known as joule
    WattSecond = 15,
    KilowattHour = 16,
    PartsPerMillion = 17,
    Ohm = 18,
    MicrogramPerCubicMeter = 19,
    MilligramPerCubicMeter = 20,
    Lux = 21,
    UltravioletIndex = 22,
    CountsPerMinute = 23,
    MicrosievertPerHour = 24,
    Meter = 25,
    Hertz = 26,
    Ph = 27,
}

impl Unit {
    /// Every unit, in id order
    pub const ALL: [Unit; 27] = [
        Unit::None,
        Unit::Celsius,
        Unit::Fahrenheit,
        Unit::Kelvin,
        Unit::Percentage,
        Unit::Hectopascal,
        Unit::Ampere,
        Unit::Volt,
        Unit::Voltampere,
        Unit::Kilovoltampere,
        Unit::VoltampereReactive,
        Unit::KilovoltampereReactive,
        Unit::Watt,
        Unit::Kilowatt,
        Unit::WattSecond,
        Unit::KilowattHour,
        Unit::PartsPerMillion,
        Unit::Ohm,
        Unit::MicrogramPerCubicMeter,
        Unit::MilligramPerCubicMeter,
        Unit::Lux,
        Unit::UltravioletIndex,
        Unit::CountsPerMinute,
        Unit::MicrosievertPerHour,
        Unit::Meter,
        Unit::Hertz,
        Unit::Ph,
    ];

    /// Persisted numeric id
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a unit by its persisted id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|unit| unit.id() == id)
    }

    /// Short symbol used next to formatted values
    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Kelvin => "K",
            Unit::Percentage => "%",
            Unit::Hectopascal => "hPa",
            Unit::Ampere => "A",
            Unit::Volt => "V",
            Unit::Voltampere => "VA",
            Unit::Kilovoltampere => "kVA",
            Unit::VoltampereReactive => "VAR",
            Unit::KilovoltampereReactive => "kVAR",
            Unit::Watt => "W",
            Unit::Kilowatt => "kW",
            Unit::WattSecond => "J",
            Unit::KilowattHour => "kWh",
            Unit::PartsPerMillion => "ppm",
            Unit::Ohm => "ohm",
            Unit::MicrogramPerCubicMeter => "µg/m³",
            Unit::MilligramPerCubicMeter => "mg/m³",
            Unit::Lux => "lux",
            Unit::UltravioletIndex => "UVindex",
            Unit::CountsPerMinute => "cpm",
            Unit::MicrosievertPerHour => "µSv/h",
            Unit::Meter => "m",
            Unit::Hertz => "Hz",
            Unit::Ph => "pH",
        }
    }

    /// Decimals used when neither settings nor the source suggest any
    pub const fn default_decimals(self) -> u8 {
        match self {
            Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin => 1,
            Unit::Percentage => 0,
            Unit::Hectopascal => 2,
            Unit::Ampere => 3,
            Unit::Volt => 0,
            Unit::Watt | Unit::Voltampere | Unit::VoltampereReactive => 0,
            Unit::Kilowatt | Unit::Kilovoltampere | Unit::KilovoltampereReactive => 3,
            Unit::KilowattHour => 3,
            Unit::WattSecond => 0,
            Unit::CountsPerMinute | Unit::MicrosievertPerHour => 4,
            Unit::Meter => 3,
            Unit::Hertz => 1,
            Unit::UltravioletIndex => 3,
            Unit::Ph => 3,
            _ => 0,
        }
    }
}

/// Converts `value` from the `from` unit into the `to` unit
///
/// Incompatible pairs return the value unchanged.
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return value;
    }

    match (from, to) {
        // Temperature scales, always through Celsius
        (Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin, Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin) => {
            from_celsius(to_celsius(value, from), to)
        }

        // Metric prefixes for power
        (Unit::Watt, Unit::Kilowatt)
        | (Unit::Voltampere, Unit::Kilovoltampere)
        | (Unit::VoltampereReactive, Unit::KilovoltampereReactive) => value / 1.0e3,
        (Unit::Kilowatt, Unit::Watt)
        | (Unit::Kilovoltampere, Unit::Voltampere)
        | (Unit::KilovoltampereReactive, Unit::VoltampereReactive) => value * 1.0e3,

        // Energy
        (Unit::KilowattHour, Unit::WattSecond) => value * KWH_MULTIPLIER as f64,
        (Unit::WattSecond, Unit::KilowattHour) => value / KWH_MULTIPLIER as f64,

        _ => value,
    }
}

fn to_celsius(value: f64, from: Unit) -> f64 {
    match from {
        Unit::Fahrenheit => (value - 32.0) / 1.8,
        Unit::Kelvin => value - 273.15,
        _ => value,
    }
}

fn from_celsius(value: f64, to: Unit) -> f64 {
    match to {
        Unit::Fahrenheit => (value * 1.8) + 32.0,
        Unit::Kelvin => value + 273.15,
        _ => value,
    }
}

/// Rounds `value` to `decimals` digits after the decimal point
pub fn round_to(value: f64, decimals: u8) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let multiplier = libm::pow(10.0, decimals as f64);
    libm::round(value * multiplier) / multiplier
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        libm::fabs(a - b) < 1e-9
    }

    #[test]
    fn temperature_scales() {
        assert!(close(convert(100.0, Unit::Celsius, Unit::Fahrenheit), 212.0));
        assert!(close(convert(0.0, Unit::Celsius, Unit::Kelvin), 273.15));
        assert!(close(convert(212.0, Unit::Fahrenheit, Unit::Celsius), 100.0));
        assert!(close(convert(273.15, Unit::Kelvin, Unit::Fahrenheit), 32.0));
    }

    #[test]
    fn metric_prefixes() {
        assert!(close(convert(1500.0, Unit::Watt, Unit::Kilowatt), 1.5));
        assert!(close(convert(2.0, Unit::Kilovoltampere, Unit::Voltampere), 2000.0));
        assert!(close(convert(1.0, Unit::KilowattHour, Unit::WattSecond), 3_600_000.0));
        assert!(close(convert(1_800_000.0, Unit::WattSecond, Unit::KilowattHour), 0.5));
    }

    #[test]
    fn incompatible_units_pass_through() {
        assert_eq!(convert(42.0, Unit::Celsius, Unit::Watt), 42.0);
        assert_eq!(convert(42.0, Unit::Lux, Unit::Lux), 42.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(21.456, 1), 21.5);
        assert_eq!(round_to(21.456, 0), 21.0);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn ids_round_trip() {
        for unit in Unit::ALL {
            assert_eq!(Unit::from_id(unit.id()), Some(unit));
        }
        assert_eq!(Unit::from_id(0), None);
        assert_eq!(Unit::from_id(200), None);
    }
}
