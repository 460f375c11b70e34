//! Magnitude kinds
//!
//! The semantic type of a measurement. Everything type-specific the registry
//! needs is answered here: names for topics and UIs, the settings key prefix,
//! which output units are acceptable, the default filter, and whether an
//! additive correction or relay gating applies.

use crate::constants::sensors::{
    HUMIDITY_CORRECTION, LUX_CORRECTION, PRESSURE_CORRECTION, TEMPERATURE_CORRECTION,
};
use crate::filters::FilterType;
use crate::units::Unit;

/// Semantic type of a magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum MagnitudeKind {
    Temperature = 0,
    Humidity,
    Pressure,
    Current,
    Voltage,
    PowerActive,
    PowerApparent,
    PowerReactive,
    PowerFactor,
    Energy,
    EnergyDelta,
    Analog,
    Digital,
    Event,
    Pm1dot0,
    Pm2dot5,
    Pm10,
    Co2,
    Voc,
    Iaq,
    IaqAccuracy,
    IaqStatic,
    Lux,
    Uva,
    Uvb,
    Uvi,
    Distance,
    Hcho,
    GeigerCpm,
    GeigerSievert,
    Count,
    No2,
    Co,
    Resistance,
    Ph,
    Frequency,
}

impl MagnitudeKind {
    /// Number of kinds, used to size per-kind counters
    pub const COUNT: usize = 36;

    /// Dense index in `0..COUNT`
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Topic name, also the first component of produced topics
    pub const fn topic(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::Current => "current",
            Self::Voltage => "voltage",
            Self::PowerActive => "power",
            Self::PowerApparent => "apparent",
            Self::PowerReactive => "reactive",
            Self::PowerFactor => "factor",
            Self::Energy => "energy",
            Self::EnergyDelta => "energy_delta",
            Self::Analog => "analog",
            Self::Digital => "digital",
            Self::Event => "event",
            Self::Pm1dot0 => "pm1dot0",
            Self::Pm2dot5 => "pm2dot5",
            Self::Pm10 => "pm10",
            Self::Co2 => "co2",
            Self::Voc => "voc",
            Self::Iaq => "iaq",
            Self::IaqAccuracy => "iaq_accuracy",
            Self::IaqStatic => "iaq_static",
            Self::Lux => "lux",
            Self::Uva => "uva",
            Self::Uvb => "uvb",
            Self::Uvi => "uvi",
            Self::Distance => "distance",
            Self::Hcho => "hcho",
            Self::GeigerCpm => "ldr_cpm",
            Self::GeigerSievert => "ldr_uSvh",
            Self::Count => "count",
            Self::No2 => "no2",
            Self::Co => "co",
            Self::Resistance => "resistance",
            Self::Ph => "ph",
            Self::Frequency => "frequency",
        }
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Pressure => "Pressure",
            Self::Current => "Current",
            Self::Voltage => "Voltage",
            Self::PowerActive => "Active Power",
            Self::PowerApparent => "Apparent Power",
            Self::PowerReactive => "Reactive Power",
            Self::PowerFactor => "Power Factor",
            Self::Energy => "Energy",
            Self::EnergyDelta => "Energy (delta)",
            Self::Analog => "Analog",
            Self::Digital => "Digital",
            Self::Event => "Event",
            Self::Pm1dot0 => "PM1.0",
            Self::Pm2dot5 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::Co2 => "CO2",
            Self::Voc => "VOC",
            Self::Iaq => "IAQ",
            Self::IaqAccuracy => "IAQ Accuracy",
            Self::IaqStatic => "IAQ (Static)",
            Self::Lux => "Illuminance",
            Self::Uva => "UVA",
            Self::Uvb => "UVB",
            Self::Uvi => "UVI",
            Self::Distance => "Distance",
            Self::Hcho => "HCHO",
            Self::GeigerCpm => "Local Dose Rate",
            Self::GeigerSievert => "Local Dose Rate",
            Self::Count => "Count",
            Self::No2 => "NO2",
            Self::Co => "CO",
            Self::Resistance => "Resistance",
            Self::Ph => "pH",
            Self::Frequency => "Frequency",
        }
    }

    /// Prefix of every settings key of this kind, e.g. `tmpCorrection0`
    pub const fn settings_prefix(self) -> &'static str {
        match self {
            Self::Temperature => "tmp",
            Self::Humidity => "hum",
            Self::Pressure => "press",
            Self::Current => "curr",
            Self::Voltage => "volt",
            Self::PowerActive => "pwrP",
            Self::PowerApparent => "pwrQ",
            Self::PowerReactive => "pwrModS",
            Self::PowerFactor => "pwrPF",
            Self::Energy => "ene",
            Self::EnergyDelta => "eneDelta",
            Self::Analog => "analog",
            Self::Digital => "digital",
            Self::Event => "event",
            Self::Pm1dot0 => "pm1dot0",
            Self::Pm2dot5 => "pm2dot5",
            Self::Pm10 => "pm10",
            Self::Co2 => "co2",
            Self::Voc => "voc",
            Self::Iaq => "iaq",
            Self::IaqAccuracy => "iaqAccuracy",
            Self::IaqStatic => "iaqStatic",
            Self::Lux => "lux",
            Self::Uva => "uva",
            Self::Uvb => "uvb",
            Self::Uvi => "uvi",
            Self::Distance => "distance",
            Self::Hcho => "hcho",
            Self::GeigerCpm => "gcpm",
            Self::GeigerSievert => "gsiev",
            Self::Count => "count",
            Self::No2 => "no2",
            Self::Co => "co",
            Self::Resistance => "res",
            Self::Ph => "ph",
            Self::Frequency => "freq",
        }
    }

    /// Filter used unless settings pick another one
    pub const fn default_filter(self) -> FilterType {
        match self {
            Self::Iaq | Self::IaqStatic | Self::Energy => FilterType::Last,
            Self::Count | Self::GeigerCpm | Self::GeigerSievert | Self::EnergyDelta => FilterType::Sum,
            Self::Event | Self::Digital => FilterType::Max,
            _ => FilterType::Median,
        }
    }

    /// Whether an additive correction offset is applied after conversion
    pub const fn supports_correction(self) -> bool {
        matches!(self, Self::Temperature | Self::Humidity | Self::Lux | Self::Pressure)
    }

    /// Build-time correction for kinds that support it
    pub const fn default_correction(self) -> f64 {
        match self {
            Self::Temperature => TEMPERATURE_CORRECTION,
            Self::Humidity => HUMIDITY_CORRECTION,
            Self::Lux => LUX_CORRECTION,
            Self::Pressure => PRESSURE_CORRECTION,
            _ => 0.0,
        }
    }

    /// Output units this kind can be converted into
    ///
    /// `None` means the kind has no conversions and always keeps the unit
    /// the source reports.
    pub const fn supported_units(self) -> Option<&'static [Unit]> {
        match self {
            Self::Temperature => Some(&[Unit::Celsius, Unit::Fahrenheit, Unit::Kelvin]),
            Self::PowerActive => Some(&[Unit::Watt, Unit::Kilowatt]),
            Self::PowerApparent => Some(&[Unit::Voltampere, Unit::Kilovoltampere]),
            Self::PowerReactive => Some(&[Unit::VoltampereReactive, Unit::KilovoltampereReactive]),
            Self::Energy | Self::EnergyDelta => Some(&[Unit::KilowattHour, Unit::WattSecond]),
            _ => None,
        }
    }

    /// Picks the output unit: `requested` when this kind supports it,
    /// otherwise the source's `native` unit
    pub fn select_unit(self, native: Unit, requested: Option<Unit>) -> Unit {
        match (self.supported_units(), requested) {
            (Some(units), Some(requested)) if units.contains(&requested) => requested,
            _ => native,
        }
    }

    /// Whether this reading is forced to zero while the only relay is off
    pub const fn is_power_gated(self) -> bool {
        matches!(
            self,
            Self::PowerActive
                | Self::PowerReactive
                | Self::PowerApparent
                | Self::PowerFactor
                | Self::Current
                | Self::EnergyDelta
        )
    }
}

impl core::fmt::Display for MagnitudeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.topic())
    }
}
