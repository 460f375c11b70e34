//! Measurement Source Capability
//!
//! ## Overview
//!
//! Every sensor driver is a thin translator from some wire protocol to
//! floats, and implements [`MeasurementSource`]. The registry and scheduler
//! only ever talk to drivers through this trait:
//!
//! ```text
//!              begin(resources)          pre()     value(ch)   post()
//! discovery ─────────────────► ready ──► read pass ─────────────────► ...
//!                                │          tick() on every scheduler tick
//!                                └── count(), kind(ch), units(ch)
//! ```
//!
//! A source exposes `count()` channels; each channel becomes one magnitude
//! whose semantic type is `kind(channel)` and whose native unit is
//! `units(channel)`.
//!
//! ## Optional capabilities
//!
//! Power and energy meters additionally implement [`EnergyMeter`] and expose
//! it through [`MeasurementSource::meter`]. The registry uses it to apply
//! calibration ratios, seed energy totals at boot and persist them.
//!
//! ## Shared resources
//!
//! `begin()` receives the [`Resources`] owned by the registry, so a driver can
//! claim its bus address or pins and learn that another source holds them.

use crate::bus::BusArbiter;
use crate::energy::Energy;
use crate::errors::{SensorError, SensorResult};
use crate::gpio::GpioLocks;
use crate::magnitude::MagnitudeKind;
use crate::settings::keys;
use crate::units::Unit;

/// Lock tables shared between all sources
#[derive(Debug, Clone, Default)]
pub struct Resources {
    /// Two-wire bus address ownership
    pub bus: BusArbiter,
    /// Pin ownership
    pub gpio: GpioLocks,
}

impl Resources {
    /// Creates empty lock tables
    pub const fn new() -> Self {
        Self {
            bus: BusArbiter::new(),
            gpio: GpioLocks::new(),
        }
    }
}

/// A physical sensor instance
pub trait MeasurementSource {
    /// Brings the sensor up, claiming its resources. Called during discovery
    /// until [`MeasurementSource::ready`] holds.
    fn begin(&mut self, resources: &mut Resources);

    /// Whether `begin` succeeded and channels are known
    fn ready(&self) -> bool;

    /// Last error recorded by the driver
    fn error(&self) -> Option<SensorError>;

    /// Whether the current readings can be trusted
    fn status(&self) -> bool {
        self.error().is_none()
    }

    /// Number of channels
    fn count(&self) -> usize;

    /// Semantic type of `channel`
    fn kind(&self, channel: usize) -> MagnitudeKind;

    /// Native unit of `channel`
    fn units(&self, channel: usize) -> Unit;

    /// Latest raw reading of `channel`
    fn value(&mut self, channel: usize) -> f64;

    /// Decimals this sensor suggests for `unit`, when it knows better than
    /// the unit default
    fn decimals(&self, _unit: Unit) -> Option<u8> {
        None
    }

    /// Called once per read pass, before any `value`
    fn pre(&mut self) {}

    /// Called once per read pass, after every `value`
    fn post(&mut self) {}

    /// Called on every scheduler tick
    fn tick(&mut self) {}

    /// Human readable name of the sensor
    fn description(&self) -> &str;

    /// Human readable name of one channel
    fn channel_description(&self, _channel: usize) -> &str {
        self.description()
    }

    /// Energy meter capability, when the sensor has one
    fn meter(&self) -> Option<&dyn EnergyMeter> {
        None
    }

    /// Mutable energy meter capability
    fn meter_mut(&mut self) -> Option<&mut dyn EnergyMeter> {
        None
    }
}

/// Calibration ratio of a power meter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioKind {
    /// Current sense ratio
    Current,
    /// Voltage sense ratio
    Voltage,
    /// Active power ratio
    Power,
    /// Energy pulse ratio
    Energy,
}

impl RatioKind {
    /// Every ratio kind
    pub const ALL: [RatioKind; 4] = [
        RatioKind::Current,
        RatioKind::Voltage,
        RatioKind::Power,
        RatioKind::Energy,
    ];

    /// Ratio applied to magnitudes of `kind`
    pub const fn for_magnitude(kind: MagnitudeKind) -> Option<Self> {
        match kind {
            MagnitudeKind::Current => Some(Self::Current),
            MagnitudeKind::Voltage => Some(Self::Voltage),
            MagnitudeKind::PowerActive => Some(Self::Power),
            MagnitudeKind::Energy => Some(Self::Energy),
            _ => None,
        }
    }

    /// Magnitude kind this ratio applies to
    pub const fn magnitude(self) -> MagnitudeKind {
        match self {
            Self::Current => MagnitudeKind::Current,
            Self::Voltage => MagnitudeKind::Voltage,
            Self::Power => MagnitudeKind::PowerActive,
            Self::Energy => MagnitudeKind::Energy,
        }
    }

    /// Settings key of the stored ratio, indexed or legacy
    pub const fn key(self) -> &'static str {
        match self {
            Self::Current => "pwrRatioC",
            Self::Voltage => "pwrRatioV",
            Self::Power => "pwrRatioP",
            Self::Energy => "pwrRatioE",
        }
    }

    /// Settings key of the one-shot calibration request
    pub const fn expected_key(self) -> Option<&'static str> {
        match self {
            Self::Current => Some(keys::EXPECTED_CURRENT),
            Self::Voltage => Some(keys::EXPECTED_VOLTAGE),
            Self::Power => Some(keys::EXPECTED_POWER),
            Self::Energy => None,
        }
    }
}

/// Power and energy meter capability
///
/// `index` is the magnitude's local index: the Nth channel of that kind on
/// this source.
pub trait EnergyMeter {
    /// Number of energy counters
    fn energy_count(&self) -> usize;

    /// Accumulated total of counter `index`
    fn total_energy(&self, index: usize) -> Energy;

    /// Replaces the total of counter `index`
    fn reset_energy(&mut self, index: usize, energy: Energy);

    /// Ratio currently applied to counter/channel `index`
    fn ratio(&self, kind: RatioKind, index: usize) -> f64;

    /// Ratio the driver starts with
    fn default_ratio(&self, kind: RatioKind) -> f64;

    /// Applies a ratio to `index`
    fn set_ratio(&mut self, kind: RatioKind, index: usize, value: f64);

    /// Restores every ratio to its default
    fn reset_ratios(&mut self) {
        for kind in RatioKind::ALL {
            let value = self.default_ratio(kind);
            for index in 0..self.energy_count().max(1) {
                self.set_ratio(kind, index, value);
            }
        }
    }

    /// Nominal mains voltage of meters that sense current only
    fn default_voltage(&self) -> Option<f64> {
        None
    }

    /// Applies the nominal mains voltage to channel `index`
    fn set_voltage(&mut self, _index: usize, _voltage: f64) {}

    /// Computes the ratio that makes channel `index` read `expected` and
    /// applies it. Returns the new ratio.
    fn calibrate(&mut self, _kind: RatioKind, _index: usize, _expected: f64) -> SensorResult<f64> {
        Err(SensorError::Unsupported)
    }
}
