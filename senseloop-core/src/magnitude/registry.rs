use alloc::boxed::Box;

use crate::config::SensorConfig;
use crate::constants::sensors::{ENERGY_MAX_CHANGE, HUMIDITY_MIN_CHANGE, TEMPERATURE_MIN_CHANGE};
use crate::constants::{MAX_MAGNITUDES, MAX_SOURCES};
use crate::energy::Energy;
use crate::errors::{SensorError, SensorResult};
use crate::filters::{Filter, FilterType, MagnitudeFilter};
use crate::report::{self, ProducedValue, Topic};
use crate::retained::RetainedEnergy;
use crate::settings::{indexed_key, key, keys, SettingsStore};
use crate::source::{MeasurementSource, RatioKind, Resources};
use crate::units::{self, Unit};

use super::MagnitudeKind;

/// Position of a source in the registry, in registration order
pub type SourceId = usize;

/// Upper bound for configured decimals
const MAX_DECIMALS: u8 = 10;

/// One calibrated measurement slot
#[derive(Debug, Clone)]
pub struct Magnitude {
    source: SourceId,
    channel: usize,
    kind: MagnitudeKind,
    index_local: usize,
    index_global: usize,
    native_units: Unit,
    units: Unit,
    decimals: u8,
    filter: MagnitudeFilter,
    correction: f64,
    min_delta: f64,
    max_delta: f64,
    zero_threshold: Option<f64>,
    pub(crate) last: f64,
    pub(crate) reported: f64,
}

impl Magnitude {
    fn new(
        source: SourceId,
        channel: usize,
        kind: MagnitudeKind,
        index_local: usize,
        index_global: usize,
        native_units: Unit,
        capacity: usize,
    ) -> Self {
        Self {
            source,
            channel,
            kind,
            index_local,
            index_global,
            native_units,
            units: native_units,
            decimals: native_units.default_decimals(),
            filter: MagnitudeFilter::new(kind.default_filter(), capacity),
            correction: 0.0,
            min_delta: 0.0,
            max_delta: 0.0,
            zero_threshold: None,
            last: f64::NAN,
            reported: f64::NAN,
        }
    }

    /// Owning source
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Channel on the owning source
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Semantic type
    pub fn kind(&self) -> MagnitudeKind {
        self.kind
    }

    /// Nth channel of this kind on the owning source
    pub fn index_local(&self) -> usize {
        self.index_local
    }

    /// Nth magnitude of this kind overall
    pub fn index_global(&self) -> usize {
        self.index_global
    }

    /// Unit the source reports in
    pub fn native_units(&self) -> Unit {
        self.native_units
    }

    /// Output unit
    pub fn units(&self) -> Unit {
        self.units
    }

    /// Digits after the decimal point
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Additive offset applied after conversion
    pub fn correction(&self) -> f64 {
        self.correction
    }

    /// Smallest change worth reporting, zero when disabled
    pub fn min_delta(&self) -> f64 {
        self.min_delta
    }

    /// Change that forces a report, zero when disabled
    pub fn max_delta(&self) -> f64 {
        self.max_delta
    }

    /// Raw readings below it read as zero
    pub fn zero_threshold(&self) -> Option<f64> {
        self.zero_threshold
    }

    /// Last raw reading, NaN before the first read
    pub fn last(&self) -> f64 {
        self.last
    }

    /// Last reported value, NaN before the first report
    pub fn reported(&self) -> f64 {
        self.reported
    }

    /// Report window
    pub fn filter(&self) -> &MagnitudeFilter {
        &self.filter
    }

    pub(crate) fn filter_mut(&mut self) -> &mut MagnitudeFilter {
        &mut self.filter
    }

    /// Converts, clamps, corrects and rounds a raw reading
    pub fn process(&self, raw: f64) -> f64 {
        let mut value = units::convert(raw, self.native_units, self.units);
        if self.native_units == Unit::Percentage {
            value = value.clamp(0.0, 100.0);
        }
        units::round_to(value + self.correction, self.decimals)
    }

    /// Reads `raw` through the hard-zero rules: below `zero_threshold`, or a
    /// power reading while the relay is off
    pub(crate) fn gate(&self, raw: f64, relay_off: bool) -> f64 {
        if relay_off && self.kind.is_power_gated() {
            return 0.0;
        }

        match self.zero_threshold {
            Some(threshold) if raw < threshold => 0.0,
            _ => raw,
        }
    }
}

/// History of a magnitude as seen by queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value {
    /// Last raw reading
    pub last: f64,
    /// Last reported value
    pub reported: f64,
    /// Digits after the decimal point
    pub decimals: u8,
}

impl Value {
    /// Realtime queries see the last reading, others the last report
    pub fn get(&self, realtime: bool) -> f64 {
        if realtime {
            self.last
        } else {
            self.reported
        }
    }
}

/// Owns every source and magnitude
pub struct Registry {
    sources: heapless::Vec<Box<dyn MeasurementSource>, MAX_SOURCES>,
    magnitudes: heapless::Vec<Magnitude, MAX_MAGNITUDES>,
    counts: [usize; MagnitudeKind::COUNT],
    resources: Resources,
    capacity: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            sources: heapless::Vec::new(),
            magnitudes: heapless::Vec::new(),
            counts: [0; MagnitudeKind::COUNT],
            resources: Resources::new(),
            capacity: SensorConfig::default().report_every as usize,
        }
    }

    // ===== SOURCES =====

    /// Takes ownership of a source
    pub fn add_source(&mut self, source: Box<dyn MeasurementSource>) -> SensorResult<SourceId> {
        let id = self.sources.len();
        self.sources.push(source).map_err(|_| SensorError::Overflow)?;
        Ok(id)
    }

    /// Number of sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Source `id`
    pub fn source(&self, id: SourceId) -> Option<&dyn MeasurementSource> {
        self.sources.get(id).map(|source| &**source)
    }

    /// Mutable source `id`
    pub fn source_mut(&mut self, id: SourceId) -> Option<&mut (dyn MeasurementSource + 'static)> {
        self.sources.get_mut(id).map(|source| &mut **source)
    }

    /// Last error of source `id`
    pub fn source_error(&self, id: SourceId) -> Option<SensorError> {
        self.source(id).and_then(|source| source.error())
    }

    /// Lock tables lent to sources
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Mutable lock tables
    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// Calls `begin()` on source `id`, returns whether it became ready
    pub fn begin(&mut self, id: SourceId) -> bool {
        match self.sources.get_mut(id) {
            Some(source) => {
                source.begin(&mut self.resources);
                source.ready()
            }
            None => false,
        }
    }

    pub(crate) fn sources_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn MeasurementSource>> {
        self.sources.iter_mut()
    }

    // ===== MAGNITUDES =====

    /// Binds `channel` of `source` as a new magnitude of `kind`
    ///
    /// Returns the position of the magnitude.
    pub fn add(&mut self, source: SourceId, channel: usize, kind: MagnitudeKind) -> SensorResult<usize> {
        let native = self
            .sources
            .get(source)
            .ok_or(SensorError::Config)?
            .units(channel);

        let index_local = self
            .magnitudes
            .iter()
            .filter(|magnitude| magnitude.source == source && magnitude.kind == kind)
            .count();
        let index_global = self.counts[kind.index()];

        let magnitude = Magnitude::new(source, channel, kind, index_local, index_global, native, self.capacity);
        self.magnitudes.push(magnitude).map_err(|_| SensorError::Overflow)?;
        self.counts[kind.index()] += 1;

        sns_debug!("[SENSOR]  -> {}:{}", kind.topic(), index_global);
        Ok(self.magnitudes.len() - 1)
    }

    /// Adds a magnitude for every channel of a ready source
    ///
    /// Returns how many were added.
    pub fn discover(&mut self, source: SourceId) -> SensorResult<usize> {
        let channels = self.source(source).ok_or(SensorError::Config)?.count();
        for channel in 0..channels {
            let kind = self.sources[source].kind(channel);
            self.add(source, channel, kind)?;
        }
        Ok(channels)
    }

    /// Position of the `index`th magnitude of `kind`
    pub fn find(&self, kind: MagnitudeKind, index: usize) -> Option<usize> {
        self.magnitudes
            .iter()
            .position(|magnitude| magnitude.kind == kind && magnitude.index_global == index)
    }

    /// Magnitude at position `index`
    pub fn get(&self, index: usize) -> Option<&Magnitude> {
        self.magnitudes.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Magnitude> {
        self.magnitudes.get_mut(index)
    }

    /// Magnitudes in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Magnitude> {
        self.magnitudes.iter()
    }

    /// Number of magnitudes
    pub fn count(&self) -> usize {
        self.magnitudes.len()
    }

    /// Number of magnitudes of `kind`
    pub fn counts(&self, kind: MagnitudeKind) -> usize {
        self.counts[kind.index()]
    }

    /// History of magnitude `index`
    pub fn value(&self, index: usize) -> Option<Value> {
        self.get(index).map(|magnitude| Value {
            last: magnitude.last,
            reported: magnitude.reported,
            decimals: magnitude.decimals,
        })
    }

    /// Topic of magnitude `index`
    pub fn topic(&self, index: usize, use_index: bool) -> Option<Topic> {
        self.get(index).map(|magnitude| {
            let with_index = use_index || self.counts(magnitude.kind) > 1;
            report::topic(magnitude.kind, magnitude.index_global, with_index)
        })
    }

    /// Channel description of magnitude `index`
    pub fn description(&self, index: usize) -> Option<&str> {
        let magnitude = self.get(index)?;
        self.sources
            .get(magnitude.source)
            .map(|source| source.channel_description(magnitude.channel))
    }

    /// Record handed to observers for `value` of magnitude `index`
    pub fn produce(&self, index: usize, value: f64, use_index: bool) -> Option<ProducedValue> {
        self.get(index).map(|magnitude| {
            let with_index = use_index || self.counts(magnitude.kind) > 1;
            ProducedValue::new(
                magnitude.kind,
                magnitude.index_global,
                magnitude.units,
                magnitude.decimals,
                value,
                with_index,
            )
        })
    }

    // ===== ENERGY =====

    /// Running total of energy magnitude `index`
    pub fn total_energy(&self, index: usize) -> Option<Energy> {
        let magnitude = self.get(index).filter(|m| m.kind == MagnitudeKind::Energy)?;
        let meter = self.sources.get(magnitude.source)?.meter()?;
        Some(meter.total_energy(magnitude.index_local))
    }

    /// Replaces the running total of energy magnitude `index` on its source
    pub fn set_energy(&mut self, index: usize, energy: Energy) -> SensorResult<()> {
        let magnitude = self
            .magnitudes
            .get(index)
            .filter(|m| m.kind == MagnitudeKind::Energy)
            .ok_or(SensorError::Unsupported)?;

        let meter = self
            .sources
            .get_mut(magnitude.source)
            .and_then(|source| source.meter_mut())
            .ok_or(SensorError::Unsupported)?;

        meter.reset_energy(magnitude.index_local, energy);
        Ok(())
    }

    // ===== CONFIGURATION =====

    /// Applies settings to every source and magnitude
    ///
    /// Runs at boot and on every settings reload: handles pending calibration
    /// requests of energy meters, then re-derives ratios, units, correction,
    /// decimals, thresholds and filters of each magnitude.
    pub fn configure(
        &mut self,
        config: &SensorConfig,
        settings: &mut dyn SettingsStore,
        mut retained: Option<&mut (dyn RetainedEnergy + '_)>,
    ) {
        self.capacity = config.report_every as usize;

        for id in 0..self.sources.len() {
            self.calibrate_source(id, settings, retained.as_deref_mut());
        }

        let tmp_min_delta = settings
            .get_f64(keys::TEMPERATURE_MIN_DELTA)
            .unwrap_or(TEMPERATURE_MIN_CHANGE);
        let hum_min_delta = settings
            .get_f64(keys::HUMIDITY_MIN_DELTA)
            .unwrap_or(HUMIDITY_MIN_CHANGE);
        let ene_max_delta = settings
            .get_f64(keys::ENERGY_MAX_DELTA)
            .unwrap_or(ENERGY_MAX_CHANGE);

        for magnitude in self.magnitudes.iter_mut() {
            let kind = magnitude.kind;
            let prefix = kind.settings_prefix();
            let index = magnitude.index_global;
            let Some(source) = self.sources.get_mut(magnitude.source) else {
                continue;
            };

            // Meter ratios, indexed key first then the legacy one
            if let Some(ratio) = RatioKind::for_magnitude(kind) {
                if let Some(meter) = source.meter_mut() {
                    let value = settings
                        .get_f64(&indexed_key(ratio.key(), "", index))
                        .or_else(|| settings.get_f64(ratio.key()))
                        .unwrap_or_else(|| meter.default_ratio(ratio));
                    meter.set_ratio(ratio, magnitude.index_local, value);
                }
            }

            if kind == MagnitudeKind::Voltage {
                if let Some(meter) = source.meter_mut() {
                    if let Some(default) = meter.default_voltage() {
                        let voltage = settings
                            .get_f64(&indexed_key(keys::VOLTAGE, "", index))
                            .or_else(|| settings.get_f64(keys::VOLTAGE))
                            .unwrap_or(default);
                        meter.set_voltage(magnitude.index_local, voltage);
                    }
                }
            }

            let requested = settings.get_unit(&indexed_key(prefix, keys::UNITS, index));
            magnitude.units = kind.select_unit(magnitude.native_units, requested);

            magnitude.correction = if kind.supports_correction() {
                settings
                    .get_f64(&indexed_key(prefix, keys::CORRECTION, index))
                    .or_else(|| settings.get_f64(&key(prefix, keys::CORRECTION)))
                    .unwrap_or(kind.default_correction())
            } else {
                0.0
            };

            magnitude.decimals = settings
                .get_u32(&indexed_key(prefix, keys::DECIMALS, index))
                .map(|decimals| decimals.min(MAX_DECIMALS as u32) as u8)
                .or_else(|| source.decimals(magnitude.units))
                .unwrap_or(magnitude.units.default_decimals());

            let (min_default, max_default) = match kind {
                MagnitudeKind::Temperature => (tmp_min_delta, 0.0),
                MagnitudeKind::Humidity => (hum_min_delta, 0.0),
                MagnitudeKind::Energy => (0.0, ene_max_delta),
                _ => (0.0, 0.0),
            };
            magnitude.min_delta = settings
                .get_f64(&indexed_key(prefix, keys::MIN_DELTA, index))
                .unwrap_or(min_default);
            magnitude.max_delta = settings
                .get_f64(&indexed_key(prefix, keys::MAX_DELTA, index))
                .unwrap_or(max_default);

            magnitude.zero_threshold = settings
                .get_f64(&indexed_key(prefix, keys::ZERO_THRESHOLD, index))
                .filter(|threshold| !threshold.is_nan());

            let filter_type = settings
                .get_filter(&indexed_key(prefix, keys::FILTER, index))
                .unwrap_or(kind.default_filter());
            if magnitude.filter.kind() != filter_type {
                magnitude.filter = MagnitudeFilter::new(filter_type, self.capacity);
            } else if is_windowed(filter_type) && magnitude.filter.capacity() != self.capacity {
                magnitude.filter.resize(self.capacity);
            }

            // Without periodic saves a stored total would only ever go stale
            if kind == MagnitudeKind::Energy && config.save_every == 0 {
                clear_stored_energy(index, settings, retained.as_deref_mut());
            }
        }

        sns_info!("[SENSOR] Configured {} magnitude(s)", self.magnitudes.len());
    }

    /// One-shot calibration requests of an energy meter source
    fn calibrate_source(
        &mut self,
        id: SourceId,
        settings: &mut dyn SettingsStore,
        mut retained: Option<&mut (dyn RetainedEnergy + '_)>,
    ) {
        let magnitudes = &self.magnitudes;
        let Some(meter) = self.sources.get_mut(id).and_then(|source| source.meter_mut()) else {
            return;
        };

        let global_of = |kind: MagnitudeKind, local: usize| {
            magnitudes
                .iter()
                .find(|m| m.source == id && m.kind == kind && m.index_local == local)
                .map(|m| m.index_global)
        };

        for ratio in RatioKind::ALL {
            let Some(expected_key) = ratio.expected_key() else {
                continue;
            };
            let Some(expected) = settings.get_f64(expected_key).filter(|value| *value != 0.0) else {
                continue;
            };
            settings.remove(expected_key);

            match meter.calibrate(ratio, 0, expected) {
                Ok(value) => {
                    let stored = match global_of(ratio.magnitude(), 0) {
                        Some(index) => settings.set_f64(&indexed_key(ratio.key(), "", index), value),
                        None => settings.set_f64(ratio.key(), value),
                    };
                    if stored.is_err() {
                        sns_warn!("[SENSOR] Could not store {}", ratio.key());
                    }
                }
                Err(_error) => {
                    sns_warn!("[SENSOR] Calibration of {} failed: {}", ratio.key(), _error);
                }
            }
        }

        if settings.get_bool(keys::RESET_ENERGY) == Some(true) {
            settings.remove(keys::RESET_ENERGY);
            for local in 0..meter.energy_count() {
                meter.reset_energy(local, Energy::ZERO);
                if let Some(index) = global_of(MagnitudeKind::Energy, local) {
                    clear_stored_energy(index, settings, retained.as_deref_mut());
                }
            }
            sns_info!("[SENSOR] Energy totals of source #{} reset", id);
        }

        if settings.get_bool(keys::RESET_CALIBRATION) == Some(true) {
            settings.remove(keys::RESET_CALIBRATION);
            for ratio in RatioKind::ALL {
                settings.remove(ratio.key());
                for m in magnitudes.iter().filter(|m| m.source == id && m.kind == ratio.magnitude()) {
                    settings.remove(&indexed_key(ratio.key(), "", m.index_global));
                }
            }
            meter.reset_ratios();
            sns_info!("[SENSOR] Calibration of source #{} reset", id);
        }
    }
}

fn is_windowed(filter: FilterType) -> bool {
    matches!(filter, FilterType::Median | FilterType::MovingAverage | FilterType::Sum)
}

// ===== ENERGY PERSISTENCE =====

/// Total stored for energy magnitude `index_global`
///
/// Retained memory wins; the settings copy is only trusted while periodic
/// saves are enabled. Anything unreadable counts as zero.
pub fn stored_energy(
    index_global: usize,
    settings: &dyn SettingsStore,
    retained: Option<&dyn RetainedEnergy>,
    save_every: u16,
) -> Energy {
    if let Some(energy) = retained.and_then(|retained| retained.energy(index_global)) {
        return energy;
    }

    if save_every > 0 {
        let stored = settings.get(&indexed_key(keys::ENERGY_TOTAL, "", index_global));
        if let Some(energy) = stored.and_then(|text| text.parse::<Energy>().ok()) {
            return energy;
        }
    }

    Energy::ZERO
}

/// Writes `energy` to retained memory, and to settings when `persistent`
pub fn store_energy(
    index_global: usize,
    energy: Energy,
    settings: &mut dyn SettingsStore,
    retained: Option<&mut (dyn RetainedEnergy + '_)>,
    persistent: bool,
) {
    if let Some(retained) = retained {
        retained.set_energy(index_global, energy);
    }

    if persistent {
        let mut text = crate::settings::SettingValue::new();
        // "<u32>+<u32>" always fits
        let _ = core::fmt::write(&mut text, format_args!("{}+{}", energy.kwh(), energy.ws()));
        let key = indexed_key(keys::ENERGY_TOTAL, "", index_global);
        if settings.set(&key, &text).is_err() {
            sns_warn!("[SENSOR] Could not store {}", key.as_str());
        }
    }
}

/// Forgets every stored copy of energy magnitude `index_global`
pub fn clear_stored_energy(
    index_global: usize,
    settings: &mut dyn SettingsStore,
    retained: Option<&mut (dyn RetainedEnergy + '_)>,
) {
    settings.remove(&indexed_key(keys::ENERGY_TOTAL, "", index_global));
    if let Some(retained) = retained {
        retained.reset_energy(index_global);
    }
}
