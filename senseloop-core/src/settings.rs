//! Persisted Settings
//!
//! ## Overview
//!
//! Settings live in an external key-value store (flash, EEPROM, a file on a
//! host). The core only needs get/set/remove on short string keys and
//! values, captured by [`SettingsStore`]; typed helpers parse the stored text
//! into numbers, flags and units.
//!
//! ## Key layout
//!
//! Per-magnitude keys are `<prefix><suffix><index_global>`:
//!
//! ```text
//! tmp   Correction  1     -> second temperature magnitude's offset
//! ^^^   ^^^^^^^^^^  ^
//! kind  field       global index
//! ```
//!
//! Several fields also accept the unindexed legacy key (`tmpCorrection`) as
//! a fallback for configurations written before keys were indexed.
//!
//! ## Migrations
//!
//! [`migrate`] rewrites keys written by older releases. Each step runs once,
//! in version order, and the reached version is stored under
//! [`keys::VERSION`].

use core::fmt::Write;
use core::str::FromStr;

use crate::constants::buffers::{SETTINGS_KEY_LEN, SETTINGS_VALUE_LEN};
use crate::constants::MAX_MAGNITUDES;
use crate::errors::{SensorError, SensorResult};
use crate::filters::FilterType;
use crate::units::Unit;

/// A settings key
pub type SettingKey = heapless::String<SETTINGS_KEY_LEN>;

/// A settings value
pub type SettingValue = heapless::String<SETTINGS_VALUE_LEN>;

/// Key names and per-magnitude suffixes
pub mod keys {
    /// Reached migration step
    pub const VERSION: &str = "snsVersion";

    /// Read interval, seconds
    pub const READ_INTERVAL: &str = "snsRead";
    /// Reads per report
    pub const REPORT_EVERY: &str = "snsReport";
    /// Reports per energy save
    pub const SAVE_EVERY: &str = "snsSave";
    /// Discovery retry interval, milliseconds
    pub const INIT_INTERVAL: &str = "snsInit";
    /// Queries return the last raw value
    pub const REALTIME: &str = "apiRealTime";
    /// Topics always carry the index
    pub const USE_INDEX: &str = "snsUseIndex";
    /// Relay gating of power magnitudes
    pub const POWER_CHECK: &str = "snsPowerCheck";

    /// Legacy temperature report threshold
    pub const TEMPERATURE_MIN_DELTA: &str = "tmpMinDelta";
    /// Legacy humidity report threshold
    pub const HUMIDITY_MIN_DELTA: &str = "humMinDelta";
    /// Legacy energy forced-report threshold
    pub const ENERGY_MAX_DELTA: &str = "eneMaxDelta";

    /// Stored energy totals, `eneTotal<n>`
    pub const ENERGY_TOTAL: &str = "eneTotal";

    /// One-shot current calibration request
    pub const EXPECTED_CURRENT: &str = "pwrExpectedC";
    /// One-shot voltage calibration request
    pub const EXPECTED_VOLTAGE: &str = "pwrExpectedV";
    /// One-shot active power calibration request
    pub const EXPECTED_POWER: &str = "pwrExpectedP";
    /// Nominal mains voltage, `pwrVoltage<n>` or legacy `pwrVoltage`
    pub const VOLTAGE: &str = "pwrVoltage";
    /// One-shot energy reset request
    pub const RESET_ENERGY: &str = "pwrResetE";
    /// One-shot calibration reset request
    pub const RESET_CALIBRATION: &str = "pwrResetCalibration";

    /// Output unit id
    pub const UNITS: &str = "Units";
    /// Rounding
    pub const DECIMALS: &str = "Decimals";
    /// Additive offset
    pub const CORRECTION: &str = "Correction";
    /// Report suppression threshold
    pub const MIN_DELTA: &str = "MinDelta";
    /// Forced report threshold
    pub const MAX_DELTA: &str = "MaxDelta";
    /// Raw readings below it become zero
    pub const ZERO_THRESHOLD: &str = "ZeroThreshold";
    /// Filter id
    pub const FILTER: &str = "Filter";
}

/// Builds `<prefix><suffix>`
pub fn key(prefix: &str, suffix: &str) -> SettingKey {
    let mut key = SettingKey::new();
    // Prefixes and suffixes are short constants, they always fit
    let _ = key.push_str(prefix);
    let _ = key.push_str(suffix);
    key
}

/// Builds `<prefix><suffix><index>`
pub fn indexed_key(prefix: &str, suffix: &str, index: usize) -> SettingKey {
    let mut key = key(prefix, suffix);
    let _ = write!(key, "{}", index);
    key
}

fn parse<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// Key-value store holding persisted settings
pub trait SettingsStore {
    /// Stored value of `key`
    fn get(&self, key: &str) -> Option<SettingValue>;

    /// Stores `value` under `key`
    fn set(&mut self, key: &str, value: &str) -> SensorResult<()>;

    /// Deletes `key`. Missing keys are ignored.
    fn remove(&mut self, key: &str);

    /// Whether `key` has a value
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Value of `key` as a float
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|value| parse(&value))
    }

    /// Value of `key` as an unsigned integer
    fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|value| parse(&value))
    }

    /// Value of `key` as a flag
    fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.trim() {
            "1" | "true" | "on" | "yes" | "y" => Some(true),
            "0" | "false" | "off" | "no" | "n" => Some(false),
            _ => None,
        }
    }

    /// Value of `key` as a unit id
    fn get_unit(&self, key: &str) -> Option<Unit> {
        self.get(key)
            .and_then(|value| parse::<u8>(&value))
            .and_then(Unit::from_id)
    }

    /// Value of `key` as a filter id
    fn get_filter(&self, key: &str) -> Option<FilterType> {
        self.get(key)
            .and_then(|value| parse::<u8>(&value))
            .and_then(FilterType::from_id)
    }

    /// Stores a float
    fn set_f64(&mut self, key: &str, value: f64) -> SensorResult<()> {
        let mut text = SettingValue::new();
        write!(text, "{}", value).map_err(|_| SensorError::Overflow)?;
        self.set(key, &text)
    }

    /// Stores an unsigned integer
    fn set_u32(&mut self, key: &str, value: u32) -> SensorResult<()> {
        let mut text = SettingValue::new();
        write!(text, "{}", value).map_err(|_| SensorError::Overflow)?;
        self.set(key, &text)
    }
}

/// Version reached by [`migrate`]
pub const SETTINGS_VERSION: u32 = 3;

fn move_setting(store: &mut dyn SettingsStore, from: &str, to: &str) {
    if let Some(value) = store.get(from) {
        if store.set(to, &value).is_ok() {
            store.remove(from);
        }
    }
}

/// Rewrites keys left by older releases
///
/// Returns the version the store was at before migrating.
pub fn migrate(store: &mut dyn SettingsStore) -> u32 {
    let version = store.get_u32(keys::VERSION).unwrap_or(0);
    if version >= SETTINGS_VERSION {
        return version;
    }

    if version < 1 {
        move_setting(store, "powerUnits", "pwrUnits");
        move_setting(store, "energyUnits", "eneUnits");
    }

    if version < 2 {
        // Totals became per-magnitude
        move_setting(store, keys::ENERGY_TOTAL, "eneTotal0");
        for index in 0..MAX_MAGNITUDES {
            let from = indexed_key("pzEneTotal", "", index);
            let to = indexed_key(keys::ENERGY_TOTAL, "", index);
            move_setting(store, &from, &to);
        }
    }

    if version < 3 {
        // Unit ids are no longer shared between kinds
        for key in ["pwrUnits", "eneUnits", "tmpUnits"] {
            if matches!(store.get(key).as_deref(), Some("0") | Some("1")) {
                store.remove(key);
            }
        }
    }

    if store.set_u32(keys::VERSION, SETTINGS_VERSION).is_err() {
        sns_warn!("[SENSOR] Could not store settings version");
    }

    sns_info!("[SENSOR] Settings migrated from v{} to v{}", version, SETTINGS_VERSION);
    version
}

/// Capacity of [`MemorySettings`]
pub const MEMORY_SETTINGS_CAPACITY: usize = 64;

/// Settings kept in RAM, for hosts and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    entries: heapless::FnvIndexMap<SettingKey, SettingValue, MEMORY_SETTINGS_CAPACITY>,
}

impl MemorySettings {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        let key = SettingKey::try_from(key).ok()?;
        self.entries.get(&key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> SensorResult<()> {
        let key = SettingKey::try_from(key).map_err(|_| SensorError::Overflow)?;
        let value = SettingValue::try_from(value).map_err(|_| SensorError::Overflow)?;
        self.entries
            .insert(key, value)
            .map(|_| ())
            .map_err(|_| SensorError::Overflow)
    }

    fn remove(&mut self, key: &str) {
        if let Ok(key) = SettingKey::try_from(key) {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_building() {
        assert_eq!(key("tmp", keys::MIN_DELTA).as_str(), "tmpMinDelta");
        assert_eq!(indexed_key("hum", keys::CORRECTION, 12).as_str(), "humCorrection12");
        assert_eq!(indexed_key("eneTotal", "", 0).as_str(), "eneTotal0");
    }

    #[test]
    fn typed_getters() {
        let mut store = MemorySettings::new();
        store.set("a", "1.5").unwrap();
        store.set("b", " 42 ").unwrap();
        store.set("c", "on").unwrap();
        store.set("d", "3").unwrap();
        store.set("e", "garbage").unwrap();

        assert_eq!(store.get_f64("a"), Some(1.5));
        assert_eq!(store.get_u32("b"), Some(42));
        assert_eq!(store.get_bool("c"), Some(true));
        assert_eq!(store.get_unit("d"), Some(Unit::Fahrenheit));
        assert_eq!(store.get_filter("d"), Some(FilterType::MovingAverage));

        assert_eq!(store.get_f64("e"), None);
        assert_eq!(store.get_bool("e"), None);
        assert_eq!(store.get_u32("missing"), None);
    }

    #[test]
    fn numeric_setters() {
        let mut store = MemorySettings::new();
        store.set_f64("ratio", 0.25).unwrap();
        store.set_u32("count", 7).unwrap();

        assert_eq!(store.get("ratio").as_deref(), Some("0.25"));
        assert_eq!(store.get("count").as_deref(), Some("7"));

        store.remove("count");
        assert!(!store.contains("count"));
    }

    #[test]
    fn oversized_entries_are_rejected() {
        let mut store = MemorySettings::new();
        let long = "x".repeat(SETTINGS_VALUE_LEN + 1);
        assert_eq!(store.set("key", &long), Err(SensorError::Overflow));
        assert_eq!(store.get("x".repeat(SETTINGS_KEY_LEN + 1).as_str()), None);
    }

    #[test]
    fn migrations_run_in_order() {
        let mut store = MemorySettings::new();
        store.set("powerUnits", "14").unwrap();
        store.set("energyUnits", "1").unwrap();
        store.set("eneTotal", "5+10").unwrap();
        store.set("pzEneTotal1", "7").unwrap();
        store.set("tmpUnits", "0").unwrap();

        assert_eq!(migrate(&mut store), 0);

        assert_eq!(store.get("pwrUnits").as_deref(), Some("14"));
        // Renamed in v1, then dropped in v3 as a shared unit id
        assert!(!store.contains("eneUnits"));
        assert!(!store.contains("energyUnits"));
        assert!(!store.contains("tmpUnits"));

        assert_eq!(store.get("eneTotal0").as_deref(), Some("5+10"));
        assert_eq!(store.get("eneTotal1").as_deref(), Some("7"));
        assert!(!store.contains("eneTotal"));
        assert!(!store.contains("pzEneTotal1"));

        assert_eq!(store.get_u32(keys::VERSION), Some(SETTINGS_VERSION));

        // Second run is a no-op
        store.set("powerUnits", "13").unwrap();
        assert_eq!(migrate(&mut store), SETTINGS_VERSION);
        assert!(store.contains("powerUnits"));
    }
}
