//! Scheduler configuration
//!
//! Build defaults come from [`crate::constants`]; [`SensorConfig::load`]
//! overrides them from settings, clamping every cadence to its documented
//! bounds.

use crate::constants::scheduler::{
    INIT_INTERVAL_MS, POWER_CHECK_STATUS, READ_INTERVAL_MS, READ_MAX_INTERVAL_MS,
    READ_MIN_INTERVAL_MS, REALTIME_VALUES, REPORT_EVERY, REPORT_MAX_EVERY, REPORT_MIN_EVERY,
    SAVE_EVERY, USE_INDEX,
};
use crate::settings::{keys, SettingsStore};
use crate::time::Interval;

/// How discovery treats a source whose `begin()` fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiscoveryPolicy {
    /// Stop the pass at the first source that is not ready; retry the whole
    /// pass after the init interval
    #[default]
    Sequential,
    /// Skip sources that are not ready and keep discovering the rest; the
    /// skipped ones are retried while reading
    Isolated,
}

/// Runtime configuration of the scheduler and registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfig {
    /// Time between two read passes
    pub read_interval: Interval,
    /// Time between two discovery attempts
    pub init_interval: Interval,
    /// Reads per report, also the window of every filter
    pub report_every: u8,
    /// Reports per energy write to settings; zero disables it
    pub save_every: u16,
    /// Queries return the last raw value instead of the last report
    pub realtime: bool,
    /// Topics always carry the global index
    pub use_index: bool,
    /// Power magnitudes read zero while the only relay is off
    pub power_check: bool,
    /// Discovery failure handling
    pub discovery: DiscoveryPolicy,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            read_interval: Interval::millis(READ_INTERVAL_MS),
            init_interval: Interval::millis(INIT_INTERVAL_MS),
            report_every: REPORT_EVERY,
            save_every: SAVE_EVERY,
            realtime: REALTIME_VALUES,
            use_index: USE_INDEX,
            power_check: POWER_CHECK_STATUS,
            discovery: DiscoveryPolicy::Sequential,
        }
    }
}

fn clamp_read_interval(ms: u64) -> Interval {
    Interval::millis(ms.clamp(READ_MIN_INTERVAL_MS, READ_MAX_INTERVAL_MS))
}

fn clamp_report_every(every: u32) -> u8 {
    every.clamp(REPORT_MIN_EVERY as u32, REPORT_MAX_EVERY as u32) as u8
}

impl SensorConfig {
    /// Sets the read interval, clamped to its bounds
    pub fn with_read_interval(mut self, interval: Interval) -> Self {
        self.read_interval = clamp_read_interval(interval.to_millis());
        self
    }

    /// Sets the discovery retry interval
    pub fn with_init_interval(mut self, interval: Interval) -> Self {
        self.init_interval = interval;
        self
    }

    /// Sets reads per report, clamped to its bounds
    pub fn with_report_every(mut self, every: u8) -> Self {
        self.report_every = clamp_report_every(every as u32);
        self
    }

    /// Sets reports per energy save
    pub fn with_save_every(mut self, every: u16) -> Self {
        self.save_every = every;
        self
    }

    /// Selects realtime values for queries
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Forces the index into every topic
    pub fn with_use_index(mut self, use_index: bool) -> Self {
        self.use_index = use_index;
        self
    }

    /// Enables relay gating of power magnitudes
    pub fn with_power_check(mut self, power_check: bool) -> Self {
        self.power_check = power_check;
        self
    }

    /// Sets the discovery policy
    pub fn with_discovery(mut self, discovery: DiscoveryPolicy) -> Self {
        self.discovery = discovery;
        self
    }

    /// Overrides `self` with whatever `settings` holds
    ///
    /// The discovery policy is a build decision and is kept.
    pub fn load(self, settings: &dyn SettingsStore) -> Self {
        let read_interval = settings
            .get_u32(keys::READ_INTERVAL)
            .map(|seconds| clamp_read_interval(seconds as u64 * 1_000))
            .unwrap_or(self.read_interval);

        let report_every = settings
            .get_u32(keys::REPORT_EVERY)
            .map(clamp_report_every)
            .unwrap_or(self.report_every);

        let save_every = settings
            .get_u32(keys::SAVE_EVERY)
            .map(|every| every.min(u16::MAX as u32) as u16)
            .unwrap_or(self.save_every);

        let init_interval = settings
            .get_u32(keys::INIT_INTERVAL)
            .map(|ms| Interval::millis(ms as u64))
            .unwrap_or(self.init_interval);

        Self {
            read_interval,
            init_interval,
            report_every,
            save_every,
            realtime: settings.get_bool(keys::REALTIME).unwrap_or(self.realtime),
            use_index: settings.get_bool(keys::USE_INDEX).unwrap_or(self.use_index),
            power_check: settings.get_bool(keys::POWER_CHECK).unwrap_or(self.power_check),
            discovery: self.discovery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    #[test]
    fn defaults() {
        let config = SensorConfig::default();
        assert_eq!(config.read_interval.to_millis(), 6_000);
        assert_eq!(config.report_every, 10);
        assert_eq!(config.save_every, 0);
        assert_eq!(config.discovery, DiscoveryPolicy::Sequential);
    }

    #[test]
    fn builders_clamp() {
        let config = SensorConfig::default()
            .with_read_interval(Interval::millis(10))
            .with_report_every(200);
        assert_eq!(config.read_interval.to_millis(), READ_MIN_INTERVAL_MS);
        assert_eq!(config.report_every, REPORT_MAX_EVERY);

        let config = SensorConfig::default().with_report_every(0);
        assert_eq!(config.report_every, REPORT_MIN_EVERY);
    }

    #[test]
    fn load_from_settings() {
        let mut settings = MemorySettings::new();
        settings.set("snsRead", "5000").unwrap();
        settings.set("snsReport", "3").unwrap();
        settings.set("snsSave", "12").unwrap();
        settings.set("apiRealTime", "1").unwrap();
        settings.set("snsPowerCheck", "0").unwrap();

        let config = SensorConfig::default()
            .with_discovery(DiscoveryPolicy::Isolated)
            .load(&settings);

        assert_eq!(config.read_interval.to_millis(), READ_MAX_INTERVAL_MS);
        assert_eq!(config.report_every, 3);
        assert_eq!(config.save_every, 12);
        assert!(config.realtime);
        assert!(!config.power_check);
        assert!(!config.use_index);
        assert_eq!(config.discovery, DiscoveryPolicy::Isolated);
    }
}
