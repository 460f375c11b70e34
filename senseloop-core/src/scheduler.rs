//! Discovery, Read and Report Scheduler
//!
//! ## Overview
//!
//! The whole subsystem runs inside one cooperative [`Scheduler::tick`] called
//! from the firmware main loop. The scheduler owns the [`Registry`] and walks
//! a small state machine, one transition per tick:
//!
//! ```text
//!  None ──► Initial ──(init() ok)──► Ready ──(magnitudes > 0)──► Reading
//!            │  ▲                                                 │  ▲
//!            └──┘ retry every init interval                      └──┘ read every read interval
//! ```
//!
//! ## Discovery
//!
//! `init()` walks the sources in registration order. Ready sources are not
//! begun again. A source that is still not ready after `begin()` ends the
//! pass under [`DiscoveryPolicy::Sequential`]; under
//! [`DiscoveryPolicy::Isolated`] it is skipped and retried later while the
//! others proceed. Every newly ready source has its channels registered as
//! magnitudes, energy totals seeded from retained memory or settings, and
//! the registry is reconfigured.
//!
//! ## Read pass
//!
//! Every read interval:
//!
//! 1. `pre()` on every source
//! 2. for each magnitude whose source reports a healthy status, in
//!    discovery order: read, hard-zero, feed the filter, process and
//!    dispatch a `read` event
//! 3. report when the cadence counter wraps; magnitudes with a `max_delta`
//!    that already reported once report only when the change reaches it.
//!    A report takes the filter's aggregate, resets the filter and is
//!    suppressed below `min_delta`
//! 4. energy totals go to retained memory on every read and to settings
//!    every `save_every` reports
//! 5. `post()` on every source
//!
//! Errors never stop the loop: failing sources are skipped for the tick and
//! their error stays queryable through the registry.

use alloc::boxed::Box;

use crate::config::{DiscoveryPolicy, SensorConfig};
use crate::constants::{MAX_MAGNITUDES, MAX_OBSERVERS, MAX_SOURCES};
use crate::energy::Energy;
use crate::errors::{SensorError, SensorResult};
use crate::filters::Filter;
use crate::magnitude::{store_energy, stored_energy, MagnitudeKind, Registry, SourceId};
use crate::report::MagnitudeObserver;
use crate::retained::RetainedEnergy;
use crate::settings::{self, SettingsStore};
use crate::source::MeasurementSource;
use crate::time::{due, TimeSource, Timestamp};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerState {
    /// Not ticked yet
    None,
    /// Discovering sources
    Initial,
    /// Discovery done
    Ready,
    /// Reading and reporting
    Reading,
}

/// Relay state, used to zero power readings while the load is off
pub trait RelayStatus {
    /// Number of relays on the board
    fn relay_count(&self) -> usize;

    /// Whether relay `id` is on
    fn relay_status(&self, id: usize) -> bool;
}

/// Collaborators lent to the scheduler for one call
pub struct Services<'a> {
    /// Persisted settings
    pub settings: &'a mut dyn SettingsStore,
    /// Retained memory, when the board has some
    pub retained: Option<&'a mut dyn RetainedEnergy>,
    /// Relay state, when the board has relays
    pub relays: Option<&'a dyn RelayStatus>,
}

impl<'a> Services<'a> {
    /// Services with only a settings store
    pub fn new(settings: &'a mut dyn SettingsStore) -> Self {
        Self {
            settings,
            retained: None,
            relays: None,
        }
    }

    /// Adds retained memory
    pub fn with_retained(mut self, retained: &'a mut dyn RetainedEnergy) -> Self {
        self.retained = Some(retained);
        self
    }

    /// Adds relay state
    pub fn with_relays(mut self, relays: &'a dyn RelayStatus) -> Self {
        self.relays = Some(relays);
        self
    }

    fn relay_off(&self) -> bool {
        self.relays
            .is_some_and(|relays| relays.relay_count() == 1 && !relays.relay_status(0))
    }
}

/// Measurement orchestration engine
pub struct Scheduler {
    registry: Registry,
    base: SensorConfig,
    config: SensorConfig,
    state: SchedulerState,
    observers: heapless::Vec<Box<dyn MagnitudeObserver>, MAX_OBSERVERS>,
    discovered: heapless::Vec<bool, MAX_SOURCES>,
    sources_ready: bool,
    last_init: Option<Timestamp>,
    last_read: Option<Timestamp>,
    report_count: u8,
    save_count: [u16; MAX_MAGNITUDES],
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SensorConfig::default())
    }
}

impl Scheduler {
    /// Creates a scheduler; settings loaded on the first tick override
    /// `config`
    pub fn new(config: SensorConfig) -> Self {
        Self {
            registry: Registry::new(),
            base: config,
            config,
            state: SchedulerState::None,
            observers: heapless::Vec::new(),
            discovered: heapless::Vec::new(),
            sources_ready: false,
            last_init: None,
            last_read: None,
            report_count: 0,
            save_count: [0; MAX_MAGNITUDES],
        }
    }

    /// Registers a source. Only possible before the first tick.
    pub fn add_source(&mut self, source: Box<dyn MeasurementSource>) -> SensorResult<SourceId> {
        if self.state != SchedulerState::None {
            sns_warn!("[SENSOR] Sources can only be added before the first tick");
            return Err(SensorError::Config);
        }

        let id = self.registry.add_source(source)?;
        self.discovered.push(false).map_err(|_| SensorError::Overflow)?;
        Ok(id)
    }

    /// Attaches a consumer of read and report events
    pub fn add_observer(&mut self, observer: Box<dyn MagnitudeObserver>) -> SensorResult<()> {
        self.observers.push(observer).map_err(|_| SensorError::Overflow)
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Sources and magnitudes
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether every source has been discovered
    pub fn sources_ready(&self) -> bool {
        self.sources_ready
    }

    /// Value of magnitude `index` as queries see it: the last reading in
    /// realtime mode, the last report otherwise
    pub fn value(&self, index: usize) -> Option<f64> {
        self.registry
            .value(index)
            .map(|value| value.get(self.config.realtime))
    }

    /// Replaces the total of energy magnitude `index` and every stored copy
    pub fn set_energy(&mut self, index: usize, energy: Energy, services: &mut Services<'_>) -> SensorResult<()> {
        self.registry.set_energy(index, energy)?;

        if let Some(magnitude) = self.registry.get(index) {
            store_energy(
                magnitude.index_global(),
                energy,
                services.settings,
                services.retained.as_deref_mut(),
                self.config.save_every > 0,
            );
        }
        Ok(())
    }

    /// Re-reads configuration from settings and reconfigures the registry
    pub fn reload(&mut self, services: &mut Services<'_>) {
        self.config = self.base.load(&*services.settings);
        self.registry
            .configure(&self.config, services.settings, services.retained.as_deref_mut());
    }

    /// Ticks at the current time of `clock`
    pub fn run(&mut self, clock: &dyn TimeSource, services: &mut Services<'_>) {
        self.tick(clock.now(), services);
    }

    /// Runs one step of the state machine
    pub fn tick(&mut self, now: Timestamp, services: &mut Services<'_>) {
        match self.state {
            SchedulerState::None => {
                settings::migrate(services.settings);
                self.config = self.base.load(&*services.settings);
                self.state = SchedulerState::Initial;
                sns_debug!("[SENSOR] Discovering {} source(s)", self.registry.source_count());
            }
            SchedulerState::Initial => {
                if due(now, self.last_init, self.config.init_interval) {
                    self.last_init = Some(now);
                    if self.init(services) {
                        self.state = SchedulerState::Ready;
                    }
                }
            }
            SchedulerState::Ready => {
                if self.registry.count() > 0 {
                    self.state = SchedulerState::Reading;
                    sns_info!("[SENSOR] Reading {} magnitude(s)", self.registry.count());
                }
            }
            SchedulerState::Reading => {
                for source in self.registry.sources_mut() {
                    source.tick();
                }

                if !self.sources_ready && due(now, self.last_init, self.config.init_interval) {
                    self.last_init = Some(now);
                    self.init(services);
                }

                if due(now, self.last_read, self.config.read_interval) {
                    self.last_read = Some(now);
                    self.read(services);
                }
            }
        }
    }

    /// One discovery pass. Returns whether the scheduler may leave the
    /// initial state.
    fn init(&mut self, services: &mut Services<'_>) -> bool {
        let mut all_ready = true;
        let mut discovered_any = false;

        for id in 0..self.registry.source_count() {
            if self.discovered.get(id).copied().unwrap_or(true) {
                continue;
            }

            let ready = match self.registry.source(id) {
                Some(source) if source.ready() => true,
                Some(_source) => {
                    sns_debug!("[SENSOR] Initializing {}", _source.description());
                    self.registry.begin(id)
                }
                None => false,
            };

            if !ready {
                if let Some(_error) = self.registry.source_error(id) {
                    sns_warn!("[SENSOR]  -> ERROR {}", _error);
                }
                all_ready = false;
                match self.config.discovery {
                    DiscoveryPolicy::Sequential => break,
                    DiscoveryPolicy::Isolated => continue,
                }
            }

            let first = self.registry.count();
            if let Err(_error) = self.registry.discover(id) {
                sns_warn!("[SENSOR] Could not register every channel: {}", _error);
            }
            if let Some(flag) = self.discovered.get_mut(id) {
                *flag = true;
            }
            discovered_any = true;

            for index in first..self.registry.count() {
                self.seed_energy(index, services);
            }
        }

        if discovered_any {
            self.registry
                .configure(&self.config, services.settings, services.retained.as_deref_mut());
        }

        self.sources_ready = all_ready;
        match self.config.discovery {
            DiscoveryPolicy::Sequential => all_ready,
            DiscoveryPolicy::Isolated => all_ready || self.registry.count() > 0,
        }
    }

    fn seed_energy(&mut self, index: usize, services: &mut Services<'_>) {
        let Some(magnitude) = self.registry.get(index) else {
            return;
        };
        if magnitude.kind() != MagnitudeKind::Energy {
            return;
        }

        let energy = stored_energy(
            magnitude.index_global(),
            &*services.settings,
            services.retained.as_deref(),
            self.config.save_every,
        );

        // Sources without a meter keep their own total
        let _ = self.registry.set_energy(index, energy);
    }

    fn read(&mut self, services: &mut Services<'_>) {
        let report_every = self.config.report_every.max(1);
        self.report_count = (self.report_count + 1) % report_every;
        let counter_hit = self.report_count == 0;

        for source in self.registry.sources_mut() {
            source.pre();
            if !source.status() {
                sns_warn!(
                    "[SENSOR] Error reading data from {} ({})",
                    source.description(),
                    source.error().map_or("unknown", |error| error.as_str())
                );
            }
        }

        let relay_off = self.config.power_check && services.relay_off();

        for index in 0..self.registry.count() {
            let Some(magnitude) = self.registry.get(index) else {
                continue;
            };
            let (source_id, channel) = (magnitude.source(), magnitude.channel());

            let raw = match self.registry.source_mut(source_id) {
                Some(source) if source.status() => source.value(channel),
                _ => continue,
            };

            let Some(magnitude) = self.registry.get_mut(index) else {
                continue;
            };
            let raw = magnitude.gate(raw, relay_off);
            magnitude.last = raw;
            magnitude.filter_mut().update(raw);

            // Once something was reported, a configured max_delta replaces
            // the report counter
            let shown = magnitude.process(raw);
            let report = if magnitude.max_delta() > 0.0 && !magnitude.reported.is_nan() {
                libm::fabs(shown - magnitude.reported) >= magnitude.max_delta()
            } else {
                counter_hit
            };

            if let Some(value) = self.registry.produce(index, shown, self.config.use_index) {
                for observer in self.observers.iter_mut() {
                    observer.on_read(index, &value);
                }
            }

            if self.registry.get(index).is_some_and(|m| m.kind() == MagnitudeKind::Energy) {
                self.save_energy(index, report, services);
            }

            if report {
                self.report(index);
            }
        }

        for source in self.registry.sources_mut() {
            source.post();
        }
    }

    fn report(&mut self, index: usize) {
        let Some(magnitude) = self.registry.get_mut(index) else {
            return;
        };

        let filtered = magnitude.process(magnitude.filter().value());
        magnitude.filter_mut().reset();

        let reported = magnitude.reported();
        if !reported.is_nan() && libm::fabs(filtered - reported) < magnitude.min_delta() {
            return;
        }
        magnitude.reported = filtered;

        if let Some(value) = self.registry.produce(index, filtered, self.config.use_index) {
            sns_debug!("[SENSOR] {} {}", value.topic.as_str(), value.formatted.as_str());
            for observer in self.observers.iter_mut() {
                observer.on_report(index, &value);
            }
        }
    }

    fn save_energy(&mut self, index: usize, report: bool, services: &mut Services<'_>) {
        let Some(energy) = self.registry.total_energy(index) else {
            return;
        };
        let Some(index_global) = self.registry.get(index).map(|m| m.index_global()) else {
            return;
        };

        let save_every = self.config.save_every;
        let persistent = report
            && save_every > 0
            && match self.save_count.get_mut(index_global) {
                Some(count) => {
                    *count = (*count + 1) % save_every;
                    *count == 0
                }
                None => false,
            };

        store_energy(
            index_global,
            energy,
            services.settings,
            services.retained.as_deref_mut(),
            persistent,
        );
    }
}
