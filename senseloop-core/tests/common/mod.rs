//! Common fixtures for integration tests
//!
//! This module provides:
//! - Scriptable measurement sources (plain, energy meter, bus attached)
//! - A recording observer
//! - Hardware doubles for the bus and its recovery lines (`harness`)
//! - Proptest strategies (`generators`)
//! - Scheduler drivers (`scenarios`)
//!
//! Sources hand out a cloneable handle so a test can change readings and
//! inspect calls after the source has been boxed into the scheduler.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use senseloop_core::{
    Energy, EnergyMeter, MagnitudeKind, MagnitudeObserver, MeasurementSource, ProducedValue,
    RatioKind, Resources, SensorError, SensorResult, Unit,
};

pub mod generators;
pub mod harness;
pub mod scenarios;

// ===== PLAIN SOURCE =====

/// Shared view of a [`FakeSource`]
#[derive(Clone, Default)]
pub struct SourceHandle {
    values: Rc<RefCell<Vec<f64>>>,
    begins: Rc<Cell<u32>>,
    error: Rc<Cell<Option<SensorError>>>,
    reads: Rc<Cell<u32>>,
    pre: Rc<Cell<u32>>,
    post: Rc<Cell<u32>>,
    ticks: Rc<Cell<u32>>,
}

impl SourceHandle {
    /// Next reading of `channel`
    pub fn set(&self, channel: usize, value: f64) {
        self.values.borrow_mut()[channel] = value;
    }

    /// Makes the source report `error` until healed
    pub fn fail(&self, error: SensorError) {
        self.error.set(Some(error));
    }

    pub fn heal(&self) {
        self.error.set(None);
    }

    pub fn begins(&self) -> u32 {
        self.begins.get()
    }

    /// Total `value()` calls across every channel
    pub fn reads(&self) -> u32 {
        self.reads.get()
    }

    pub fn pre_calls(&self) -> u32 {
        self.pre.get()
    }

    pub fn post_calls(&self) -> u32 {
        self.post.get()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks.get()
    }
}

/// Source whose channels return whatever the handle last set
pub struct FakeSource {
    name: &'static str,
    channels: Vec<(MagnitudeKind, Unit)>,
    ready_after: u32,
    ready: bool,
    decimals: Option<u8>,
    handle: SourceHandle,
}

impl FakeSource {
    pub fn new(name: &'static str, channels: &[(MagnitudeKind, Unit)]) -> (Self, SourceHandle) {
        let handle = SourceHandle::default();
        *handle.values.borrow_mut() = vec![0.0; channels.len()];

        let source = Self {
            name,
            channels: channels.to_vec(),
            ready_after: 1,
            ready: false,
            decimals: None,
            handle: handle.clone(),
        };
        (source, handle)
    }

    /// Single temperature channel in Celsius
    pub fn thermometer() -> (Self, SourceHandle) {
        Self::new("Thermometer", &[(MagnitudeKind::Temperature, Unit::Celsius)])
    }

    /// Temperature and humidity
    pub fn climate() -> (Self, SourceHandle) {
        Self::new(
            "Climate",
            &[
                (MagnitudeKind::Temperature, Unit::Celsius),
                (MagnitudeKind::Humidity, Unit::Percentage),
            ],
        )
    }

    /// Becomes ready on the `attempts`th `begin()`; zero never does
    pub fn ready_after(mut self, attempts: u32) -> Self {
        self.ready_after = attempts;
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }
}

impl MeasurementSource for FakeSource {
    fn begin(&mut self, _resources: &mut Resources) {
        let begins = self.handle.begins.get() + 1;
        self.handle.begins.set(begins);
        self.ready = self.ready_after > 0 && begins >= self.ready_after;
        if !self.ready {
            self.handle.error.set(Some(SensorError::NotReady));
        } else if self.handle.error.get() == Some(SensorError::NotReady) {
            self.handle.error.set(None);
        }
    }

    fn ready(&self) -> bool {
        self.ready
    }

    fn error(&self) -> Option<SensorError> {
        self.handle.error.get()
    }

    fn count(&self) -> usize {
        self.channels.len()
    }

    fn kind(&self, channel: usize) -> MagnitudeKind {
        self.channels[channel].0
    }

    fn units(&self, channel: usize) -> Unit {
        self.channels[channel].1
    }

    fn value(&mut self, channel: usize) -> f64 {
        self.handle.reads.set(self.handle.reads.get() + 1);
        self.handle.values.borrow()[channel]
    }

    fn decimals(&self, _unit: Unit) -> Option<u8> {
        self.decimals
    }

    fn pre(&mut self) {
        self.handle.pre.set(self.handle.pre.get() + 1);
    }

    fn post(&mut self) {
        self.handle.post.set(self.handle.post.get() + 1);
    }

    fn tick(&mut self) {
        self.handle.ticks.set(self.handle.ticks.get() + 1);
    }

    fn description(&self) -> &str {
        self.name
    }
}

// ===== ENERGY METER =====

/// Shared view of a [`FakeMeter`]
#[derive(Clone)]
pub struct MeterHandle {
    power: Rc<Cell<f64>>,
    energy: Rc<Cell<Energy>>,
    ratios: Rc<Cell<[f64; 4]>>,
    resets: Rc<Cell<u32>>,
}

impl MeterHandle {
    /// Raw power before the power ratio
    pub fn set_power(&self, watts: f64) {
        self.power.set(watts);
    }

    /// Adds consumed energy to the running total
    pub fn consume(&self, ws: u32) {
        self.energy.set(self.energy.get() + ws);
    }

    pub fn energy(&self) -> Energy {
        self.energy.get()
    }

    pub fn ratio(&self, kind: RatioKind) -> f64 {
        self.ratios.get()[ratio_slot(kind)]
    }

    /// `reset_energy()` calls
    pub fn resets(&self) -> u32 {
        self.resets.get()
    }
}

fn ratio_slot(kind: RatioKind) -> usize {
    match kind {
        RatioKind::Current => 0,
        RatioKind::Voltage => 1,
        RatioKind::Power => 2,
        RatioKind::Energy => 3,
    }
}

/// Power meter with one active power and one energy channel
pub struct FakeMeter {
    handle: MeterHandle,
}

impl FakeMeter {
    pub const DEFAULT_RATIO: f64 = 1.0;

    pub fn new() -> (Self, MeterHandle) {
        let handle = MeterHandle {
            power: Rc::new(Cell::new(0.0)),
            energy: Rc::new(Cell::new(Energy::ZERO)),
            ratios: Rc::new(Cell::new([Self::DEFAULT_RATIO; 4])),
            resets: Rc::new(Cell::new(0)),
        };
        (Self { handle: handle.clone() }, handle)
    }
}

impl MeasurementSource for FakeMeter {
    fn begin(&mut self, _resources: &mut Resources) {}

    fn ready(&self) -> bool {
        true
    }

    fn error(&self) -> Option<SensorError> {
        None
    }

    fn count(&self) -> usize {
        2
    }

    fn kind(&self, channel: usize) -> MagnitudeKind {
        match channel {
            0 => MagnitudeKind::PowerActive,
            _ => MagnitudeKind::Energy,
        }
    }

    fn units(&self, channel: usize) -> Unit {
        match channel {
            0 => Unit::Watt,
            _ => Unit::WattSecond,
        }
    }

    fn value(&mut self, channel: usize) -> f64 {
        match channel {
            0 => self.handle.power.get() * self.handle.ratio(RatioKind::Power),
            _ => self.handle.energy.get().as_watt_seconds() as f64,
        }
    }

    fn description(&self) -> &str {
        "FakeMeter"
    }

    fn meter(&self) -> Option<&dyn EnergyMeter> {
        Some(self)
    }

    fn meter_mut(&mut self) -> Option<&mut dyn EnergyMeter> {
        Some(self)
    }
}

impl EnergyMeter for FakeMeter {
    fn energy_count(&self) -> usize {
        1
    }

    fn total_energy(&self, _index: usize) -> Energy {
        self.handle.energy.get()
    }

    fn reset_energy(&mut self, _index: usize, energy: Energy) {
        self.handle.resets.set(self.handle.resets.get() + 1);
        self.handle.energy.set(energy);
    }

    fn ratio(&self, kind: RatioKind, _index: usize) -> f64 {
        self.handle.ratio(kind)
    }

    fn default_ratio(&self, _kind: RatioKind) -> f64 {
        Self::DEFAULT_RATIO
    }

    fn set_ratio(&mut self, kind: RatioKind, _index: usize, value: f64) {
        let mut ratios = self.handle.ratios.get();
        ratios[ratio_slot(kind)] = value;
        self.handle.ratios.set(ratios);
    }

    fn calibrate(&mut self, kind: RatioKind, _index: usize, expected: f64) -> SensorResult<f64> {
        if kind != RatioKind::Power {
            return Err(SensorError::Unsupported);
        }

        let raw = self.handle.power.get();
        if raw <= 0.0 {
            return Err(SensorError::Calibration);
        }

        let ratio = expected / raw;
        self.set_ratio(kind, 0, ratio);
        Ok(ratio)
    }
}

/// Current clamp that reports the configured mains voltage
pub struct MainsClamp {
    voltage: Rc<Cell<f64>>,
}

impl MainsClamp {
    pub const DEFAULT_VOLTAGE: f64 = 230.0;

    pub fn new() -> (Self, Rc<Cell<f64>>) {
        let voltage = Rc::new(Cell::new(0.0));
        (Self { voltage: voltage.clone() }, voltage)
    }
}

impl MeasurementSource for MainsClamp {
    fn begin(&mut self, _resources: &mut Resources) {}

    fn ready(&self) -> bool {
        true
    }

    fn error(&self) -> Option<SensorError> {
        None
    }

    fn count(&self) -> usize {
        2
    }

    fn kind(&self, channel: usize) -> MagnitudeKind {
        match channel {
            0 => MagnitudeKind::Current,
            _ => MagnitudeKind::Voltage,
        }
    }

    fn units(&self, channel: usize) -> Unit {
        match channel {
            0 => Unit::Ampere,
            _ => Unit::Volt,
        }
    }

    fn value(&mut self, channel: usize) -> f64 {
        match channel {
            0 => 1.0,
            _ => self.voltage.get(),
        }
    }

    fn description(&self) -> &str {
        "MainsClamp"
    }

    fn meter(&self) -> Option<&dyn EnergyMeter> {
        Some(self)
    }

    fn meter_mut(&mut self) -> Option<&mut dyn EnergyMeter> {
        Some(self)
    }
}

impl EnergyMeter for MainsClamp {
    fn energy_count(&self) -> usize {
        0
    }

    fn total_energy(&self, _index: usize) -> Energy {
        Energy::ZERO
    }

    fn reset_energy(&mut self, _index: usize, _energy: Energy) {}

    fn ratio(&self, _kind: RatioKind, _index: usize) -> f64 {
        1.0
    }

    fn default_ratio(&self, _kind: RatioKind) -> f64 {
        1.0
    }

    fn set_ratio(&mut self, _kind: RatioKind, _index: usize, _value: f64) {}

    fn default_voltage(&self) -> Option<f64> {
        Some(Self::DEFAULT_VOLTAGE)
    }

    fn set_voltage(&mut self, _index: usize, voltage: f64) {
        self.voltage.set(voltage);
    }
}

// ===== BUS ATTACHED SOURCE =====

/// BME280-like source that claims its address through the shared arbiter
pub struct BusSource {
    bus: harness::Devices,
    requested: Option<u8>,
    address: Option<u8>,
    error: Option<SensorError>,
    claimed: Rc<Cell<Option<u8>>>,
}

impl BusSource {
    pub const CANDIDATES: &'static [u8] = &[0x76, 0x77];

    /// Returns the source and a view of the address it ended up with
    pub fn new(bus: harness::Devices, requested: Option<u8>) -> (Self, Rc<Cell<Option<u8>>>) {
        let claimed = Rc::new(Cell::new(None));
        let source = Self {
            bus,
            requested,
            address: None,
            error: None,
            claimed: claimed.clone(),
        };
        (source, claimed)
    }
}

impl MeasurementSource for BusSource {
    fn begin(&mut self, resources: &mut Resources) {
        match resources
            .bus
            .reclaim(&mut self.bus, self.address, self.requested, Self::CANDIDATES)
        {
            Ok(address) => {
                self.address = Some(address);
                self.error = None;
            }
            Err(error) => {
                self.address = None;
                self.error = Some(error);
            }
        }
        self.claimed.set(self.address);
    }

    fn ready(&self) -> bool {
        self.address.is_some()
    }

    fn error(&self) -> Option<SensorError> {
        self.error
    }

    fn count(&self) -> usize {
        1
    }

    fn kind(&self, _channel: usize) -> MagnitudeKind {
        MagnitudeKind::Pressure
    }

    fn units(&self, _channel: usize) -> Unit {
        Unit::Hectopascal
    }

    fn value(&mut self, _channel: usize) -> f64 {
        1013.25
    }

    fn description(&self) -> &str {
        "BusSource"
    }
}

// ===== OBSERVER =====

/// Which hook fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Read,
    Report,
}

/// One observed event
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub event: EventKind,
    pub index: usize,
    pub topic: String,
    pub value: f64,
    pub formatted: String,
}

/// Observer that keeps every event
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Observed>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: EventKind, index: usize, value: &ProducedValue) {
        self.events.borrow_mut().push(Observed {
            event,
            index,
            topic: value.topic.as_str().to_string(),
            value: value.value,
            formatted: value.formatted.as_str().to_string(),
        });
    }

    pub fn events(&self) -> Vec<Observed> {
        self.events.borrow().clone()
    }

    /// Values of `event` for magnitude `index`, in order
    pub fn values(&self, event: EventKind, index: usize) -> Vec<f64> {
        self.events
            .borrow()
            .iter()
            .filter(|observed| observed.event == event && observed.index == index)
            .map(|observed| observed.value)
            .collect()
    }

    pub fn reports(&self, index: usize) -> Vec<f64> {
        self.values(EventKind::Report, index)
    }

    pub fn reads(&self, index: usize) -> Vec<f64> {
        self.values(EventKind::Read, index)
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl MagnitudeObserver for Recorder {
    fn on_read(&mut self, index: usize, value: &ProducedValue) {
        self.push(EventKind::Read, index, value);
    }

    fn on_report(&mut self, index: usize, value: &ProducedValue) {
        self.push(EventKind::Report, index, value);
    }
}
