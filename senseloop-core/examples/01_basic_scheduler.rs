//! Basic Scheduler Example
//!
//! This example wires one simulated climate sensor into the scheduler and
//! prints every reading and report it produces.
//!
//! ## What You'll Learn
//!
//! - Implementing `MeasurementSource` for a sensor driver
//! - Attaching an observer for read and report events
//! - Driving the scheduler from a main loop
//! - Tuning behavior through settings keys
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_basic_scheduler
//! ```

use senseloop_core::{
    time::Interval, FixedTime, MagnitudeKind, MagnitudeObserver, MeasurementSource, MemorySettings,
    ProducedValue, Resources, Scheduler, SensorConfig, SensorError, Services, SettingsStore, Unit,
};

/// Simulated sensor drifting slowly upwards
struct Climate {
    ready: bool,
    step: u32,
}

impl MeasurementSource for Climate {
    fn begin(&mut self, _resources: &mut Resources) {
        self.ready = true;
    }

    fn ready(&self) -> bool {
        self.ready
    }

    fn error(&self) -> Option<SensorError> {
        None
    }

    fn count(&self) -> usize {
        2
    }

    fn kind(&self, channel: usize) -> MagnitudeKind {
        match channel {
            0 => MagnitudeKind::Temperature,
            _ => MagnitudeKind::Humidity,
        }
    }

    fn units(&self, channel: usize) -> Unit {
        match channel {
            0 => Unit::Celsius,
            _ => Unit::Percentage,
        }
    }

    fn pre(&mut self) {
        self.step += 1;
    }

    fn value(&mut self, channel: usize) -> f64 {
        match channel {
            0 => 20.0 + self.step as f64 * 0.13,
            _ => 45.0 + (self.step % 4) as f64,
        }
    }

    fn description(&self) -> &str {
        "Simulated climate sensor"
    }
}

/// Prints everything it sees
struct Console;

impl MagnitudeObserver for Console {
    fn on_read(&mut self, _index: usize, value: &ProducedValue) {
        println!("  read    {:<12} {}{}", value.topic.as_str(), value.formatted.as_str(), value.units.symbol());
    }

    fn on_report(&mut self, _index: usize, value: &ProducedValue) {
        println!("  REPORT  {:<12} {}{}", value.topic.as_str(), value.formatted.as_str(), value.units.symbol());
    }
}

fn main() -> Result<(), SensorError> {
    println!("Senseloop Basic Scheduler Example");
    println!("=================================\n");

    // Report every 3 reads, temperature in Fahrenheit, and only when it
    // moved by at least half a degree
    let mut settings = MemorySettings::new();
    settings.set("snsReport", "3")?;
    settings.set("tmpUnits0", "3")?;
    settings.set("tmpMinDelta0", "0.5")?;

    let config = SensorConfig::default().with_read_interval(Interval::millis(1_000));
    let mut scheduler = Scheduler::new(config);
    scheduler.add_source(Box::new(Climate { ready: false, step: 0 }))?;
    scheduler.add_observer(Box::new(Console))?;

    // Simulated clock, one tick per second
    let mut clock = FixedTime::new(0);
    let mut services = Services::new(&mut settings);
    for second in 0..12u64 {
        println!("t={:>2}s state={:?}", second, scheduler.state());
        scheduler.run(&clock, &mut services);
        clock.advance(1_000);
    }

    println!("\nFinal values:");
    for (index, magnitude) in scheduler.registry().iter().enumerate() {
        println!(
            "  {:<12} last={:.2} reported={:.2}",
            magnitude.kind(),
            magnitude.last(),
            scheduler.value(index).unwrap_or(f64::NAN)
        );
    }

    Ok(())
}
