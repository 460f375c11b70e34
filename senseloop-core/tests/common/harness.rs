//! Hardware doubles for bus tests
//!
//! Provides:
//! - [`Devices`]: a two-wire bus where a fixed set of addresses acknowledge
//! - [`BusLines`] / [`OpenDrain`]: SDA and SCL lines that a stuck peripheral
//!   can hold low, releasing after a number of clock pulses
//! - [`CountingDelay`]: a delay that only adds up requested time

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::i2c::{self, I2c, NoAcknowledgeSource, Operation};

// ===== I2C =====

/// Bus with the given devices present
#[derive(Clone)]
pub struct Devices {
    present: Vec<u8>,
    probes: Rc<Cell<u32>>,
}

impl Devices {
    pub fn new(present: &[u8]) -> Self {
        Self {
            present: present.to_vec(),
            probes: Rc::new(Cell::new(0)),
        }
    }

    /// Transactions seen so far, shared between clones
    pub fn probes(&self) -> u32 {
        self.probes.get()
    }
}

impl i2c::ErrorType for Devices {
    type Error = i2c::ErrorKind;
}

impl I2c for Devices {
    fn transaction(&mut self, address: u8, _operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.probes.set(self.probes.get() + 1);
        if self.present.contains(&address) {
            Ok(())
        } else {
            Err(i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        }
    }
}

// ===== RECOVERY LINES =====

/// State of a stuck bus shared by both lines
#[derive(Default)]
pub struct BusLines {
    /// SDA held low by a peripheral
    pub sda_held: Cell<bool>,
    /// SCL held low by a peripheral, forever
    pub scl_held: Cell<bool>,
    /// Clock pulses after which the peripheral lets SDA go; zero never
    pub release_after: Cell<u32>,
    /// Reads of SCL that come back low after each pulse
    pub stretch: Cell<u32>,
    /// Clock pulses seen
    pub pulses: Cell<u32>,
    stretch_left: Cell<u32>,
}

impl BusLines {
    pub fn idle() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// SDA held until `pulses` clock pulses went by
    pub fn data_stuck(pulses: u32) -> Rc<Self> {
        let lines = Self::default();
        lines.sda_held.set(true);
        lines.release_after.set(pulses);
        Rc::new(lines)
    }

    fn pulse(&self) {
        let pulses = self.pulses.get() + 1;
        self.pulses.set(pulses);
        if self.release_after.get() > 0 && pulses >= self.release_after.get() {
            self.sda_held.set(false);
        }
        self.stretch_left.set(self.stretch.get());
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Sda,
    Scl,
}

/// One open-drain line of a [`BusLines`]
pub struct OpenDrain {
    role: Role,
    driven: bool,
    lines: Rc<BusLines>,
}

impl OpenDrain {
    /// Returns `(sda, scl)`
    pub fn pair(lines: &Rc<BusLines>) -> (Self, Self) {
        (
            Self { role: Role::Sda, driven: false, lines: lines.clone() },
            Self { role: Role::Scl, driven: false, lines: lines.clone() },
        )
    }

    pub fn driven(&self) -> bool {
        self.driven
    }
}

impl digital::ErrorType for OpenDrain {
    type Error = digital::ErrorKind;
}

impl InputPin for OpenDrain {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        if self.driven {
            return Ok(true);
        }

        let held = match self.role {
            Role::Sda => self.lines.sda_held.get(),
            Role::Scl => {
                let left = self.lines.stretch_left.get();
                if left > 0 {
                    self.lines.stretch_left.set(left - 1);
                }
                self.lines.scl_held.get() || left > 0
            }
        };
        Ok(held)
    }
}

impl OutputPin for OpenDrain {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.driven = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        // A released clock after being driven completes a pulse
        if self.role == Role::Scl && self.driven {
            self.lines.pulse();
        }
        self.driven = false;
        Ok(())
    }
}

// ===== DELAY =====

/// Delay that records how long it was asked to wait
#[derive(Default)]
pub struct CountingDelay {
    waited_ns: u64,
}

impl CountingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waited_ms(&self) -> u64 {
        self.waited_ns / 1_000_000
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns += ns as u64;
    }
}
