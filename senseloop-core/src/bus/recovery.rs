//! Bit-banged bus recovery
//!
//! Both lines are open-drain: `set_low` drives the line, `set_high` releases
//! it to the pull-up so a peripheral may still hold it low. The sequence:
//!
//! 1. Release both lines and let them settle.
//! 2. Clock already low: nothing we can do, [`RecoveryError::ClockHeldLow`].
//! 3. While data is low, pulse the clock (at most
//!    [`RECOVERY_CLOCK_PULSES`] times, more than two full bytes). After each
//!    pulse the peripheral may stretch the clock; it gets
//!    `RECOVERY_STRETCH_POLLS * RECOVERY_STRETCH_POLL_MS` to release it or
//!    the sequence ends with [`RecoveryError::ClockStretched`].
//! 4. Data still low: [`RecoveryError::DataHeldLow`].
//! 5. Send START then STOP so every peripheral resets its state machine.
//!
//! Every wait is bounded, the whole procedure blocks for at most a few
//! seconds.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use thiserror_no_std::Error;

use crate::constants::bus::{
    RECOVERY_CLOCK_PULSES, RECOVERY_HALF_PERIOD_US, RECOVERY_SETTLE_MS, RECOVERY_STRETCH_POLLS,
    RECOVERY_STRETCH_POLL_MS,
};
use crate::errors::SensorError;

/// Why the bus could not be cleared
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecoveryError {
    /// Clock line was low before we started
    #[error("SCL held low")]
    ClockHeldLow = 1,

    /// A peripheral stretched the clock past the deadline
    #[error("SCL held low by clock stretch")]
    ClockStretched = 2,

    /// Data line still low after every clock pulse
    #[error("SDA held low")]
    DataHeldLow = 3,

    /// A pin could not be read or driven
    #[error("Pin error")]
    Pin = 4,
}

impl RecoveryError {
    /// Numeric status, `0` being reserved for success
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<RecoveryError> for SensorError {
    fn from(_: RecoveryError) -> Self {
        SensorError::BusError
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RecoveryError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "RecoveryError({=u8})", self.code())
    }
}

fn is_low<P: InputPin>(pin: &mut P) -> Result<bool, RecoveryError> {
    pin.is_low().map_err(|_| RecoveryError::Pin)
}

fn drive<P: OutputPin>(pin: &mut P, low: bool) -> Result<(), RecoveryError> {
    let result = if low { pin.set_low() } else { pin.set_high() };
    result.map_err(|_| RecoveryError::Pin)
}

/// Tries to release a stuck bus
///
/// `sda` and `scl` must be configured open-drain with pull-ups, and the bus
/// peripheral must not be driving them.
pub fn clear_bus<SDA, SCL, D>(sda: &mut SDA, scl: &mut SCL, delay: &mut D) -> Result<(), RecoveryError>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    drive(sda, false)?;
    drive(scl, false)?;
    delay.delay_ms(RECOVERY_SETTLE_MS);

    if is_low(scl)? {
        sns_warn!("[I2C] Could not clear, SCL held low");
        return Err(RecoveryError::ClockHeldLow);
    }

    let mut sda_low = is_low(sda)?;
    let mut pulses = RECOVERY_CLOCK_PULSES;

    while sda_low && pulses > 0 {
        pulses -= 1;

        drive(scl, true)?;
        delay.delay_us(RECOVERY_HALF_PERIOD_US);
        drive(scl, false)?;
        delay.delay_us(RECOVERY_HALF_PERIOD_US);

        let mut scl_low = is_low(scl)?;
        let mut polls = RECOVERY_STRETCH_POLLS;
        while scl_low && polls > 0 {
            polls -= 1;
            delay.delay_ms(RECOVERY_STRETCH_POLL_MS);
            scl_low = is_low(scl)?;
        }

        if scl_low {
            sns_warn!("[I2C] Could not clear, SCL held low by clock stretch");
            return Err(RecoveryError::ClockStretched);
        }

        sda_low = is_low(sda)?;
    }

    if sda_low {
        sns_warn!("[I2C] Could not clear, SDA held low");
        return Err(RecoveryError::DataHeldLow);
    }

    // START (data falls while clock is high) then STOP (data rises)
    drive(sda, true)?;
    delay.delay_us(RECOVERY_HALF_PERIOD_US);
    drive(sda, false)?;
    delay.delay_us(RECOVERY_HALF_PERIOD_US);

    sns_info!("[I2C] Bus cleared");
    Ok(())
}
