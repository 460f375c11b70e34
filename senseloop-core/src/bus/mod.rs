//! Shared Two-Wire Bus Arbitration
//!
//! ## Overview
//!
//! Several sources may sit on one two-wire bus, and several drivers may be
//! able to talk to the same address (a humidity driver and a pressure driver
//! both probing 0x76). The [`BusArbiter`] keeps a lock table covering the
//! whole 7-bit address space so that each address has at most one owning
//! source:
//!
//! ```text
//! locks: [u32; 4]
//!         word 0      word 1      word 2      word 3
//!        0x00..0x1F  0x20..0x3F  0x40..0x5F  0x60..0x7F
//! ```
//!
//! Drivers claim an address during `begin()` either explicitly
//! ([`BusArbiter::lock`]) or by auto-discovery over a list of candidate
//! addresses ([`BusArbiter::find_and_lock`]). Presence is detected with a
//! zero-length write, which any device acknowledges when it recognizes its
//! address.
//!
//! ## Recovery
//!
//! A peripheral that lost power or was reset mid-transfer may keep the data
//! line low forever. [`recovery::clear_bus`] bit-bangs the lines to release
//! it; see that module for the exact sequence.

use embedded_hal::i2c::I2c;

use crate::constants::bus::{ADDRESS_SPACE, SCAN_ADDRESS_MAX, SCAN_ADDRESS_MIN};
use crate::errors::{SensorError, SensorResult};

pub mod recovery;

pub use recovery::{clear_bus, RecoveryError};

const WORDS: usize = ADDRESS_SPACE / 32;

/// Addresses found by a bus scan
pub type ScanResult = heapless::Vec<u8, ADDRESS_SPACE>;

/// Checks whether a device acknowledges `address`
pub fn probe<B: I2c>(bus: &mut B, address: u8) -> bool {
    bus.write(address, &[]).is_ok()
}

/// Lock table for the 7-bit address space
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusArbiter {
    locks: [u32; WORDS],
}

impl BusArbiter {
    /// Creates an arbiter with every address free
    pub const fn new() -> Self {
        Self { locks: [0; WORDS] }
    }

    fn slot(address: u8) -> Option<(usize, u32)> {
        let address = address as usize;
        if address >= ADDRESS_SPACE {
            return None;
        }
        Some((address / 32, 1 << (address % 32)))
    }

    /// Whether `address` is held by some source
    pub fn is_locked(&self, address: u8) -> bool {
        match Self::slot(address) {
            Some((word, bit)) => self.locks[word] & bit != 0,
            None => false,
        }
    }

    /// Claims `address`. Returns `false` when it is already held or lies
    /// outside the 7-bit space.
    pub fn lock(&mut self, address: u8) -> bool {
        match Self::slot(address) {
            Some((word, bit)) if self.locks[word] & bit == 0 => {
                self.locks[word] |= bit;
                sns_debug!("[I2C] Locked 0x{:02X}", address);
                true
            }
            _ => false,
        }
    }

    /// Releases `address` unconditionally
    pub fn unlock(&mut self, address: u8) {
        if let Some((word, bit)) = Self::slot(address) {
            self.locks[word] &= !bit;
        }
    }

    /// Held addresses in ascending order
    pub fn locked(&self) -> impl Iterator<Item = u8> + '_ {
        (0..ADDRESS_SPACE as u8).filter(move |address| self.is_locked(*address))
    }

    /// Probes `candidates` in order and claims the first one that answers
    /// and is not already held
    ///
    /// Returns `None` when no candidate could be claimed; drivers map that to
    /// [`SensorError::UnknownId`].
    pub fn find_and_lock<B: I2c>(&mut self, bus: &mut B, candidates: &[u8]) -> Option<u8> {
        for &address in candidates {
            if self.is_locked(address) {
                continue;
            }

            if probe(bus, address) && self.lock(address) {
                return Some(address);
            }
        }

        None
    }

    /// Lists every address that acknowledges, held or not
    pub fn scan<B: I2c>(&self, bus: &mut B) -> ScanResult {
        let mut found = ScanResult::new();
        for address in SCAN_ADDRESS_MIN..SCAN_ADDRESS_MAX {
            if probe(bus, address) {
                // One entry per address, never exceeds capacity
                let _ = found.push(address);
            }
        }

        sns_debug!("[I2C] Scan found {} device(s)", found.len());
        found
    }

    /// Driver-side address claim performed on every `begin()`
    ///
    /// Releases `previous` when the driver moved to another address, then
    /// claims `requested` if given, or auto-discovers one of `candidates`.
    pub fn reclaim<B: I2c>(
        &mut self,
        bus: &mut B,
        previous: Option<u8>,
        requested: Option<u8>,
        candidates: &[u8],
    ) -> SensorResult<u8> {
        if let Some(previous) = previous {
            if requested == Some(previous) {
                return Ok(previous);
            }
            self.unlock(previous);
        }

        match requested {
            Some(address) => {
                if self.lock(address) {
                    Ok(address)
                } else {
                    sns_warn!("[I2C] Address 0x{:02X} already in use", address);
                    Err(SensorError::BusError)
                }
            }
            None => self.find_and_lock(bus, candidates).ok_or(SensorError::UnknownId),
        }
    }
}
