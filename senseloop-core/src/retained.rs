//! Retained Energy Memory
//!
//! A small memory region that survives soft resets and deep sleep but not
//! power loss (RTC memory on most targets). Energy totals are written there
//! on every read, far more often than flash could tolerate, so a watchdog
//! reset loses nothing.
//!
//! ## Layout
//!
//! ```text
//! RetainedBlock<N>
//! ┌────────────┬───────────────────────────────┬──────────────┐
//! │ magic: u32 │ energy: [(kwh, ws): u32x2; N] │ checksum: u32│
//! └────────────┴───────────────────────────────┴──────────────┘
//! ```
//!
//! After power loss the region holds garbage. A block whose magic or
//! checksum does not match reads as empty, and the counters start again
//! from the settings store or zero.

use crate::energy::Energy;

/// Storage for per-magnitude energy totals surviving soft resets
pub trait RetainedEnergy {
    /// Stored total of energy magnitude `index`, `None` when the slot is out
    /// of range or the memory content is not valid
    fn energy(&self, index: usize) -> Option<Energy>;

    /// Stores the total of energy magnitude `index`. Out of range slots are
    /// ignored.
    fn set_energy(&mut self, index: usize, energy: Energy);

    /// Clears the total of energy magnitude `index`
    fn reset_energy(&mut self, index: usize) {
        self.set_energy(index, Energy::ZERO);
    }

    /// Number of slots
    fn capacity(&self) -> usize;
}

/// Identifies an initialized block
pub const RETAINED_MAGIC: u32 = 0x534E_5331;

/// Fixed-layout retained block with `N` energy slots
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct RetainedBlock<const N: usize> {
    magic: u32,
    energy: [[u32; 2]; N],
    checksum: u32,
}

impl<const N: usize> RetainedBlock<N> {
    /// Creates a valid, zeroed block
    pub const fn new() -> Self {
        let mut block = Self {
            magic: RETAINED_MAGIC,
            energy: [[0; 2]; N],
            checksum: 0,
        };
        block.checksum = block.compute_checksum();
        block
    }

    /// Reinterprets raw words read back from retained memory
    pub const fn from_raw(magic: u32, energy: [[u32; 2]; N], checksum: u32) -> Self {
        Self { magic, energy, checksum }
    }

    /// Raw words to write into retained memory
    pub const fn to_raw(&self) -> (u32, [[u32; 2]; N], u32) {
        (self.magic, self.energy, self.checksum)
    }

    // Rotate-xor over every word, seeded so that an all-zero block is invalid
    const fn compute_checksum(&self) -> u32 {
        let mut sum = self.magic ^ 0xA5A5_A5A5;
        let mut i = 0;
        while i < N {
            sum = sum.rotate_left(5) ^ self.energy[i][0];
            sum = sum.rotate_left(5) ^ self.energy[i][1];
            i += 1;
        }
        sum
    }

    /// Whether magic and checksum match
    pub const fn is_valid(&self) -> bool {
        self.magic == RETAINED_MAGIC && self.checksum == self.compute_checksum()
    }

    /// Resets every slot and makes the block valid
    pub fn format(&mut self) {
        *self = Self::new();
    }
}

impl<const N: usize> Default for RetainedBlock<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RetainedEnergy for RetainedBlock<N> {
    fn energy(&self, index: usize) -> Option<Energy> {
        if !self.is_valid() {
            return None;
        }

        self.energy.get(index).map(|[kwh, ws]| Energy::new(*kwh, *ws))
    }

    fn set_energy(&mut self, index: usize, energy: Energy) {
        if index >= N {
            return;
        }

        if !self.is_valid() {
            sns_info!("[SENSOR] Retained memory invalid, formatting");
            self.format();
        }

        self.energy[index] = [energy.kwh(), energy.ws()];
        self.checksum = self.compute_checksum();
    }

    fn capacity(&self) -> usize {
        N
    }
}
