//! GPIO Ownership and Interrupt Routing
//!
//! ## Overview
//!
//! Pins are a shared resource just like bus addresses: two drivers must never
//! configure the same pin. [`GpioLocks`] is the pin counterpart of the bus
//! lock table and is handed to every source's `begin()`.
//!
//! Pulse and event sources (energy meters counting LED blinks, Geiger tubes,
//! door contacts) are driven by edge interrupts. The handler runs in a
//! separate, non-reentrant context, so it must not touch anything the
//! scheduler owns. [`InterruptRouter`] gives each attached pin a slot of
//! atomics; the handler only bumps a counter and raises a pending flag, and
//! the scheduler side collects the counts on its next tick.
//!
//! ```text
//! edge IRQ ──► on_edge(pin, now) ──► slot[pin % N] { count += 1, pending }
//!                                             │
//! scheduler tick ──► drain(|pin, count| ...) ◄┘
//! ```
//!
//! ## Targets without compare-and-swap
//!
//! The slots use `portable-atomic`; enable the `single-core` feature on
//! targets lacking native CAS so the atomics fall back to critical sections.

use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::errors::{SensorError, SensorResult};

/// Highest pin number tracked by [`GpioLocks`], exclusive
pub const GPIO_PINS: u8 = 64;

/// Pin ownership table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpioLocks {
    locks: u64,
}

impl GpioLocks {
    /// Creates a table with every pin free
    pub const fn new() -> Self {
        Self { locks: 0 }
    }

    /// Claims `pin`
    pub fn lock(&mut self, pin: u8) -> SensorResult<()> {
        if pin >= GPIO_PINS {
            return Err(SensorError::Config);
        }

        let bit = 1u64 << pin;
        if self.locks & bit != 0 {
            sns_warn!("[GPIO] GPIO{} is already in use", pin);
            return Err(SensorError::GpioAlreadyUsed);
        }

        self.locks |= bit;
        Ok(())
    }

    /// Releases `pin`
    pub fn unlock(&mut self, pin: u8) {
        if pin < GPIO_PINS {
            self.locks &= !(1u64 << pin);
        }
    }

    /// Whether `pin` is held
    pub fn is_locked(&self, pin: u8) -> bool {
        pin < GPIO_PINS && self.locks & (1u64 << pin) != 0
    }
}

const UNBOUND: u8 = u8::MAX;

struct Slot {
    pin: AtomicU8,
    debounce: AtomicU32,
    last: AtomicU32,
    seen: AtomicBool,
    count: AtomicU32,
    pending: AtomicBool,
}

impl Slot {
    const fn new() -> Self {
        Self {
            pin: AtomicU8::new(UNBOUND),
            debounce: AtomicU32::new(0),
            last: AtomicU32::new(0),
            seen: AtomicBool::new(false),
            count: AtomicU32::new(0),
            pending: AtomicBool::new(false),
        }
    }

    fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.seen.store(false, Ordering::Relaxed);
        self.pending.store(false, Ordering::Release);
    }
}

/// Bounded pin-to-slot table shared with the interrupt handler
///
/// Pin `p` always lands in slot `p % N`. Usually a `static`:
///
/// ```
/// use senseloop_core::gpio::InterruptRouter;
///
/// static ROUTER: InterruptRouter<8> = InterruptRouter::new();
///
/// ROUTER.attach(4, 50).unwrap();
/// ROUTER.on_edge(4, 1_000);
/// assert_eq!(ROUTER.take(4), 1);
/// ```
pub struct InterruptRouter<const N: usize> {
    slots: [Slot; N],
}

impl<const N: usize> InterruptRouter<N> {
    /// Creates a router with every slot free
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const EMPTY: Slot = Slot::new();
        Self { slots: [EMPTY; N] }
    }

    fn slot(&self, pin: u8) -> Option<&Slot> {
        if N == 0 {
            return None;
        }
        self.slots.get(pin as usize % N)
    }

    /// Binds `pin` to its slot. Edges closer than `debounce` ticks to the
    /// previous accepted edge are ignored.
    ///
    /// Re-attaching a bound pin only updates the debounce.
    pub fn attach(&self, pin: u8, debounce: u32) -> SensorResult<()> {
        if pin == UNBOUND {
            return Err(SensorError::Config);
        }

        let slot = self.slot(pin).ok_or(SensorError::Config)?;
        match slot.pin.compare_exchange(UNBOUND, pin, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => slot.clear(),
            Err(current) if current == pin => {}
            Err(current) => {
                sns_warn!("[GPIO] GPIO{} slot is taken by GPIO{}", pin, current);
                return Err(SensorError::GpioAlreadyUsed);
            }
        }

        slot.debounce.store(debounce, Ordering::Relaxed);
        sns_debug!("[GPIO] GPIO{} attached, debounce {}", pin, debounce);
        Ok(())
    }

    /// Unbinds `pin` and drops any uncollected edges
    pub fn detach(&self, pin: u8) {
        if let Some(slot) = self.slot(pin) {
            if slot.pin.load(Ordering::Acquire) == pin {
                slot.clear();
                slot.pin.store(UNBOUND, Ordering::Release);
            }
        }
    }

    /// Whether `pin` is bound
    pub fn is_attached(&self, pin: u8) -> bool {
        self.slot(pin)
            .is_some_and(|slot| pin != UNBOUND && slot.pin.load(Ordering::Acquire) == pin)
    }

    /// Interrupt handler side. Records one edge of `pin` at `now`
    /// (a free-running tick counter, wrapping is fine).
    pub fn on_edge(&self, pin: u8, now: u32) {
        let Some(slot) = self.slot(pin) else {
            return;
        };

        if slot.pin.load(Ordering::Acquire) != pin {
            return;
        }

        let debounce = slot.debounce.load(Ordering::Relaxed);
        let last = slot.last.load(Ordering::Relaxed);
        if slot.seen.load(Ordering::Relaxed) && now.wrapping_sub(last) < debounce {
            return;
        }

        slot.last.store(now, Ordering::Relaxed);
        slot.seen.store(true, Ordering::Relaxed);
        slot.count.fetch_add(1, Ordering::Relaxed);
        slot.pending.store(true, Ordering::Release);
    }

    /// Collects the edge count of `pin` since the previous collection
    pub fn take(&self, pin: u8) -> u32 {
        match self.slot(pin) {
            Some(slot) if slot.pin.load(Ordering::Acquire) == pin => {
                slot.pending.store(false, Ordering::Release);
                slot.count.swap(0, Ordering::AcqRel)
            }
            _ => 0,
        }
    }

    /// Calls `callback(pin, count)` for every slot with uncollected edges
    pub fn drain<F: FnMut(u8, u32)>(&self, mut callback: F) {
        for slot in &self.slots {
            if !slot.pending.swap(false, Ordering::AcqRel) {
                continue;
            }

            let pin = slot.pin.load(Ordering::Acquire);
            let count = slot.count.swap(0, Ordering::AcqRel);
            if pin != UNBOUND && count > 0 {
                callback(pin, count);
            }
        }
    }
}

impl<const N: usize> Default for InterruptRouter<N> {
    fn default() -> Self {
        Self::new()
    }
}
