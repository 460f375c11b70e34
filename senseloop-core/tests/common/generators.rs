//! Proptest strategies
//!
//! Sample streams stay inside the range real sensors produce so that sums
//! and means never lose meaning to float overflow.

use proptest::prelude::*;

use senseloop_core::constants::{KWH_LIMIT, KWH_MULTIPLIER, MAX_FILTER_CAPACITY};
use senseloop_core::Energy;

/// A physical reading, e.g. temperature or power
pub fn reading() -> impl Strategy<Value = f64> {
    -1.0e4..1.0e4f64
}

/// Between one and `MAX_FILTER_CAPACITY` readings
pub fn samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(reading(), 1..=MAX_FILTER_CAPACITY)
}

/// A window size a filter can be configured with
pub fn capacity() -> impl Strategy<Value = usize> {
    1..=MAX_FILTER_CAPACITY
}

/// A normalized total, kWh below the wrap limit
pub fn energy() -> impl Strategy<Value = Energy> {
    (0..KWH_LIMIT, 0..KWH_MULTIPLIER).prop_map(|(kwh, ws)| Energy::new(kwh, ws))
}

/// Increments a meter might add between two reads
pub fn increments() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0..(2 * KWH_MULTIPLIER), 0..32)
}
