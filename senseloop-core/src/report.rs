//! Produced values and their consumers
//!
//! Every processed reading leaves the core as a [`ProducedValue`]. Consumers
//! (network publishers, displays, loggers) implement [`MagnitudeObserver`]
//! and are attached to the scheduler; they see a `read` event for every raw
//! sample and a `report` event whenever a filtered value passes the delta
//! thresholds.

use core::fmt::Write;

use crate::constants::buffers::{FORMATTED_LEN, TOPIC_LEN};
use crate::magnitude::MagnitudeKind;
use crate::units::Unit;

/// Topic of a produced value, `"<name>"` or `"<name>/<index>"`
pub type Topic = heapless::String<TOPIC_LEN>;

/// Value rendered with the magnitude's decimals
pub type Formatted = heapless::String<FORMATTED_LEN>;

/// A processed reading handed to consumers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProducedValue {
    /// Semantic type
    pub kind: MagnitudeKind,
    /// Nth magnitude of that type
    pub index_global: usize,
    /// Output unit
    pub units: Unit,
    /// Digits after the decimal point
    pub decimals: u8,
    /// Publishing topic
    pub topic: Topic,
    /// Numeric value, already rounded
    pub value: f64,
    /// Textual value
    pub formatted: Formatted,
}

impl ProducedValue {
    /// Builds the record, rendering topic and text
    pub fn new(
        kind: MagnitudeKind,
        index_global: usize,
        units: Unit,
        decimals: u8,
        value: f64,
        with_index: bool,
    ) -> Self {
        Self {
            kind,
            index_global,
            units,
            decimals,
            topic: topic(kind, index_global, with_index),
            value,
            formatted: format_value(value, decimals),
        }
    }
}

/// Builds the topic of a magnitude
pub fn topic(kind: MagnitudeKind, index_global: usize, with_index: bool) -> Topic {
    let mut topic = Topic::new();
    // The longest name plus a two digit index fits
    let _ = topic.push_str(kind.topic());
    if with_index {
        let _ = write!(topic, "/{}", index_global);
    }
    topic
}

/// Renders `value` with exactly `decimals` digits after the point
///
/// Values too large for the buffer come out truncated.
pub fn format_value(value: f64, decimals: u8) -> Formatted {
    let mut text = Formatted::new();
    if write!(text, "{:.*}", decimals as usize, value).is_err() {
        sns_debug!("[SENSOR] Formatted value truncated");
    }
    text
}

/// Consumer of read and report events
///
/// Both hooks default to doing nothing, implement the ones you need.
pub trait MagnitudeObserver {
    /// A raw sample was read and processed
    fn on_read(&mut self, _index: usize, _value: &ProducedValue) {}

    /// A filtered value was reported
    fn on_report(&mut self, _index: usize, _value: &ProducedValue) {}
}
