//! Magnitudes and their Registry
//!
//! ## Overview
//!
//! A *magnitude* is one calibrated, unit-typed measurement slot bound to one
//! channel of one source. A BME280 on the bus becomes three magnitudes
//! (temperature, humidity, pressure); a three-phase power meter becomes a
//! dozen.
//!
//! ```text
//! Registry
//! ├── sources:    [Box<dyn MeasurementSource>; MAX_SOURCES]
//! ├── resources:  bus + gpio lock tables, lent to begin()
//! └── magnitudes: [Magnitude; MAX_MAGNITUDES], in discovery order
//!        │
//!        ├── source id + channel          which reading
//!        ├── kind, index_global           "temperature/1"
//!        ├── units, decimals, correction  processing
//!        ├── filter                       report window
//!        └── last, reported               history
//! ```
//!
//! ## Indices
//!
//! - `index_global`: the Nth magnitude of its kind across every source. It
//!   is assigned once at discovery and names the magnitude in settings keys
//!   and topics for the lifetime of the process.
//! - `index_local`: the Nth channel of its kind on its own source, used when
//!   talking to that source's energy meter capability.
//!
//! ## Processing
//!
//! A raw reading becomes a processed value in four steps: unit conversion
//! from the source's native unit, clamping of percentages to `0..=100`, the
//! additive correction, then rounding to the configured decimals.

pub mod kind;
mod registry;

pub use kind::MagnitudeKind;
pub use registry::{
    clear_stored_energy, store_energy, stored_energy, Magnitude, Registry, SourceId, Value,
};
