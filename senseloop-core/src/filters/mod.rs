//! Magnitude Filters
//!
//! ## Overview
//!
//! Every magnitude owns one filter. The scheduler feeds it each raw sample
//! read from the source and, when a report is due, takes the aggregated
//! [`Filter::value`] and resets the filter so the next report window starts
//! clean.
//!
//! | Filter            | Aggregate                            | Capacity      |
//! |-------------------|--------------------------------------|---------------|
//! | [`LastFilter`]    | most recent sample                   | 1             |
//! | [`MaxFilter`]     | largest sample since reset           | 1             |
//! | [`SumFilter`]     | running total since reset            | unbounded     |
//! | [`MovingAverageFilter`] | mean of the buffered samples   | report cadence|
//! | [`MedianFilter`]  | mean of sliding median-of-three      | report cadence|
//!
//! ## Storage
//!
//! The windowed filters buffer into a `heapless::Vec` sized by
//! [`MAX_FILTER_CAPACITY`], so a magnitude's memory footprint is fixed at
//! compile time regardless of the configured report cadence.
//!
//! ## Static dispatch
//!
//! [`MagnitudeFilter`] is an enum over the concrete filters rather than a
//! boxed trait object; the set of filters is closed and the registry stores
//! one per magnitude inline.

use crate::constants::MAX_FILTER_CAPACITY;

mod last;
mod max;
mod median;
mod moving_average;
mod sum;

pub use last::LastFilter;
pub use max::MaxFilter;
pub use median::MedianFilter;
pub use moving_average::MovingAverageFilter;
pub use sum::SumFilter;

/// Sample buffer shared by the windowed filters
pub(crate) type Samples = heapless::Vec<f64, MAX_FILTER_CAPACITY>;

/// Common behaviour of every magnitude filter
pub trait Filter {
    /// Stores a sample
    fn update(&mut self, value: f64);

    /// Aggregated value of the current window. Never mutates state.
    fn value(&self) -> f64;

    /// Starts a new window
    fn reset(&mut self);

    /// Changes the window size. Always discards accumulated samples.
    fn resize(&mut self, capacity: usize);

    /// Current window size
    fn capacity(&self) -> usize;
}

/// Clamps a requested window size to what the sample buffer can hold
pub(crate) fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(1, MAX_FILTER_CAPACITY)
}

/// Filter selector, persisted as `<prefix>Filter<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FilterType {
    /// Most recent sample
    Last = 0,
    /// Largest sample
    Max = 1,
    /// Sliding median-of-three, averaged
    Median = 2,
    /// Arithmetic mean
    MovingAverage = 3,
    /// Running total
    Sum = 4,
}

impl FilterType {
    /// Persisted numeric id
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a filter type by its persisted id
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Last),
            1 => Some(Self::Max),
            2 => Some(Self::Median),
            3 => Some(Self::MovingAverage),
            4 => Some(Self::Sum),
            _ => None,
        }
    }
}

/// A filter instance owned by one magnitude
#[derive(Debug, Clone)]
pub enum MagnitudeFilter {
    /// See [`LastFilter`]
    Last(LastFilter),
    /// See [`MaxFilter`]
    Max(MaxFilter),
    /// See [`SumFilter`]
    Sum(SumFilter),
    /// See [`MovingAverageFilter`]
    MovingAverage(MovingAverageFilter),
    /// See [`MedianFilter`]
    Median(MedianFilter),
}

impl MagnitudeFilter {
    /// Creates an empty filter of the given type and window size
    pub fn new(kind: FilterType, capacity: usize) -> Self {
        match kind {
            FilterType::Last => Self::Last(LastFilter::new()),
            FilterType::Max => Self::Max(MaxFilter::new()),
            FilterType::Sum => Self::Sum(SumFilter::new(capacity)),
            FilterType::MovingAverage => Self::MovingAverage(MovingAverageFilter::new(capacity)),
            FilterType::Median => Self::Median(MedianFilter::new(capacity)),
        }
    }

    /// Type of this filter
    pub fn kind(&self) -> FilterType {
        match self {
            Self::Last(_) => FilterType::Last,
            Self::Max(_) => FilterType::Max,
            Self::Sum(_) => FilterType::Sum,
            Self::MovingAverage(_) => FilterType::MovingAverage,
            Self::Median(_) => FilterType::Median,
        }
    }

    fn inner(&self) -> &dyn Filter {
        match self {
            Self::Last(f) => f,
            Self::Max(f) => f,
            Self::Sum(f) => f,
            Self::MovingAverage(f) => f,
            Self::Median(f) => f,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Filter {
        match self {
            Self::Last(f) => f,
            Self::Max(f) => f,
            Self::Sum(f) => f,
            Self::MovingAverage(f) => f,
            Self::Median(f) => f,
        }
    }
}

impl Filter for MagnitudeFilter {
    fn update(&mut self, value: f64) {
        self.inner_mut().update(value)
    }

    fn value(&self) -> f64 {
        self.inner().value()
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }

    fn resize(&mut self, capacity: usize) {
        self.inner_mut().resize(capacity)
    }

    fn capacity(&self) -> usize {
        self.inner().capacity()
    }
}
