//! Median-of-medians filter
//!
//! Smooths single-sample spikes without the cost of sorting the window: every
//! consecutive triple contributes its middle value, and the result is the
//! mean of those middles.
//!
//! ```text
//! samples   5   1   9   2   8
//! triples  [5 1 9] [1 9 2] [9 2 8]
//! middles    5       2       8      -> (5 + 2 + 8) / 3 = 5
//! ```

use super::{clamp_capacity, Filter, Samples};

/// Sliding median-of-three, averaged over the window
#[derive(Debug, Clone)]
pub struct MedianFilter {
    samples: Samples,
    capacity: usize,
}

impl MedianFilter {
    /// Creates an empty filter
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Samples::new(),
            capacity: clamp_capacity(capacity),
        }
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample is buffered
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Middle value of three, with a fixed tie-break order
fn middle(a: f64, b: f64, c: f64) -> f64 {
    if a < b {
        if b < c {
            b
        } else if a < c {
            c
        } else {
            a
        }
    } else if a < c {
        a
    } else if b < c {
        c
    } else {
        b
    }
}

impl Filter for MedianFilter {
    fn update(&mut self, value: f64) {
        if self.samples.len() < self.capacity {
            let _ = self.samples.push(value);
        }
    }

    fn value(&self) -> f64 {
        let count = self.samples.len();
        if count <= 2 {
            return self.samples.first().copied().unwrap_or(0.0);
        }

        let sum: f64 = self
            .samples
            .windows(3)
            .map(|w| middle(w[0], w[1], w[2]))
            .sum();

        sum / (count - 2) as f64
    }

    /// Keeps the last sample as the seed of the next window when more than
    /// two were buffered
    fn reset(&mut self) {
        let seed = if self.samples.len() > 2 {
            self.samples.last().copied()
        } else {
            None
        };

        self.samples.clear();
        if let Some(seed) = seed {
            let _ = self.samples.push(seed);
        }
    }

    fn resize(&mut self, capacity: usize) {
        self.capacity = clamp_capacity(capacity);
        self.samples.clear();
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_ladder() {
        assert_eq!(middle(1.0, 2.0, 3.0), 2.0);
        assert_eq!(middle(3.0, 2.0, 1.0), 2.0);
        assert_eq!(middle(1.0, 3.0, 2.0), 2.0);
        assert_eq!(middle(2.0, 2.0, 2.0), 2.0);
        assert_eq!(middle(2.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn median_of_medians() {
        let mut filter = MedianFilter::new(5);
        for value in [5.0, 1.0, 9.0, 2.0, 8.0] {
            filter.update(value);
        }
        assert_eq!(filter.value(), 5.0);

        // Full, ignored
        filter.update(1000.0);
        assert_eq!(filter.value(), 5.0);
    }

    #[test]
    fn short_windows() {
        let mut filter = MedianFilter::new(5);
        assert_eq!(filter.value(), 0.0);

        filter.update(7.0);
        filter.update(3.0);
        assert_eq!(filter.value(), 7.0);
    }

    #[test]
    fn reset_seeds_next_window() {
        let mut filter = MedianFilter::new(5);
        for value in [1.0, 2.0, 3.0] {
            filter.update(value);
        }

        filter.reset();
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.value(), 3.0);

        // With two or fewer samples the window is cleared
        filter.update(4.0);
        filter.reset();
        assert!(filter.is_empty());
        assert_eq!(filter.value(), 0.0);
    }

    #[test]
    fn resize_discards_seed() {
        let mut filter = MedianFilter::new(5);
        for value in [1.0, 2.0, 3.0, 4.0] {
            filter.update(value);
        }

        filter.resize(10);
        assert!(filter.is_empty());
        assert_eq!(filter.capacity(), 10);
    }
}
