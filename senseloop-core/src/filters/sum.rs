use super::{clamp_capacity, Filter};

/// Running total of every sample since the last reset
///
/// Used by counters (pulses, Geiger clicks, energy deltas) where the report
/// should carry everything that happened during the window.
#[derive(Debug, Clone)]
pub struct SumFilter {
    sum: f64,
    capacity: usize,
}

impl SumFilter {
    /// Creates a filter holding zero
    pub fn new(capacity: usize) -> Self {
        Self {
            sum: 0.0,
            capacity: clamp_capacity(capacity),
        }
    }
}

impl Filter for SumFilter {
    fn update(&mut self, value: f64) {
        self.sum += value;
    }

    fn value(&self) -> f64 {
        self.sum
    }

    fn reset(&mut self) {
        self.sum = 0.0;
    }

    // The total is not windowed, capacity is only bookkeeping
    fn resize(&mut self, capacity: usize) {
        self.capacity = clamp_capacity(capacity);
        self.reset();
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_until_reset() {
        let mut filter = SumFilter::new(10);
        for _ in 0..100 {
            filter.update(1.0);
        }
        assert_eq!(filter.value(), 100.0);

        filter.resize(5);
        assert_eq!(filter.value(), 0.0);
        assert_eq!(filter.capacity(), 5);
    }
}
