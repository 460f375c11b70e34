use super::{clamp_capacity, Filter, Samples};

/// Arithmetic mean of up to `capacity` samples
///
/// Once the window is full further samples are dropped, not rotated in,
/// until the next reset.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter {
    samples: Samples,
    capacity: usize,
}

impl MovingAverageFilter {
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

impl Filter for MovingAverageFilter {
    fn update(&mut self, value: f64) {
        if self.samples.len() < self.capacity {
            // Capacity never exceeds the buffer size
            let _ = self.samples.push(value);
        }
    }

    fn value(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    fn reset(&mut self) {
        self.samples.clear();
    }

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
    fn mean_of_window() {
        let mut filter = MovingAverageFilter::new(4);
        assert_eq!(filter.value(), 0.0);

        for value in [1.0, 2.0, 3.0, 4.0] {
            filter.update(value);
        }
        assert_eq!(filter.value(), 2.5);

        // Full, later samples are dropped
        filter.update(100.0);
        assert_eq!(filter.len(), 4);
        assert_eq!(filter.value(), 2.5);

        filter.reset();
        assert!(filter.is_empty());
        assert_eq!(filter.value(), 0.0);
    }
}
