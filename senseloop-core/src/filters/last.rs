use super::Filter;

/// Keeps the most recent sample
#[derive(Debug, Clone, Default)]
pub struct LastFilter {
    value: f64,
}

impl LastFilter {
    /// Creates a filter holding zero
    pub const fn new() -> Self {
        Self { value: 0.0 }
    }
}

impl Filter for LastFilter {
    fn update(&mut self, value: f64) {
        self.value = value;
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }

    fn resize(&mut self, _capacity: usize) {
        self.reset();
    }

    fn capacity(&self) -> usize {
        1
    }
}
