use super::Filter;

/// Holds the largest sample seen since the last reset
///
/// An empty filter reads as zero, so event and digital magnitudes report
/// "nothing happened" between edges.
#[derive(Debug, Clone, Default)]
pub struct MaxFilter {
    max: Option<f64>,
}

impl MaxFilter {
    /// Creates an empty filter
    pub const fn new() -> Self {
        Self { max: None }
    }
}

impl Filter for MaxFilter {
    fn update(&mut self, value: f64) {
        self.max = match self.max {
            Some(max) if max >= value => Some(max),
            _ => Some(value),
        };
    }

    fn value(&self) -> f64 {
        self.max.unwrap_or(0.0)
    }

    fn reset(&mut self) {
        self.max = None;
    }

    fn resize(&mut self, _capacity: usize) {
        self.reset();
    }

    fn capacity(&self) -> usize {
        1
    }
}
