//! Windowed Sample Aggregator
//!
//! Accumulates raw codes into a fixed-size window and tracks extrema.
//! A completed window is handed out by value from [`SampleAggregator::push`]
//! and the running state is reset in the same call, so the next sample
//! always lands in a fresh window and nothing is shared with the consumer.

/// Aggregate of one window of raw samples
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    /// Sum of all raw codes
    pub sum: i32,
    /// Number of samples
    pub count: u16,
    /// Largest raw code
    pub max: i16,
    /// Smallest raw code
    pub min: i16,
}

impl Window {
    /// Truncating integer mean of the uncorrected sum
    #[must_use]
    pub fn mean_code(&self) -> i32 {
        if self.count == 0 {
            return 0;
        }
        self.sum / i32::from(self.count)
    }

    /// Spread between the extrema in raw codes
    #[must_use]
    pub fn span(&self) -> i32 {
        i32::from(self.max) - i32::from(self.min)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Window {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Window(sum={}, n={}, max={}, min={})",
            self.sum,
            self.count,
            self.max,
            self.min
        );
    }
}

/// Running aggregation of the open window
pub struct SampleAggregator {
    /// Samples per window
    size: u16,
    /// Running sum
    sum: i32,
    /// Samples accumulated so far, always below `size`
    count: u16,
    /// Running maximum
    max: i16,
    /// Running minimum
    min: i16,
}

impl SampleAggregator {
    /// Create an aggregator for windows of `size` samples (at least one)
    #[must_use]
    pub const fn new(size: u16) -> Self {
        Self {
            size: if size == 0 { 1 } else { size },
            sum: 0,
            count: 0,
            max: i16::MIN,
            min: i16::MAX,
        }
    }

    /// Add one raw code
    ///
    /// Returns the completed window when this sample fills it.
    pub fn push(&mut self, code: i16) -> Option<Window> {
        if code > self.max {
            self.max = code;
        }
        if code < self.min {
            self.min = code;
        }
        self.sum += i32::from(code);
        self.count += 1;

        if self.count < self.size {
            return None;
        }

        let window = Window {
            sum: self.sum,
            count: self.count,
            max: self.max,
            min: self.min,
        };
        self.reset();
        Some(window)
    }

    /// Discard the open window
    pub fn reset(&mut self) {
        self.sum = 0;
        self.count = 0;
        self.max = i16::MIN;
        self.min = i16::MAX;
    }

    /// Samples per window
    #[must_use]
    pub const fn window_size(&self) -> u16 {
        self.size
    }

    /// Samples accumulated in the open window
    #[must_use]
    pub const fn pending(&self) -> u16 {
        self.count
    }

    /// Running sum of the open window
    #[must_use]
    pub const fn partial_sum(&self) -> i32 {
        self.sum
    }
}
