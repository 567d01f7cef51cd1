//! Delay line
//!
//! Fixed-length circular buffer used by the virtualizer for its Haas-effect
//! delays. The buffer is only (re)allocated by [`DelayLine::configure`].

/// Circular delay buffer returning the sample written `len()` calls earlier
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    /// Circular buffer of past inputs
    buffer: Vec<f64>,
    /// Position of the oldest sample, overwritten by the next input
    cursor: usize,
}

impl DelayLine {
    /// Create an empty delay line (passthrough until configured)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a delay line of exactly `length` samples
    pub fn with_length(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            cursor: 0,
        }
    }

    /// Resize to `round(sample_rate * seconds)` samples and clear the history
    pub fn configure(&mut self, sample_rate: f64, seconds: f64) {
        let length = (sample_rate * seconds).round().max(0.0) as usize;
        self.buffer = vec![0.0; length];
        self.cursor = 0;
    }

    /// Push one sample and return the one written `len()` calls ago
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let Some(slot) = self.buffer.get_mut(self.cursor) else {
            return input;
        };
        let output = std::mem::replace(slot, input);
        self.cursor += 1;
        if self.cursor == self.buffer.len() {
            self.cursor = 0;
        }
        output
    }

    /// Delay length in samples
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check whether the line has zero length
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Zero the history without changing the length
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1 ; "one sample")]
    #[test_case(7 ; "odd length")]
    #[test_case(64 ; "power of two")]
    #[test_case(1392 ; "29 ms at 48 kHz")]
    fn test_impulse_returns_after_length(length: usize) {
        let mut line = DelayLine::with_length(length);
        let total = length * 3 + 5;

        for n in 0..total {
            let input = if n == 0 { 1.0 } else { 0.0 };
            let output = line.process(input);
            let expected = if n == length { 1.0 } else { 0.0 };
            assert_eq!(output, expected, "sample {} of delay {}", n, length);
        }
    }

    #[test]
    fn test_configure_rounds_length() {
        let mut line = DelayLine::new();
        line.configure(48000.0, 0.029);
        assert_eq!(line.len(), 1392);

        line.configure(44100.0, 0.023);
        assert_eq!(line.len(), 1014);
    }

    #[test]
    fn test_zero_length_is_passthrough() {
        let mut line = DelayLine::new();
        assert!(line.is_empty());
        assert_eq!(line.process(0.75), 0.75);
    }

    #[test]
    fn test_reconfigure_clears_history() {
        let mut line = DelayLine::with_length(4);
        for _ in 0..4 {
            line.process(9.0);
        }
        line.configure(1000.0, 0.004);
        for _ in 0..4 {
            assert_eq!(line.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_reset_keeps_length() {
        let mut line = DelayLine::with_length(3);
        line.process(1.0);
        line.reset();
        assert_eq!(line.len(), 3);
        for _ in 0..5 {
            assert_eq!(line.process(0.0), 0.0);
        }
    }
}
