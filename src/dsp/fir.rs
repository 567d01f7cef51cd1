//! 16-tap FIR filter

/// Number of taps
pub const FIR_TAPS: usize = 16;

const TAP_MASK: usize = FIR_TAPS - 1;

/// Direct-form FIR with a fixed 16-sample history
#[derive(Debug, Clone, Default)]
pub struct Fir16 {
    coefficients: [f64; FIR_TAPS],
    history: [f64; FIR_TAPS],
    index: usize,
}

impl Fir16 {
    /// Create a filter with all-zero coefficients
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with the given impulse response
    pub fn with_coefficients(coefficients: [f64; FIR_TAPS]) -> Self {
        Self {
            coefficients,
            ..Self::default()
        }
    }

    pub fn set_coefficients(&mut self, coefficients: [f64; FIR_TAPS]) {
        self.coefficients = coefficients;
    }

    pub fn coefficients(&self) -> &[f64; FIR_TAPS] {
        &self.coefficients
    }

    /// y[n] = sum of c[i] * x[n - i]
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.index = self.index.wrapping_sub(1) & TAP_MASK;
        self.history[self.index] = input;

        self.coefficients
            .iter()
            .enumerate()
            .map(|(i, c)| c * self.history[(self.index + i) & TAP_MASK])
            .sum()
    }

    pub fn reset(&mut self) {
        self.history = [0.0; FIR_TAPS];
        self.index = 0;
    }
}
