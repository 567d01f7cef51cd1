//! Biquad filter section with click-free coefficient transitions
//!
//! Coefficients follow the Audio EQ Cookbook (bilinear transform). Only the
//! three responses the effects need are provided: low-pass, band-pass and
//! high-shelf. A new design never replaces the running coefficients at once;
//! the section walks there linearly over a caller-chosen number of samples.

use std::f64::consts::{LN_2, PI};

/// Highest corner frequency as a fraction of the sample rate
const MAX_FREQUENCY_RATIO: f64 = 0.49;

/// Lowest corner frequency in Hz
const MIN_FREQUENCY_HZ: f64 = 1.0;

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BiquadCoefficients {
    /// Unity gain, no filtering
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    const ZERO: Self = Self {
        b0: 0.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Per-sample increment that reaches `target` after `steps` increments
    fn delta_to(&self, target: &Self, steps: u32) -> Self {
        let n = f64::from(steps);
        Self {
            b0: (target.b0 - self.b0) / n,
            b1: (target.b1 - self.b1) / n,
            b2: (target.b2 - self.b2) / n,
            a1: (target.a1 - self.a1) / n,
            a2: (target.a2 - self.a2) / n,
        }
    }

    fn add(&mut self, delta: &Self) {
        self.b0 += delta.b0;
        self.b1 += delta.b1;
        self.b2 += delta.b2;
        self.a1 += delta.a1;
        self.a2 += delta.a2;
    }

    /// Analytic magnitude response in dB at `frequency`
    pub fn magnitude_db(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        // z^-1 = cos w - j sin w
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = num_re.hypot(num_im);
        let den = den_re.hypot(den_im);
        20.0 * (num / den).log10()
    }
}

/// Filter response and its design parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDesign {
    /// Resonant low-pass
    LowPass { frequency: f64, q: f64 },
    /// Band-pass with constant 0 dB peak gain, bandwidth in octaves
    BandPass { frequency: f64, bandwidth: f64 },
    /// High shelf with a shelf slope, plus a flat gain applied to the
    /// whole section
    HighShelf {
        frequency: f64,
        gain_db: f64,
        slope: f64,
        overall_gain_db: f64,
    },
}

impl FilterDesign {
    /// Calculate normalized coefficients for this design at `sample_rate`
    pub fn coefficients(&self, sample_rate: f64) -> BiquadCoefficients {
        // Below ~2 Hz sample rate the floor follows the ceiling down
        let ceiling = sample_rate * MAX_FREQUENCY_RATIO;
        let floor = MIN_FREQUENCY_HZ.min(ceiling);
        let clamp = |f: f64| f.clamp(floor, ceiling);

        match *self {
            FilterDesign::LowPass { frequency, q } => {
                let w0 = 2.0 * PI * clamp(frequency) / sample_rate;
                let cos_w0 = w0.cos();
                let alpha = w0.sin() / (2.0 * q);
                BiquadCoefficients::normalized(
                    (1.0 - cos_w0) / 2.0,
                    1.0 - cos_w0,
                    (1.0 - cos_w0) / 2.0,
                    1.0 + alpha,
                    -2.0 * cos_w0,
                    1.0 - alpha,
                )
            }
            FilterDesign::BandPass {
                frequency,
                bandwidth,
            } => {
                let w0 = 2.0 * PI * clamp(frequency) / sample_rate;
                let sin_w0 = w0.sin();
                let alpha = sin_w0 * (LN_2 / 2.0 * bandwidth * w0 / sin_w0).sinh();
                BiquadCoefficients::normalized(
                    alpha,
                    0.0,
                    -alpha,
                    1.0 + alpha,
                    -2.0 * w0.cos(),
                    1.0 - alpha,
                )
            }
            FilterDesign::HighShelf {
                frequency,
                gain_db,
                slope,
                overall_gain_db,
            } => {
                let w0 = 2.0 * PI * clamp(frequency) / sample_rate;
                let cos_w0 = w0.cos();
                let a = 10.0_f64.powf(gain_db / 40.0);
                let alpha = w0.sin() / 2.0 * ((a + 1.0 / a) * (1.0 / slope - 1.0) + 2.0).sqrt();
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                let gain = 10.0_f64.powf(overall_gain_db / 20.0);

                BiquadCoefficients::normalized(
                    gain * a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    gain * -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    gain * a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
        }
    }
}

/// Second-order IIR section with linear coefficient interpolation
///
/// State is kept in transposed direct form II (two words). A fresh section
/// passes its input through unchanged.
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    current: BiquadCoefficients,
    target: BiquadCoefficients,
    delta: BiquadCoefficients,
    remaining: u32,
    s1: f64,
    s2: f64,
}

impl Biquad {
    /// Create an identity section
    pub fn new() -> Self {
        Self::default()
    }

    /// Retarget the section to `design`
    ///
    /// The running coefficients move linearly to the new target over the
    /// next `interval` calls to [`Biquad::process`]; `interval == 0` applies
    /// the target immediately.
    pub fn configure(&mut self, design: FilterDesign, sample_rate: f64, interval: u32) {
        self.set_target(design.coefficients(sample_rate), interval);
    }

    /// Retarget the section to precomputed coefficients
    pub fn set_target(&mut self, target: BiquadCoefficients, interval: u32) {
        self.target = target;
        if interval == 0 {
            self.current = target;
            self.delta = BiquadCoefficients::ZERO;
            self.remaining = 0;
        } else {
            self.delta = self.current.delta_to(&target, interval);
            self.remaining = interval;
        }
    }

    /// Filter one sample, then advance the coefficient ramp by one step
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let c = &self.current;
        let output = c.b0 * input + self.s1;
        self.s1 = c.b1 * input - c.a1 * output + self.s2;
        self.s2 = c.b2 * input - c.a2 * output;

        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.current = self.target;
            } else {
                self.current.add(&self.delta);
            }
        }

        output
    }

    /// Clear filter history, keeping coefficients
    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    /// Coefficients applied to the next sample
    pub fn current(&self) -> &BiquadCoefficients {
        &self.current
    }

    /// Coefficients the ramp is heading for
    pub fn target(&self) -> &BiquadCoefficients {
        &self.target
    }

    /// Samples left before the current coefficients equal the target
    pub fn remaining_steps(&self) -> u32 {
        self.remaining
    }
}
