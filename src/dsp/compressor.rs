//! Loudness compressor
//!
//! Estimates the loudness of each block through a band-pass weighting filter
//! and steers a per-channel gain toward a level that shrinks the distance to
//! an 83 dB SPL target by the compression ratio. The gain is ramped linearly
//! across the block and its rate of change is limited, with increases
//! throttled further than decreases so sudden loud passages are pulled down
//! quickly while quiet passages are brought up slowly.
//!
//! Gains are 8.24 fixed point (unity = 1 << 24).

use super::biquad::{Biquad, FilterDesign};
use super::{Frame, FADE_STEPS};
use crate::error::{FxError, Result};

/// Unity gain in 8.24 fixed point
pub const UNITY_GAIN: i64 = 1 << 24;

/// Compression ratio range
pub const MIN_RATIO: f64 = 1.0;
pub const MAX_RATIO: f64 = 11.0;

/// Gain increases move 2^4 times slower than decreases
pub const GAIN_INCREASE_SHIFT: u32 = 4;

/// Largest boost the soft ramp can produce
pub const MAX_CORRECTION_DB: f64 = 50.0;

/// Weighting filter approximating A/C weighting over 100 Hz - 10 kHz
const WEIGHTING_CENTER_HZ: f64 = 2200.0;
const WEIGHTING_BANDWIDTH_OCTAVES: f64 = 0.33;
/// Level lost by the weighting filter
const WEIGHTING_LOSS_DB: f64 = 10.0;

/// Digital full scale mapped to dB SPL
const FULL_SCALE_DB: f64 = 96.0;
/// Loudness the correction steers toward
const TARGET_SPL_DB: f64 = 83.0;

/// A full gain correction takes at least 1/48 s
const ADJUST_RATE_HZ: f64 = 48.0;

/// 16.48 fixed point scale of the power estimate
const POWER_SCALE: f64 = (1u64 << 48) as f64;

/// Loudness-driven gain corrector for a stereo stream
#[derive(Debug, Clone)]
pub struct Compressor {
    enabled: bool,
    ratio: f64,
    fade: u8,
    sample_rate: f64,
    /// Host-requested volume per channel (8.24)
    user_level: [i64; 2],
    /// Gain applied to the next frame (8.24)
    current_level: [i64; 2],
    /// Per-frame gain increment for the running block (8.24)
    step: [i64; 2],
    /// Gain the running ramp stops at (8.24)
    target_level: [i64; 2],
    weighting: [Biquad; 2],
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor {
    /// Create a disabled compressor at ratio 1.0
    ///
    /// The applied gain starts at unity, the level of a bypassed chain.
    pub fn new() -> Self {
        Self {
            enabled: false,
            ratio: MIN_RATIO,
            fade: 0,
            sample_rate: 44100.0,
            user_level: [UNITY_GAIN; 2],
            current_level: [UNITY_GAIN; 2],
            step: [0; 2],
            target_level: [UNITY_GAIN; 2],
            weighting: [Biquad::new(), Biquad::new()],
        }
    }

    /// Prepare the weighting filters for `sample_rate`
    pub fn configure(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let design = FilterDesign::BandPass {
            frequency: WEIGHTING_CENTER_HZ,
            bandwidth: WEIGHTING_BANDWIDTH_OCTAVES,
        };
        for filter in &mut self.weighting {
            filter.configure(design, sample_rate, 0);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Set compression ratio (1.0 to 11.0)
    pub fn set_ratio(&mut self, ratio: f64) -> Result<()> {
        if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
            return Err(FxError::invalid_parameter(
                "compression.ratio",
                ratio,
                "1.0 to 11.0",
            ));
        }
        self.ratio = ratio;
        Ok(())
    }

    /// Host volume per channel as linear gain
    pub fn volume(&self) -> [f64; 2] {
        self.user_level.map(|l| l as f64 / UNITY_GAIN as f64)
    }

    /// Set host volume per channel (linear, 0.0 to 1.0)
    pub fn set_volume(&mut self, volume: [f64; 2]) -> Result<()> {
        if let Some(bad) = volume.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(FxError::invalid_parameter(
                "compression.volume",
                bad,
                "0.0 to 1.0",
            ));
        }
        self.user_level = volume.map(|v| (v * UNITY_GAIN as f64).round() as i64);
        Ok(())
    }

    /// Fade position, 0 (silent correction) to 100 (full correction)
    pub fn fade(&self) -> u8 {
        self.fade
    }

    /// Gain applied to the next frame, per channel (8.24)
    pub fn current_levels(&self) -> [i64; 2] {
        self.current_level
    }

    /// Whether the compressor still alters the signal
    ///
    /// Stays true after disabling until the fade has run out and the gain
    /// is back at unity.
    pub fn is_active(&self) -> bool {
        self.enabled || self.fade != 0 || self.current_level != [UNITY_GAIN; 2]
    }

    /// Measure the block and plan this block's gain ramp
    ///
    /// Returns `false` when the compressor is idle; [`Compressor::apply`]
    /// must not be called for such a block.
    pub fn begin_block<I>(&mut self, frames: I, frame_count: usize) -> bool
    where
        I: IntoIterator<Item = Frame>,
    {
        if !self.is_active() || frame_count == 0 {
            return false;
        }

        let power = self.estimate_power(frames, frame_count);

        // -100 .. 0 dB, then shifted so 0 dB sits at the target loudness
        let signal_db =
            10.0 * (power as f64 / POWER_SCALE + 1e-10).log10() + FULL_SCALE_DB - TARGET_SPL_DB
                + WEIGHTING_LOSS_DB;
        let desired_db = signal_db / self.ratio;

        if self.enabled && self.fade < FADE_STEPS {
            self.fade += 1;
        } else if !self.enabled && self.fade > 0 {
            self.fade -= 1;
        }

        let correction_db = soften_correction((desired_db - signal_db) * self.fade_gain());
        let factor = (UNITY_GAIN as f64 * 10.0_f64.powf(correction_db / 20.0)) as i64;

        // Host volume only applies while enabled; a fade-out heads for unity
        let volume = if self.enabled {
            self.user_level
        } else {
            [UNITY_GAIN; 2]
        };

        let ramp_len = ((self.sample_rate / ADJUST_RATE_HZ) as i64).max(frame_count as i64);
        for ch in 0..2 {
            let desired = (volume[ch] * factor) >> 24;
            let distance = desired - self.current_level[ch];
            let mut step = distance / ramp_len;
            if step > 0 {
                step >>= GAIN_INCREASE_SHIFT;
            }
            if step == 0 {
                step = distance.signum();
            }
            self.step[ch] = step;
            self.target_level[ch] = desired;
        }

        true
    }

    /// Scale one frame by the running gain and advance the ramp
    #[inline]
    pub fn apply(&mut self, frame: Frame) -> Frame {
        let mut out = frame;
        for ch in 0..2 {
            out[ch] = frame[ch] * self.current_level[ch] as f64 / UNITY_GAIN as f64;
            let next = self.current_level[ch] + self.step[ch];
            self.current_level[ch] = if self.step[ch] > 0 {
                next.min(self.target_level[ch])
            } else {
                next.max(self.target_level[ch])
            };
        }
        out
    }

    /// Mean squared weighted level of the louder channel, 16.48 fixed point
    fn estimate_power<I>(&mut self, frames: I, frame_count: usize) -> u64
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut sums = [0u128; 2];
        for frame in frames {
            for ch in 0..2 {
                let weighted = self.weighting[ch].process(frame[ch]) as i64;
                let magnitude = u128::from(weighted.unsigned_abs());
                sums[ch] = sums[ch].saturating_add(magnitude * magnitude);
            }
        }

        let count = frame_count.max(1) as u128;
        let loudest = sums.iter().map(|s| s / count).max().unwrap_or(0);
        u64::try_from(loudest).unwrap_or(u64::MAX)
    }

    fn fade_gain(&self) -> f64 {
        f64::from(self.fade) / f64::from(FADE_STEPS)
    }

    /// Clear measurement filters and restart the fade from unity gain
    pub fn reset(&mut self) {
        for filter in &mut self.weighting {
            filter.reset();
        }
        self.current_level = [UNITY_GAIN; 2];
        self.step = [0; 2];
        self.target_level = [UNITY_GAIN; 2];
        self.fade = 0;
    }
}

/// Quadratic ramp folding extreme corrections into -50 .. +50 dB
#[inline]
fn soften_correction(correction_db: f64) -> f64 {
    correction_db - (correction_db / 100.0).powi(2) * (100.0 / 2.0)
}
