//! Bass boost
//!
//! A resonant low-pass on the mono sum, added back to both channels. The
//! strength knob only moves the resonance: Q runs from 0.5 at strength 0 to
//! 2.0 at strength 1000.

use super::biquad::{Biquad, FilterDesign};
use super::Frame;
use crate::error::{FxError, Result};

/// Maximum strength value
pub const MAX_STRENGTH: u16 = 1000;

/// Default low-pass corner
pub const DEFAULT_CENTER_FREQUENCY_HZ: f64 = 55.0;

/// Accepted corner frequency range
pub const MIN_CENTER_FREQUENCY_HZ: f64 = 20.0;
pub const MAX_CENTER_FREQUENCY_HZ: f64 = 500.0;

/// Parameter edits glide over this fraction of a second
const EDIT_RAMP_SECONDS: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct BassBoost {
    enabled: bool,
    strength: u16,
    center_frequency: f64,
    sample_rate: f64,
    filter: Biquad,
}

impl Default for BassBoost {
    fn default() -> Self {
        Self::new()
    }
}

impl BassBoost {
    pub fn new() -> Self {
        let mut boost = Self {
            enabled: false,
            strength: 0,
            center_frequency: DEFAULT_CENTER_FREQUENCY_HZ,
            sample_rate: 44100.0,
            filter: Biquad::new(),
        };
        boost.refresh(0);
        boost
    }

    /// Recompute the filter for `sample_rate`, applying it immediately
    pub fn configure(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.refresh(0);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn strength(&self) -> u16 {
        self.strength
    }

    /// Set strength (0 to 1000)
    pub fn set_strength(&mut self, strength: u16) -> Result<()> {
        if strength > MAX_STRENGTH {
            return Err(FxError::invalid_parameter(
                "bass_boost.strength",
                strength,
                "0 to 1000",
            ));
        }
        if strength != self.strength {
            self.strength = strength;
            self.refresh(self.edit_interval());
        }
        Ok(())
    }

    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    /// Set low-pass corner in Hz (20 to 500)
    pub fn set_center_frequency(&mut self, frequency: f64) -> Result<()> {
        if !(MIN_CENTER_FREQUENCY_HZ..=MAX_CENTER_FREQUENCY_HZ).contains(&frequency) {
            return Err(FxError::invalid_parameter(
                "bass_boost.center_frequency",
                frequency,
                "20 to 500 Hz",
            ));
        }
        if frequency != self.center_frequency {
            self.center_frequency = frequency;
            self.refresh(self.edit_interval());
        }
        Ok(())
    }

    /// Resonance derived from strength
    pub fn q(&self) -> f64 {
        0.5 + f64::from(self.strength) / 666.0
    }

    /// Add the low-passed mono sum to both channels
    #[inline]
    pub fn process(&mut self, frame: Frame) -> Frame {
        let boost = self.filter.process(frame[0] + frame[1]);
        [frame[0] + boost, frame[1] + boost]
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }

    fn edit_interval(&self) -> u32 {
        (self.sample_rate * EDIT_RAMP_SECONDS) as u32
    }

    fn refresh(&mut self, interval: u32) {
        let design = FilterDesign::LowPass {
            frequency: self.center_frequency,
            q: self.q(),
        };
        self.filter.configure(design, self.sample_rate, interval);
    }
}
