//! Headphone virtualizer
//!
//! A cross-fed pair of short delays (29 ms left, 23 ms right) adds a Haas
//! style room impression. The wet signal is mixed back into the dry frame,
//! then a mid/side stage subtracts a shelved copy of the side signal. Below
//! the shelf corner the side cancels almost completely, above it about 70%
//! survives, which moves the image out of the head and toward the front.

use super::biquad::{Biquad, FilterDesign};
use super::delay::DelayLine;
use super::Frame;
use crate::error::{FxError, Result};

/// Maximum strength value
pub const MAX_STRENGTH: u16 = 1000;

/// Strength at which the right wet channel is inverted
const WIDE_THRESHOLD: u16 = 500;

/// Wet level at strength 1 and 1000
const MIN_LEVEL_DB: f64 = -15.0;
const MAX_LEVEL_DB: f64 = -5.0;

/// Wet level unity in 32.32 fixed point
const LEVEL_UNITY: f64 = 4_294_967_296.0;

const LEFT_DELAY_SECONDS: f64 = 0.029;
const RIGHT_DELAY_SECONDS: f64 = 0.023;

/// Side-signal shelf
const LOCALIZATION_DESIGN: FilterDesign = FilterDesign::HighShelf {
    frequency: 800.0,
    gain_db: -11.0,
    slope: 0.72,
    overall_gain_db: 0.0,
};

#[derive(Debug, Clone)]
pub struct Virtualizer {
    enabled: bool,
    strength: u16,
    /// Cross feedback between the delay lines
    deep: bool,
    /// Right wet channel inverted
    wide: bool,
    /// Wet gain, 32.32 fixed point
    level: i64,
    delays: [DelayLine; 2],
    /// Previous frame's wet output, fed to the opposite line
    feedback: Frame,
    localization: Biquad,
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Virtualizer {
    /// Create a disabled virtualizer; delays stay empty until configured
    pub fn new() -> Self {
        Self {
            enabled: false,
            strength: 0,
            deep: false,
            wide: false,
            level: 0,
            delays: [DelayLine::new(), DelayLine::new()],
            feedback: [0.0; 2],
            localization: Biquad::new(),
        }
    }

    /// Allocate the delay lines and design the localization shelf
    pub fn configure(&mut self, sample_rate: f64) {
        self.delays[0].configure(sample_rate, LEFT_DELAY_SECONDS);
        self.delays[1].configure(sample_rate, RIGHT_DELAY_SECONDS);
        self.localization.configure(LOCALIZATION_DESIGN, sample_rate, 0);
        self.localization.reset();
        self.feedback = [0.0; 2];
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
                "virtualizer.strength",
                strength,
                "0 to 1000",
            ));
        }
        self.strength = strength;
        self.deep = strength != 0;
        self.wide = strength >= WIDE_THRESHOLD;
        self.level = if strength == 0 {
            0
        } else {
            let db = MIN_LEVEL_DB
                + (MAX_LEVEL_DB - MIN_LEVEL_DB) * f64::from(strength) / f64::from(MAX_STRENGTH);
            (10.0_f64.powf(db / 20.0) * LEVEL_UNITY) as i64
        };
        Ok(())
    }

    pub fn is_deep(&self) -> bool {
        self.deep
    }

    pub fn is_wide(&self) -> bool {
        self.wide
    }

    /// Wet gain as a linear factor
    pub fn level(&self) -> f64 {
        self.level as f64 / LEVEL_UNITY
    }

    /// Run one frame through the network
    ///
    /// At strength 0 the delays and the shelf keep running on the dry
    /// signal, with no wet gain, and the dry frame is returned as is.
    #[inline]
    pub fn process(&mut self, frame: Frame) -> Frame {
        let mut wet = frame;
        if self.deep {
            wet[0] += self.feedback[1];
            wet[1] += self.feedback[0];
        }

        wet[0] = self.delays[0].process(wet[0]);
        wet[1] = self.delays[1].process(wet[1]);
        if self.wide {
            wet[1] = -wet[1];
        }

        let gain = self.level();
        wet = wet.map(|s| s * gain);
        self.feedback = wet;

        let left = wet[0] + frame[0];
        let right = wet[1] + frame[1];
        let center = (left + right) / 2.0;
        let mut side = (left - right) / 2.0;
        side -= self.localization.process(side);

        if self.strength == 0 {
            return frame;
        }
        [center + side, center - side]
    }

    pub fn reset(&mut self) {
        self.delays.iter_mut().for_each(DelayLine::reset);
        self.localization.reset();
        self.feedback = [0.0; 2];
    }
}
