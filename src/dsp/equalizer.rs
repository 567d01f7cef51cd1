//! Loudness-adaptive 6-band equalizer
//!
//! The six logical bands sit at 15.625 * 4^n Hz. They are realised as a
//! cascade of five high shelves per channel: each shelf lifts everything
//! above its corner by the difference between two neighbouring bands, and
//! the lowest shelf also carries the absolute level of band 0 as a flat gain.
//!
//! With loudness correction on, an equal-loudness curve (ISO 226) is added
//! to the user gains. The curve is scaled by a running loudness estimate per
//! channel, so quiet playback gets more bass and treble than loud playback.
//! The estimate and all shelf targets are refreshed every 10 ms, and each
//! refresh glides into the new coefficients over the next 10 ms.

use super::biquad::{Biquad, FilterDesign};
use super::{Frame, FADE_STEPS};
use crate::error::{FxError, Result};

/// Number of logical bands
pub const NUM_BANDS: usize = 6;

/// Number of shelf sections per channel
const NUM_SHELVES: usize = NUM_BANDS - 1;

/// Band gain limits in dB
pub const MIN_BAND_LEVEL_DB: f64 = -10.0;
pub const MAX_BAND_LEVEL_DB: f64 = 10.0;

/// Loudness reference limits in dB
pub const MIN_LOUDNESS_REFERENCE_DB: f64 = -100.0;
pub const MAX_LOUDNESS_REFERENCE_DB: f64 = 100.0;

const LOWEST_BAND_HZ: f64 = 15.625;

/// ISO 226 compensation at 100 dB and 20 dB SPL
const LOUD_CURVE_DB: [f64; NUM_BANDS] = [0.0, 0.0, 0.0, 0.0, -1.0, -1.5];
const QUIET_CURVE_DB: [f64; NUM_BANDS] = [42.3, 28.0, 10.0, 0.0, -3.0, 8.0];

/// Loudness range the compensation curve interpolates over
const QUIET_SPL_DB: f64 = 20.0;
const LOUD_SPL_DB: f64 = 100.0;

const INITIAL_LOUDNESS_DB: f64 = 50.0;
const FULL_SCALE_DB: f64 = 96.0;
const POWER_SCALE: f64 = (1u64 << 48) as f64;

/// Loudness estimate falls at most this much per refresh
const LOUDNESS_DECAY_DB: f64 = 0.1;

/// Refresh interval before the sample rate is known
const DEFAULT_UPDATE_INTERVAL: u32 = 1000;
const UPDATES_PER_SECOND: f64 = 100.0;

/// Center frequency of `band` in Hz
pub fn center_frequency(band: usize) -> f64 {
    LOWEST_BAND_HZ * 4.0_f64.powi(band as i32)
}

/// Per-channel shelf cascade and loudness meter
#[derive(Debug, Clone)]
struct ChannelState {
    shelves: [Biquad; NUM_SHELVES],
    loudness: f64,
    power: f64,
}

impl ChannelState {
    fn new() -> Self {
        Self {
            shelves: Default::default(),
            loudness: INITIAL_LOUDNESS_DB,
            power: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, sample: f64) -> f64 {
        self.shelves
            .iter_mut()
            .fold(sample, |acc, shelf| shelf.process(acc))
    }

    /// Fold the accumulated power into the loudness estimate
    ///
    /// Rises instantly, decays by a fixed step per refresh.
    fn update_loudness(&mut self, interval: u32) {
        let signal_db = FULL_SCALE_DB
            + 10.0 * (self.power / f64::from(interval) / POWER_SCALE + 1e-10).log10();
        if self.loudness > signal_db + LOUDNESS_DECAY_DB {
            self.loudness -= LOUDNESS_DECAY_DB;
        } else {
            self.loudness = signal_db;
        }
        self.power = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct Equalizer {
    enabled: bool,
    band_levels: [f64; NUM_BANDS],
    loudness_correction: bool,
    loudness_reference: f64,
    sample_rate: f64,
    update_interval: u32,
    countdown: u32,
    fade: u8,
    channels: [ChannelState; 2],
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Equalizer {
    pub fn new() -> Self {
        Self {
            enabled: false,
            band_levels: [0.0; NUM_BANDS],
            loudness_correction: false,
            loudness_reference: 0.0,
            sample_rate: 44100.0,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            countdown: 0,
            fade: 0,
            channels: [ChannelState::new(), ChannelState::new()],
        }
    }

    /// Set the refresh cadence for `sample_rate`; the next frame refreshes
    pub fn configure(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_interval = ((sample_rate / UPDATES_PER_SECOND) as u32).max(1);
        self.countdown = 0;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enabling does not reset the fade; it only ever counts up
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the equalizer currently alters the signal
    pub fn is_active(&self) -> bool {
        self.enabled && self.fade != 0
    }

    pub fn fade(&self) -> u8 {
        self.fade
    }

    pub fn band_level(&self, band: usize) -> Option<f64> {
        self.band_levels.get(band).copied()
    }

    pub fn band_levels(&self) -> [f64; NUM_BANDS] {
        self.band_levels
    }

    /// Set one band's gain in dB; takes effect at the next refresh
    pub fn set_band_level(&mut self, band: usize, gain_db: f64) -> Result<()> {
        if band >= NUM_BANDS {
            return Err(FxError::invalid_parameter(
                "equalizer.band_level.band",
                band,
                "0 to 5",
            ));
        }
        if !(MIN_BAND_LEVEL_DB..=MAX_BAND_LEVEL_DB).contains(&gain_db) {
            return Err(FxError::invalid_parameter(
                "equalizer.band_level.gain_db",
                gain_db,
                "-10.0 to 10.0 dB",
            ));
        }
        self.band_levels[band] = gain_db;
        Ok(())
    }

    pub fn loudness_correction(&self) -> bool {
        self.loudness_correction
    }

    pub fn set_loudness_correction(&mut self, enabled: bool) {
        self.loudness_correction = enabled;
    }

    pub fn loudness_reference(&self) -> f64 {
        self.loudness_reference
    }

    /// Offset added to the measured loudness before compensation
    pub fn set_loudness_reference(&mut self, reference_db: f64) -> Result<()> {
        if !(MIN_LOUDNESS_REFERENCE_DB..=MAX_LOUDNESS_REFERENCE_DB).contains(&reference_db) {
            return Err(FxError::invalid_parameter(
                "equalizer.loudness_reference",
                reference_db,
                "-100.0 to 100.0 dB",
            ));
        }
        self.loudness_reference = reference_db;
        Ok(())
    }

    /// Running loudness estimate per channel, dB SPL
    pub fn loudness(&self) -> [f64; 2] {
        [self.channels[0].loudness, self.channels[1].loudness]
    }

    /// Frames between refreshes
    pub fn update_interval(&self) -> u32 {
        self.update_interval
    }

    /// Effective gain of `band` at `loudness` dB SPL, scaled by the fade
    pub fn adjusted_band_db(&self, band: usize, loudness: f64) -> f64 {
        let mut gain = self.band_levels[band];
        if self.loudness_correction {
            let level = (loudness + self.loudness_reference).clamp(QUIET_SPL_DB, LOUD_SPL_DB);
            let norm = (level - QUIET_SPL_DB) / (LOUD_SPL_DB - QUIET_SPL_DB);
            let loud = LOUD_CURVE_DB[band];
            gain += loud + (QUIET_CURVE_DB[band] - loud) * (1.0 - norm);
        }
        gain * f64::from(self.fade) / f64::from(FADE_STEPS)
    }

    /// Run one frame through both cascades
    ///
    /// `power_weight` scales the squared input fed to the loudness meter.
    #[inline]
    pub fn process(&mut self, frame: Frame, power_weight: f64) -> Frame {
        let mut out = frame;
        for (ch, state) in self.channels.iter_mut().enumerate() {
            state.power += frame[ch] * frame[ch] * power_weight;
            out[ch] = state.process(frame[ch]);
        }

        if self.countdown == 0 {
            self.countdown = self.update_interval;
            self.refresh();
        }
        self.countdown -= 1;

        out
    }

    fn refresh(&mut self) {
        for state in &mut self.channels {
            state.update_loudness(self.update_interval);
        }
        if self.fade < FADE_STEPS {
            self.fade += 1;
        }

        for ch in 0..2 {
            let loudness = self.channels[ch].loudness;
            let gains: [f64; NUM_BANDS] =
                std::array::from_fn(|band| self.adjusted_band_db(band, loudness));

            for (n, shelf) in self.channels[ch].shelves.iter_mut().enumerate() {
                let design = FilterDesign::HighShelf {
                    frequency: 2.0 * center_frequency(n),
                    gain_db: gains[n + 1] - gains[n],
                    slope: 1.0,
                    overall_gain_db: if n == 0 { gains[0] } else { 0.0 },
                };
                shelf.configure(design, self.sample_rate, self.update_interval);
            }
        }
    }

    /// Clear filter history and loudness meters
    pub fn reset(&mut self) {
        for state in &mut self.channels {
            state.shelves.iter_mut().for_each(Biquad::reset);
            state.power = 0.0;
            state.loudness = INITIAL_LOUDNESS_DB;
        }
        self.countdown = 0;
    }
}
