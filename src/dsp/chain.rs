//! Effect chain
//!
//! Runs the four effects over each block in a fixed order:
//! 1. Compression (gain planned once per block, ramped per frame)
//! 2. Bass boost
//! 3. Virtualizer
//! 4. Equalizer (with loudness tracking)
//!
//! Each effect has its own enable flag and, where it has one, its own fade.
//! The master enable does not fade anything; it only gates the reported
//! status so the host can bypass the chain.

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{BassBoost, Compressor, Equalizer, Parameter, ParameterId, Virtualizer};
use crate::config::{
    BassBoostSettings, ChainSettings, CompressionSettings, EqualizerSettings, VirtualizerSettings,
};
use crate::engine::codec::{Sample, SampleCodec, SampleFormat};
use crate::error::{FxError, Result};

const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Whether a processed block was altered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// At least one effect changed the signal
    Active,
    /// The chain is disabled or idle; the host may bypass it
    Inactive,
}

impl ProcessStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessStatus::Active)
    }
}

/// The effects of the chain, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Compression,
    BassBoost,
    Virtualizer,
    Equalizer,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Compression,
        EffectKind::BassBoost,
        EffectKind::Virtualizer,
        EffectKind::Equalizer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Compression => "compression",
            EffectKind::BassBoost => "bass_boost",
            EffectKind::Virtualizer => "virtualizer",
            EffectKind::Equalizer => "equalizer",
        }
    }
}

/// Stereo effect chain
#[derive(Debug, Clone)]
pub struct EffectChain {
    enabled: bool,
    sample_rate: f64,
    codec: SampleCodec,
    compressor: Compressor,
    bass_boost: BassBoost,
    virtualizer: Virtualizer,
    equalizer: Equalizer,
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectChain {
    /// Create a chain at 44.1 kHz, 16-bit, with every effect disabled
    pub fn new() -> Self {
        let mut chain = Self {
            enabled: true,
            sample_rate: DEFAULT_SAMPLE_RATE,
            codec: SampleCodec::new(SampleFormat::Pcm16),
            compressor: Compressor::new(),
            bass_boost: BassBoost::new(),
            virtualizer: Virtualizer::new(),
            equalizer: Equalizer::new(),
        };
        chain.configure_effects();
        chain
    }

    /// Prepare for a stream
    ///
    /// Rejects anything but finite positive rates and two channels, leaving
    /// the chain untouched. On success all filters, delay lines and the
    /// codec are rebuilt for the new stream.
    pub fn configure(
        &mut self,
        sample_rate: f64,
        channels: u16,
        format: SampleFormat,
    ) -> Result<()> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            warn!("[CHAIN] Rejected sample rate {}", sample_rate);
            return Err(FxError::InvalidSampleRate { rate: sample_rate });
        }
        if channels != 2 {
            warn!("[CHAIN] Rejected channel count {}", channels);
            return Err(FxError::UnsupportedChannelCount { channels });
        }

        self.sample_rate = sample_rate;
        self.codec = SampleCodec::new(format);
        self.configure_effects();

        debug!("[CHAIN] Configured for {} Hz, {}", sample_rate, format);
        Ok(())
    }

    fn configure_effects(&mut self) {
        self.compressor.configure(self.sample_rate);
        self.bass_boost.configure(self.sample_rate);
        self.virtualizer.configure(self.sample_rate);
        self.equalizer.configure(self.sample_rate);
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn format(&self) -> SampleFormat {
        self.codec.format()
    }

    /// Master enable
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        debug!("[CHAIN] Master {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether the effect's own enable flag is set
    pub fn is_effect_enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Compression => self.compressor.is_enabled(),
            EffectKind::BassBoost => self.bass_boost.is_enabled(),
            EffectKind::Virtualizer => self.virtualizer.is_enabled(),
            EffectKind::Equalizer => self.equalizer.is_enabled(),
        }
    }

    /// Whether the effect currently alters the signal
    ///
    /// The compressor stays active while fading out; the equalizer only
    /// counts once its fade has started.
    pub fn is_effect_active(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Compression => self.compressor.is_active(),
            EffectKind::BassBoost => self.bass_boost.is_enabled(),
            EffectKind::Virtualizer => self.virtualizer.is_enabled(),
            EffectKind::Equalizer => self.equalizer.is_active(),
        }
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    pub fn bass_boost(&self) -> &BassBoost {
        &self.bass_boost
    }

    pub fn virtualizer(&self) -> &Virtualizer {
        &self.virtualizer
    }

    pub fn equalizer(&self) -> &Equalizer {
        &self.equalizer
    }

    /// Status the next block would report if nothing changed
    pub fn status(&self) -> ProcessStatus {
        let any_active = EffectKind::ALL
            .iter()
            .any(|kind| self.is_effect_active(*kind));
        if self.enabled && any_active {
            ProcessStatus::Active
        } else {
            ProcessStatus::Inactive
        }
    }

    /// Validate and apply one parameter
    pub fn set_parameter(&mut self, param: Parameter) -> Result<()> {
        if let Err(e) = param.validate() {
            warn!("[CHAIN] Rejected {}: {}", param.id(), e);
            return Err(e);
        }

        match param {
            Parameter::Enabled(on) => self.enabled = on,
            Parameter::CompressionEnabled(on) => self.compressor.set_enabled(on),
            Parameter::CompressionRatio(ratio) => self.compressor.set_ratio(ratio)?,
            Parameter::CompressionVolume(volume) => self.compressor.set_volume(volume)?,
            Parameter::BassBoostEnabled(on) => self.bass_boost.set_enabled(on),
            Parameter::BassBoostStrength(strength) => self.bass_boost.set_strength(strength)?,
            Parameter::BassBoostCenterFrequency(frequency) => {
                self.bass_boost.set_center_frequency(frequency)?
            }
            Parameter::EqualizerEnabled(on) => self.equalizer.set_enabled(on),
            Parameter::EqualizerBandLevel { band, gain_db } => {
                self.equalizer.set_band_level(band, gain_db)?
            }
            Parameter::EqualizerLoudnessCorrection(on) => self.equalizer.set_loudness_correction(on),
            Parameter::EqualizerLoudnessReference(reference) => {
                self.equalizer.set_loudness_reference(reference)?
            }
            Parameter::VirtualizerEnabled(on) => self.virtualizer.set_enabled(on),
            Parameter::VirtualizerStrength(strength) => self.virtualizer.set_strength(strength)?,
        }

        debug!("[CHAIN] Set {:?}", param);
        Ok(())
    }

    /// Read back one parameter
    pub fn parameter(&self, id: ParameterId) -> Result<Parameter> {
        let param = match id {
            ParameterId::Enabled => Parameter::Enabled(self.enabled),
            ParameterId::CompressionEnabled => {
                Parameter::CompressionEnabled(self.compressor.is_enabled())
            }
            ParameterId::CompressionRatio => Parameter::CompressionRatio(self.compressor.ratio()),
            ParameterId::CompressionVolume => Parameter::CompressionVolume(self.compressor.volume()),
            ParameterId::BassBoostEnabled => Parameter::BassBoostEnabled(self.bass_boost.is_enabled()),
            ParameterId::BassBoostStrength => {
                Parameter::BassBoostStrength(self.bass_boost.strength())
            }
            ParameterId::BassBoostCenterFrequency => {
                Parameter::BassBoostCenterFrequency(self.bass_boost.center_frequency())
            }
            ParameterId::EqualizerEnabled => Parameter::EqualizerEnabled(self.equalizer.is_enabled()),
            ParameterId::EqualizerBandLevel(band) => {
                let gain_db = self.equalizer.band_level(band).ok_or_else(|| {
                    FxError::invalid_parameter("equalizer.band_level.band", band, "0 to 5")
                })?;
                Parameter::EqualizerBandLevel { band, gain_db }
            }
            ParameterId::EqualizerLoudnessCorrection => {
                Parameter::EqualizerLoudnessCorrection(self.equalizer.loudness_correction())
            }
            ParameterId::EqualizerLoudnessReference => {
                Parameter::EqualizerLoudnessReference(self.equalizer.loudness_reference())
            }
            ParameterId::VirtualizerEnabled => {
                Parameter::VirtualizerEnabled(self.virtualizer.is_enabled())
            }
            ParameterId::VirtualizerStrength => {
                Parameter::VirtualizerStrength(self.virtualizer.strength())
            }
        };
        Ok(param)
    }

    /// Set a single parameter by dotted name
    pub fn set_param(&mut self, name: &str, value: &Value) -> Result<()> {
        let param = Parameter::from_json(name, value).map_err(|e| {
            warn!("[CHAIN] Rejected {}: {}", name, e);
            e
        })?;
        self.set_parameter(param)
    }

    /// Get all parameters as JSON, keyed like [`ChainSettings`]
    pub fn get_params(&self) -> Value {
        json!({
            "enabled": self.enabled,
            "compression": {
                "enabled": self.compressor.is_enabled(),
                "ratio": self.compressor.ratio(),
                "volume": self.compressor.volume(),
            },
            "bass_boost": {
                "enabled": self.bass_boost.is_enabled(),
                "strength": self.bass_boost.strength(),
                "center_frequency": self.bass_boost.center_frequency(),
            },
            "equalizer": {
                "enabled": self.equalizer.is_enabled(),
                "band_levels": self.equalizer.band_levels(),
                "loudness_correction": self.equalizer.loudness_correction(),
                "loudness_reference": self.equalizer.loudness_reference(),
            },
            "virtualizer": {
                "enabled": self.virtualizer.is_enabled(),
                "strength": self.virtualizer.strength(),
            },
        })
    }

    /// Apply a preset; nothing changes unless every value is valid
    pub fn apply_settings(&mut self, settings: &ChainSettings) -> Result<()> {
        let params = settings.to_parameters();
        if let Err(e) = params.iter().try_for_each(Parameter::validate) {
            warn!("[CHAIN] Rejected settings: {}", e);
            return Err(e);
        }
        for param in params {
            self.set_parameter(param)?;
        }
        debug!("[CHAIN] Applied settings");
        Ok(())
    }

    /// Current configuration as a preset
    pub fn settings(&self) -> ChainSettings {
        ChainSettings {
            enabled: self.enabled,
            compression: CompressionSettings {
                enabled: self.compressor.is_enabled(),
                ratio: self.compressor.ratio(),
                volume: self.compressor.volume(),
            },
            bass_boost: BassBoostSettings {
                enabled: self.bass_boost.is_enabled(),
                strength: self.bass_boost.strength(),
                center_frequency: self.bass_boost.center_frequency(),
            },
            equalizer: EqualizerSettings {
                enabled: self.equalizer.is_enabled(),
                band_levels: self.equalizer.band_levels(),
                loudness_correction: self.equalizer.loudness_correction(),
                loudness_reference: self.equalizer.loudness_reference(),
            },
            virtualizer: VirtualizerSettings {
                enabled: self.virtualizer.is_enabled(),
                strength: self.virtualizer.strength(),
            },
        }
    }

    /// Process one block of interleaved stereo samples
    ///
    /// `input` and `output` must have the same even length and use the
    /// configured sample type. Once the shape checks pass processing cannot
    /// fail.
    pub fn process<S: Sample>(
        &mut self,
        input: &[S],
        output: &mut [S],
    ) -> Result<ProcessStatus> {
        self.codec.check::<S>()?;
        if input.len() != output.len() {
            return Err(FxError::BufferMismatch {
                reason: format!(
                    "input has {} samples, output has {}",
                    input.len(),
                    output.len()
                ),
            });
        }
        if input.len() % 2 != 0 {
            return Err(FxError::BufferMismatch {
                reason: format!("{} samples is not a whole number of stereo frames", input.len()),
            });
        }

        let frame_count = input.len() / 2;
        let codec = &self.codec;
        let compressing = self
            .compressor
            .begin_block((0..frame_count).map(|i| codec.decode_frame(input, i)), frame_count);

        let boosting = self.bass_boost.is_enabled();
        let virtualizing = self.virtualizer.is_enabled();
        let equalizing = self.equalizer.is_enabled();
        let power_weight = self.codec.format().power_weight();

        for i in 0..frame_count {
            let mut frame = self.codec.decode_frame(input, i);
            if compressing {
                frame = self.compressor.apply(frame);
            }
            if boosting {
                frame = self.bass_boost.process(frame);
            }
            if virtualizing {
                frame = self.virtualizer.process(frame);
            }
            if equalizing {
                frame = self.equalizer.process(frame, power_weight);
            }
            self.codec.encode_frame(output, i, frame);
        }

        Ok(self.status())
    }

    /// Clear all filter and delay history
    pub fn reset(&mut self) {
        self.compressor.reset();
        self.bass_boost.reset();
        self.virtualizer.reset();
        self.equalizer.reset();
    }
}
