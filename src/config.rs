//! Chain presets
//!
//! [`ChainSettings`] is the serialisable form of every knob on an
//! [`EffectChain`](crate::dsp::EffectChain). Presets are stored as JSON and
//! applied through the same validated parameter path as live edits, so a
//! preset is either applied completely or not at all.
//!
//! Missing fields take their defaults, which leaves every effect disabled.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::bass_boost::DEFAULT_CENTER_FREQUENCY_HZ;
use crate::dsp::equalizer::NUM_BANDS;
use crate::dsp::Parameter;
use crate::error::{FxError, Result};

/// Full chain configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Master enable
    pub enabled: bool,
    pub compression: CompressionSettings,
    pub bass_boost: BassBoostSettings,
    pub equalizer: EqualizerSettings,
    pub virtualizer: VirtualizerSettings,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            compression: CompressionSettings::default(),
            bass_boost: BassBoostSettings::default(),
            equalizer: EqualizerSettings::default(),
            virtualizer: VirtualizerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub enabled: bool,
    /// 1.0 to 11.0
    pub ratio: f64,
    /// Linear volume per channel, 0.0 to 1.0
    pub volume: [f64; 2],
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ratio: 1.0,
            volume: [1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BassBoostSettings {
    pub enabled: bool,
    /// 0 to 1000
    pub strength: u16,
    /// Hz, 20 to 500
    pub center_frequency: f64,
}

impl Default for BassBoostSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            strength: 0,
            center_frequency: DEFAULT_CENTER_FREQUENCY_HZ,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerSettings {
    pub enabled: bool,
    /// dB per band, -10.0 to 10.0
    pub band_levels: [f64; NUM_BANDS],
    pub loudness_correction: bool,
    /// dB added to the measured loudness, -100.0 to 100.0
    pub loudness_reference: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualizerSettings {
    pub enabled: bool,
    /// 0 to 1000
    pub strength: u16,
}

impl ChainSettings {
    /// Parse settings from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize settings as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a preset file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| FxError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings = Self::from_json_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write the preset to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json_string()?;
        fs::write(path, content).map_err(|e| FxError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Check every value against its range
    pub fn validate(&self) -> Result<()> {
        self.to_parameters().iter().try_for_each(Parameter::validate)
    }

    /// Expand into individual parameter sets
    ///
    /// Enable flags come last so effects are switched on with their final
    /// configuration already in place.
    pub fn to_parameters(&self) -> Vec<Parameter> {
        let mut params = vec![
            Parameter::CompressionRatio(self.compression.ratio),
            Parameter::CompressionVolume(self.compression.volume),
            Parameter::BassBoostStrength(self.bass_boost.strength),
            Parameter::BassBoostCenterFrequency(self.bass_boost.center_frequency),
        ];
        params.extend(
            self.equalizer
                .band_levels
                .iter()
                .enumerate()
                .map(|(band, &gain_db)| Parameter::EqualizerBandLevel { band, gain_db }),
        );
        params.extend([
            Parameter::EqualizerLoudnessCorrection(self.equalizer.loudness_correction),
            Parameter::EqualizerLoudnessReference(self.equalizer.loudness_reference),
            Parameter::VirtualizerStrength(self.virtualizer.strength),
            Parameter::CompressionEnabled(self.compression.enabled),
            Parameter::BassBoostEnabled(self.bass_boost.enabled),
            Parameter::EqualizerEnabled(self.equalizer.enabled),
            Parameter::VirtualizerEnabled(self.virtualizer.enabled),
            Parameter::Enabled(self.enabled),
        ]);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_settings() -> ChainSettings {
        ChainSettings {
            enabled: true,
            compression: CompressionSettings {
                enabled: true,
                ratio: 3.0,
                volume: [0.8, 0.8],
            },
            bass_boost: BassBoostSettings {
                enabled: true,
                strength: 600,
                center_frequency: 70.0,
            },
            equalizer: EqualizerSettings {
                enabled: true,
                band_levels: [3.0, 1.5, 0.0, -1.0, 2.0, 4.0],
                loudness_correction: true,
                loudness_reference: -10.0,
            },
            virtualizer: VirtualizerSettings {
                enabled: false,
                strength: 250,
            },
        }
    }

    #[test]
    fn test_defaults_disable_everything() {
        let settings = ChainSettings::default();
        assert!(settings.enabled);
        assert!(!settings.compression.enabled);
        assert!(!settings.bass_boost.enabled);
        assert!(!settings.equalizer.enabled);
        assert!(!settings.virtualizer.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            ChainSettings::from_json_str(r#"{"bass_boost": {"enabled": true, "strength": 1000}}"#)
                .unwrap();

        let expected = ChainSettings {
            bass_boost: BassBoostSettings {
                enabled: true,
                strength: 1000,
                center_frequency: 55.0,
            },
            ..ChainSettings::default()
        };
        assert_eq!(settings, expected);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preset.json");

        let settings = sample_settings();
        settings.save(&path).unwrap();
        let loaded = ChainSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_rejects_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loud.json");
        std::fs::write(&path, r#"{"compression": {"ratio": 20.0}}"#).unwrap();

        let err = ChainSettings::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = ChainSettings::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_ERROR");
    }

    #[test]
    fn test_malformed_json() {
        let err = ChainSettings::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_parameters_end_with_enables() {
        let params = sample_settings().to_parameters();
        assert_eq!(params.len(), 4 + NUM_BANDS + 3 + 5);
        assert_eq!(params.last(), Some(&Parameter::Enabled(true)));
        assert!(params.contains(&Parameter::EqualizerBandLevel {
            band: 5,
            gain_db: 4.0
        }));
    }
}
