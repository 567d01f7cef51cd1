//! Parameter surface
//!
//! Every knob of the chain is one [`Parameter`] variant. Values are checked
//! by [`Parameter::validate`] before anything is mutated, so a rejected set
//! leaves the chain exactly as it was.
//!
//! String-keyed hosts address parameters by dotted name:
//!
//! | name                              | value                          |
//! |-----------------------------------|--------------------------------|
//! | `enabled`                         | bool                           |
//! | `compression.enabled`             | bool                           |
//! | `compression.ratio`               | number, 1.0 to 11.0            |
//! | `compression.volume`              | `[left, right]`, 0.0 to 1.0    |
//! | `bass_boost.enabled`              | bool                           |
//! | `bass_boost.strength`             | integer, 0 to 1000             |
//! | `bass_boost.center_frequency`     | number, 20 to 500 Hz           |
//! | `equalizer.enabled`               | bool                           |
//! | `equalizer.band_level`            | `{"band": 0-5, "gain_db": ..}` |
//! | `equalizer.loudness_correction`   | bool                           |
//! | `equalizer.loudness_reference`    | number, -100 to 100 dB         |
//! | `virtualizer.enabled`             | bool                           |
//! | `virtualizer.strength`            | integer, 0 to 1000             |

use std::fmt;

use serde_json::Value;

use super::{bass_boost, compressor, equalizer, virtualizer};
use crate::error::{FxError, Result};

const BAND_LEVEL_SHAPE: &str = "{\"band\": integer, \"gain_db\": number}";

/// A parameter together with its value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    /// Master enable; only affects the reported status
    Enabled(bool),
    CompressionEnabled(bool),
    CompressionRatio(f64),
    CompressionVolume([f64; 2]),
    BassBoostEnabled(bool),
    BassBoostStrength(u16),
    BassBoostCenterFrequency(f64),
    EqualizerEnabled(bool),
    EqualizerBandLevel { band: usize, gain_db: f64 },
    EqualizerLoudnessCorrection(bool),
    EqualizerLoudnessReference(f64),
    VirtualizerEnabled(bool),
    VirtualizerStrength(u16),
}

/// Identifies a parameter without a value, for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    Enabled,
    CompressionEnabled,
    CompressionRatio,
    CompressionVolume,
    BassBoostEnabled,
    BassBoostStrength,
    BassBoostCenterFrequency,
    EqualizerEnabled,
    EqualizerBandLevel(usize),
    EqualizerLoudnessCorrection,
    EqualizerLoudnessReference,
    VirtualizerEnabled,
    VirtualizerStrength,
}

impl ParameterId {
    /// Dotted name used by string-keyed hosts
    pub fn name(&self) -> &'static str {
        match self {
            ParameterId::Enabled => "enabled",
            ParameterId::CompressionEnabled => "compression.enabled",
            ParameterId::CompressionRatio => "compression.ratio",
            ParameterId::CompressionVolume => "compression.volume",
            ParameterId::BassBoostEnabled => "bass_boost.enabled",
            ParameterId::BassBoostStrength => "bass_boost.strength",
            ParameterId::BassBoostCenterFrequency => "bass_boost.center_frequency",
            ParameterId::EqualizerEnabled => "equalizer.enabled",
            ParameterId::EqualizerBandLevel(_) => "equalizer.band_level",
            ParameterId::EqualizerLoudnessCorrection => "equalizer.loudness_correction",
            ParameterId::EqualizerLoudnessReference => "equalizer.loudness_reference",
            ParameterId::VirtualizerEnabled => "virtualizer.enabled",
            ParameterId::VirtualizerStrength => "virtualizer.strength",
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterId::EqualizerBandLevel(band) => write!(f, "{}[{}]", self.name(), band),
            _ => f.write_str(self.name()),
        }
    }
}

impl Parameter {
    pub fn id(&self) -> ParameterId {
        match *self {
            Parameter::Enabled(_) => ParameterId::Enabled,
            Parameter::CompressionEnabled(_) => ParameterId::CompressionEnabled,
            Parameter::CompressionRatio(_) => ParameterId::CompressionRatio,
            Parameter::CompressionVolume(_) => ParameterId::CompressionVolume,
            Parameter::BassBoostEnabled(_) => ParameterId::BassBoostEnabled,
            Parameter::BassBoostStrength(_) => ParameterId::BassBoostStrength,
            Parameter::BassBoostCenterFrequency(_) => ParameterId::BassBoostCenterFrequency,
            Parameter::EqualizerEnabled(_) => ParameterId::EqualizerEnabled,
            Parameter::EqualizerBandLevel { band, .. } => ParameterId::EqualizerBandLevel(band),
            Parameter::EqualizerLoudnessCorrection(_) => ParameterId::EqualizerLoudnessCorrection,
            Parameter::EqualizerLoudnessReference(_) => ParameterId::EqualizerLoudnessReference,
            Parameter::VirtualizerEnabled(_) => ParameterId::VirtualizerEnabled,
            Parameter::VirtualizerStrength(_) => ParameterId::VirtualizerStrength,
        }
    }

    /// Check the value against its range without touching any effect
    pub fn validate(&self) -> Result<()> {
        let name = self.id().name();
        match *self {
            Parameter::CompressionRatio(ratio) => {
                check_range(name, ratio, compressor::MIN_RATIO, compressor::MAX_RATIO)
            }
            Parameter::CompressionVolume(volume) => volume
                .iter()
                .try_for_each(|v| check_range(name, *v, 0.0, 1.0)),
            Parameter::BassBoostStrength(strength) => {
                check_strength(name, strength, bass_boost::MAX_STRENGTH)
            }
            Parameter::BassBoostCenterFrequency(frequency) => check_range(
                name,
                frequency,
                bass_boost::MIN_CENTER_FREQUENCY_HZ,
                bass_boost::MAX_CENTER_FREQUENCY_HZ,
            ),
            Parameter::EqualizerBandLevel { band, gain_db } => {
                if band >= equalizer::NUM_BANDS {
                    return Err(FxError::invalid_parameter(
                        "equalizer.band_level.band",
                        band,
                        "0 to 5",
                    ));
                }
                check_range(
                    name,
                    gain_db,
                    equalizer::MIN_BAND_LEVEL_DB,
                    equalizer::MAX_BAND_LEVEL_DB,
                )
            }
            Parameter::EqualizerLoudnessReference(reference) => check_range(
                name,
                reference,
                equalizer::MIN_LOUDNESS_REFERENCE_DB,
                equalizer::MAX_LOUDNESS_REFERENCE_DB,
            ),
            Parameter::VirtualizerStrength(strength) => {
                check_strength(name, strength, virtualizer::MAX_STRENGTH)
            }
            Parameter::Enabled(_)
            | Parameter::CompressionEnabled(_)
            | Parameter::BassBoostEnabled(_)
            | Parameter::EqualizerEnabled(_)
            | Parameter::EqualizerLoudnessCorrection(_)
            | Parameter::VirtualizerEnabled(_) => Ok(()),
        }
    }

    /// Parse a dotted name and JSON value
    ///
    /// Only the value's type is checked here; ranges are left to
    /// [`Parameter::validate`].
    pub fn from_json(name: &str, value: &Value) -> Result<Self> {
        let param = match name {
            "enabled" => Parameter::Enabled(expect_bool(name, value)?),
            "compression.enabled" => Parameter::CompressionEnabled(expect_bool(name, value)?),
            "compression.ratio" => Parameter::CompressionRatio(expect_f64(name, value)?),
            "compression.volume" => Parameter::CompressionVolume(expect_pair(name, value)?),
            "bass_boost.enabled" => Parameter::BassBoostEnabled(expect_bool(name, value)?),
            "bass_boost.strength" => Parameter::BassBoostStrength(expect_u16(name, value)?),
            "bass_boost.center_frequency" => {
                Parameter::BassBoostCenterFrequency(expect_f64(name, value)?)
            }
            "equalizer.enabled" => Parameter::EqualizerEnabled(expect_bool(name, value)?),
            "equalizer.band_level" => {
                let band = value
                    .get("band")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| mistyped(name, value, BAND_LEVEL_SHAPE))?;
                let gain_db = value
                    .get("gain_db")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| mistyped(name, value, BAND_LEVEL_SHAPE))?;
                Parameter::EqualizerBandLevel {
                    band: usize::try_from(band).unwrap_or(usize::MAX),
                    gain_db,
                }
            }
            "equalizer.loudness_correction" => {
                Parameter::EqualizerLoudnessCorrection(expect_bool(name, value)?)
            }
            "equalizer.loudness_reference" => {
                Parameter::EqualizerLoudnessReference(expect_f64(name, value)?)
            }
            "virtualizer.enabled" => Parameter::VirtualizerEnabled(expect_bool(name, value)?),
            "virtualizer.strength" => Parameter::VirtualizerStrength(expect_u16(name, value)?),
            _ => {
                return Err(FxError::UnknownParameter {
                    name: name.to_string(),
                })
            }
        };
        Ok(param)
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(FxError::invalid_parameter(
            name,
            value,
            format!("{} to {}", min, max),
        ))
    }
}

fn check_strength(name: &str, value: u16, max: u16) -> Result<()> {
    if value <= max {
        Ok(())
    } else {
        Err(FxError::invalid_parameter(name, value, format!("0 to {}", max)))
    }
}

fn mistyped(name: &str, value: &Value, expected: &str) -> FxError {
    FxError::invalid_parameter(name, value, expected)
}

fn expect_bool(name: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| mistyped(name, value, "bool"))
}

fn expect_f64(name: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| mistyped(name, value, "number"))
}

fn expect_u16(name: &str, value: &Value) -> Result<u16> {
    value
        .as_u64()
        .and_then(|v| u16::try_from(v).ok())
        .ok_or_else(|| mistyped(name, value, "integer"))
}

/// Accepts `[left, right]` or a single number applied to both channels
fn expect_pair(name: &str, value: &Value) -> Result<[f64; 2]> {
    if let Some(v) = value.as_f64() {
        return Ok([v, v]);
    }
    match value.as_array().map(Vec::as_slice) {
        Some([left, right]) => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => Ok([l, r]),
            _ => Err(mistyped(name, value, "[number, number]")),
        },
        _ => Err(mistyped(name, value, "[number, number]")),
    }
}
