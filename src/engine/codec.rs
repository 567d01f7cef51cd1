//! Sample codec
//!
//! Converts host samples to and from the internal double-precision unit at
//! the block boundary. The encoding is chosen once per session; effects only
//! ever see [`Frame`]s.
//!
//! Internal scale:
//! - 16-bit PCM is multiplied by 256, giving a ~24-bit range
//! - float PCM is multiplied by 1e6
//! - 32-bit PCM is used as is

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::dsp::Frame;
use crate::error::{FxError, Result};

/// Scale from 16-bit PCM to internal units
const PCM16_SCALE: f64 = 256.0;

/// Scale from normalized float PCM to internal units
const FLOAT_SCALE: f64 = 1e6;

/// Default dither seed so renders are reproducible
const DEFAULT_DITHER_SEED: u64 = 0x5eed_d17e;

/// Host sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// Signed 16-bit PCM
    #[default]
    Pcm16,
    /// Normalized 32-bit float PCM
    Float,
    /// Signed 32-bit PCM
    Pcm32,
}

impl SampleFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::Pcm16 => "pcm16",
            SampleFormat::Float => "float",
            SampleFormat::Pcm32 => "pcm32",
        }
    }

    /// Weight applied to squared samples by the equalizer's loudness meter
    ///
    /// Float input sits roughly 17 dB below the 16-bit internal scale.
    pub fn power_weight(&self) -> f64 {
        match self {
            SampleFormat::Float => 50.0,
            SampleFormat::Pcm16 | SampleFormat::Pcm32 => 1.0,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pcm16" | "s16" | "i16" => Ok(SampleFormat::Pcm16),
            "float" | "f32" => Ok(SampleFormat::Float),
            "pcm32" | "s32" | "i32" => Ok(SampleFormat::Pcm32),
            _ => Err(FxError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// High-passed triangular dither
///
/// Each value is the difference of two successive uniform bytes, so the
/// output spans -255..=255 with a triangular density.
#[derive(Debug, Clone)]
pub struct Dither {
    rng: SmallRng,
    previous: u8,
}

impl Dither {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_DITHER_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            previous: 0,
        }
    }

    #[inline]
    pub fn next_value(&mut self) -> i32 {
        let fresh: u8 = self.rng.gen();
        let value = i32::from(self.previous) - i32::from(fresh);
        self.previous = fresh;
        value
    }
}

impl Default for Dither {
    fn default() -> Self {
        Self::new()
    }
}

/// A host sample type
pub trait Sample: Copy + Send + 'static {
    /// Encoding this type represents
    const FORMAT: SampleFormat;

    /// Convert to internal units
    fn decode(self) -> f64;

    /// Convert from internal units, saturating at the type's range
    fn encode(value: f64, dither: &mut Dither) -> Self;
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::Pcm16;

    #[inline]
    fn decode(self) -> f64 {
        f64::from(self) * PCM16_SCALE
    }

    #[inline]
    fn encode(value: f64, dither: &mut Dither) -> Self {
        let scaled = (value + f64::from(dither.next_value())) / PCM16_SCALE;
        scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::Float;

    #[inline]
    fn decode(self) -> f64 {
        f64::from(self) * FLOAT_SCALE
    }

    #[inline]
    fn encode(value: f64, _dither: &mut Dither) -> Self {
        (value / FLOAT_SCALE) as f32
    }
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::Pcm32;

    #[inline]
    fn decode(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn encode(value: f64, _dither: &mut Dither) -> Self {
        // `as` saturates and maps NaN to zero
        value as i32
    }
}

/// Per-session codec: one encoding plus its dither state
#[derive(Debug, Clone, Default)]
pub struct SampleCodec {
    format: SampleFormat,
    dither: Dither,
}

impl SampleCodec {
    pub fn new(format: SampleFormat) -> Self {
        Self {
            format,
            dither: Dither::new(),
        }
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Fail unless `S` is the configured encoding
    pub fn check<S: Sample>(&self) -> Result<()> {
        if S::FORMAT == self.format {
            Ok(())
        } else {
            Err(FxError::FormatMismatch {
                expected: self.format.name(),
                actual: S::FORMAT.name(),
            })
        }
    }

    /// Read interleaved frame `index` from `block`
    #[inline]
    pub fn decode_frame<S: Sample>(&self, block: &[S], index: usize) -> Frame {
        [block[2 * index].decode(), block[2 * index + 1].decode()]
    }

    /// Write `frame` to interleaved position `index` of `block`
    #[inline]
    pub fn encode_frame<S: Sample>(&mut self, block: &mut [S], index: usize, frame: Frame) {
        block[2 * index] = S::encode(frame[0], &mut self.dither);
        block[2 * index + 1] = S::encode(frame[1], &mut self.dither);
    }
}
