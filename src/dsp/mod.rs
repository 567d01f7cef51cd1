//! DSP Effects Library
//!
//! Building blocks (biquad, delay line, FIR) and the four effects composed
//! by [`EffectChain`]: compressor, bass boost, equalizer and virtualizer.
//! Everything here works on [`Frame`]s in internal units; host encodings are
//! handled by [`crate::engine::codec`].

pub mod bass_boost;
pub mod biquad;
mod chain;
pub mod compressor;
pub mod delay;
pub mod equalizer;
pub mod fir;
mod params;
pub mod virtualizer;

pub use bass_boost::BassBoost;
pub use biquad::{Biquad, BiquadCoefficients, FilterDesign};
pub use chain::{EffectChain, EffectKind, ProcessStatus};
pub use compressor::Compressor;
pub use delay::DelayLine;
pub use equalizer::Equalizer;
pub use fir::Fir16;
pub use params::{Parameter, ParameterId};
pub use virtualizer::Virtualizer;

/// One stereo sample pair in internal units
pub type Frame = [f64; 2];

/// Number of steps an effect takes to fade fully in or out
pub const FADE_STEPS: u8 = 100;
