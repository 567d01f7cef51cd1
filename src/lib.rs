//! headfx - Real-time stereo headphone effects
//!
//! A chain of four effects applied sample by sample to interleaved stereo
//! PCM, with click-free parameter changes:
//! - Compression: loudness-driven gain riding toward a fixed target level
//! - Bass boost: resonant low-pass on the mono sum, added back
//! - Virtualizer: cross-fed delays plus a mid/side localization shelf
//! - Equalizer: six bands with optional equal-loudness compensation
//!
//! # Example
//!
//! ```
//! use headfx::dsp::{EffectChain, Parameter};
//! use headfx::engine::SampleFormat;
//!
//! let mut chain = EffectChain::new();
//! chain.configure(48000.0, 2, SampleFormat::Pcm16)?;
//! chain.set_parameter(Parameter::BassBoostStrength(600))?;
//! chain.set_parameter(Parameter::BassBoostEnabled(true))?;
//!
//! let input = vec![0i16; 512];
//! let mut output = vec![0i16; 512];
//! let status = chain.process(&input, &mut output)?;
//! assert!(status.is_active());
//! # Ok::<(), headfx::FxError>(())
//! ```

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use error::{FxError, Result};
