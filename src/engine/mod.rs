//! Audio Engine Module
//!
//! Everything between the host's samples and the effect chain:
//! - Sample codec (encodings, dither)
//! - WAV file I/O and offline block processing

pub mod codec;
pub mod io;

pub use codec::{Dither, Sample, SampleCodec, SampleFormat};
pub use io::{
    generate_test_tone, process_audio, process_file, read_wav, write_wav, AudioData,
    ProcessOptions, ProcessReport, StereoAudio,
};
