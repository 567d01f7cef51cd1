//! WAV file I/O for headfx
//!
//! Offline bridge between WAV files and the effect chain. Files are read
//! into interleaved stereo in one of the chain's three encodings, processed
//! block by block exactly as a host would stream them, and written back.
//!
//! Mapping from WAV to chain encodings:
//! - 16-bit integer: `pcm16`
//! - 24-bit integer: `pcm32` (shifted up by 8 bits)
//! - 32-bit integer: `pcm32`
//! - 32-bit float: `float`
//!
//! Mono files are duplicated to both channels.

use std::path::Path;

use hound::{SampleFormat as WavSampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::config::ChainSettings;
use crate::dsp::EffectChain;
use crate::engine::codec::{Sample, SampleFormat};
use crate::error::{FxError, Result};

/// Default number of frames per processed block
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Interleaved stereo samples in one encoding
#[derive(Debug, Clone, PartialEq)]
pub enum AudioData {
    Pcm16(Vec<i16>),
    Float(Vec<f32>),
    Pcm32(Vec<i32>),
}

impl AudioData {
    pub fn format(&self) -> SampleFormat {
        match self {
            AudioData::Pcm16(_) => SampleFormat::Pcm16,
            AudioData::Float(_) => SampleFormat::Float,
            AudioData::Pcm32(_) => SampleFormat::Pcm32,
        }
    }

    /// Number of samples across both channels
    pub fn len(&self) -> usize {
        match self {
            AudioData::Pcm16(s) => s.len(),
            AudioData::Float(s) => s.len(),
            AudioData::Pcm32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-encode to `format`, keeping full scale at full scale
    pub fn convert(self, format: SampleFormat) -> AudioData {
        if self.format() == format {
            return self;
        }
        let normalized: Vec<f64> = match self {
            AudioData::Pcm16(s) => s.iter().map(|&v| f64::from(v) / 32768.0).collect(),
            AudioData::Float(s) => s.iter().map(|&v| f64::from(v)).collect(),
            AudioData::Pcm32(s) => s.iter().map(|&v| f64::from(v) / 2_147_483_648.0).collect(),
        };
        match format {
            SampleFormat::Pcm16 => AudioData::Pcm16(
                normalized
                    .iter()
                    .map(|v| (v * 32768.0).round().clamp(-32768.0, 32767.0) as i16)
                    .collect(),
            ),
            SampleFormat::Float => {
                AudioData::Float(normalized.iter().map(|&v| v as f32).collect())
            }
            SampleFormat::Pcm32 => AudioData::Pcm32(
                normalized
                    .iter()
                    .map(|v| (v * 2_147_483_648.0).round() as i32)
                    .collect(),
            ),
        }
    }
}

/// A stereo recording
#[derive(Debug, Clone, PartialEq)]
pub struct StereoAudio {
    pub sample_rate: u32,
    pub data: AudioData,
}

impl StereoAudio {
    pub fn frames(&self) -> usize {
        self.data.len() / 2
    }

    pub fn format(&self) -> SampleFormat {
        self.data.format()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Block options for offline processing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOptions {
    /// Encoding to process and write in; `None` keeps the file's own
    pub format: Option<SampleFormat>,
    /// Frames per block handed to the chain
    pub block_size: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            format: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Outcome of an offline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessReport {
    pub frames: usize,
    pub blocks: usize,
    /// Blocks after which the chain reported itself active
    pub active_blocks: usize,
}

/// Read a WAV file as interleaved stereo
pub fn read_wav(path: &Path) -> Result<StereoAudio> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let data = match (spec.sample_format, spec.bits_per_sample) {
        (WavSampleFormat::Int, 16) => {
            AudioData::Pcm16(reader.samples::<i16>().collect::<std::result::Result<_, _>>()?)
        }
        (WavSampleFormat::Int, 24) => AudioData::Pcm32(
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v << 8))
                .collect::<std::result::Result<_, _>>()?,
        ),
        (WavSampleFormat::Int, 32) => {
            AudioData::Pcm32(reader.samples::<i32>().collect::<std::result::Result<_, _>>()?)
        }
        (WavSampleFormat::Float, 32) => {
            AudioData::Float(reader.samples::<f32>().collect::<std::result::Result<_, _>>()?)
        }
        (format, bits) => {
            return Err(FxError::UnsupportedFormat {
                format: format!("{}-bit {:?} WAV", bits, format),
            })
        }
    };

    let data = match spec.channels {
        1 => upmix(data),
        2 => data,
        channels => return Err(FxError::UnsupportedChannelCount { channels }),
    };

    debug!(
        "Read {} ({} Hz, {}, {} ch)",
        path.display(),
        spec.sample_rate,
        data.format(),
        spec.channels
    );

    Ok(StereoAudio {
        sample_rate: spec.sample_rate,
        data,
    })
}

/// Write interleaved stereo to a WAV file
pub fn write_wav(path: &Path, audio: &StereoAudio) -> Result<()> {
    let (bits_per_sample, sample_format) = match audio.format() {
        SampleFormat::Pcm16 => (16, WavSampleFormat::Int),
        SampleFormat::Float => (32, WavSampleFormat::Float),
        SampleFormat::Pcm32 => (32, WavSampleFormat::Int),
    };
    let spec = WavSpec {
        channels: 2,
        sample_rate: audio.sample_rate,
        bits_per_sample,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec)?;
    match &audio.data {
        AudioData::Pcm16(samples) => write_all(&mut writer, samples)?,
        AudioData::Float(samples) => write_all(&mut writer, samples)?,
        AudioData::Pcm32(samples) => write_all(&mut writer, samples)?,
    }
    writer.finalize()?;

    Ok(())
}

fn write_all<W, S>(writer: &mut WavWriter<W>, samples: &[S]) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
    S: hound::Sample + Copy,
{
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    Ok(())
}

fn upmix(data: AudioData) -> AudioData {
    fn duplicate<S: Copy>(mono: Vec<S>) -> Vec<S> {
        mono.into_iter().flat_map(|s| [s, s]).collect()
    }
    match data {
        AudioData::Pcm16(s) => AudioData::Pcm16(duplicate(s)),
        AudioData::Float(s) => AudioData::Float(duplicate(s)),
        AudioData::Pcm32(s) => AudioData::Pcm32(duplicate(s)),
    }
}

/// Stream `audio` through a configured chain, block by block
pub fn process_audio(
    chain: &mut EffectChain,
    audio: &StereoAudio,
    block_size: usize,
) -> Result<(StereoAudio, ProcessReport)> {
    if block_size == 0 {
        return Err(FxError::invalid_parameter("block_size", 0, "at least 1 frame"));
    }

    let (data, report) = match &audio.data {
        AudioData::Pcm16(s) => {
            let (out, report) = process_samples(chain, s, block_size)?;
            (AudioData::Pcm16(out), report)
        }
        AudioData::Float(s) => {
            let (out, report) = process_samples(chain, s, block_size)?;
            (AudioData::Float(out), report)
        }
        AudioData::Pcm32(s) => {
            let (out, report) = process_samples(chain, s, block_size)?;
            (AudioData::Pcm32(out), report)
        }
    };

    Ok((
        StereoAudio {
            sample_rate: audio.sample_rate,
            data,
        },
        report,
    ))
}

fn process_samples<S: Sample + Default>(
    chain: &mut EffectChain,
    input: &[S],
    block_size: usize,
) -> Result<(Vec<S>, ProcessReport)> {
    let mut output = vec![S::default(); input.len()];
    let mut report = ProcessReport {
        frames: input.len() / 2,
        ..ProcessReport::default()
    };

    for (block_in, block_out) in input
        .chunks(block_size * 2)
        .zip(output.chunks_mut(block_size * 2))
    {
        if chain.process(block_in, block_out)?.is_active() {
            report.active_blocks += 1;
        }
        report.blocks += 1;
    }

    Ok((output, report))
}

/// Process one WAV file with `settings` and write the result
pub fn process_file(
    input: &Path,
    output: &Path,
    settings: &ChainSettings,
    options: ProcessOptions,
) -> Result<ProcessReport> {
    let mut audio = read_wav(input)?;
    if let Some(format) = options.format {
        audio.data = audio.data.convert(format);
    }

    let mut chain = EffectChain::new();
    chain.configure(f64::from(audio.sample_rate), 2, audio.format())?;
    chain.apply_settings(settings)?;

    let (processed, report) = process_audio(&mut chain, &audio, options.block_size)?;
    write_wav(output, &processed)?;

    debug!(
        "Processed {} -> {}: {} frames in {} blocks",
        input.display(),
        output.display(),
        report.frames,
        report.blocks
    );
    Ok(report)
}

/// Generate a stereo sine in `format`, peak at `amplitude` of full scale
pub fn generate_test_tone(
    frequency: f64,
    amplitude: f64,
    duration_secs: f64,
    sample_rate: u32,
    format: SampleFormat,
) -> StereoAudio {
    let frames = (duration_secs * f64::from(sample_rate)) as usize;
    let angular = 2.0 * std::f64::consts::PI * frequency / f64::from(sample_rate);
    let samples: Vec<f32> = (0..frames)
        .flat_map(|i| {
            let s = (amplitude * (angular * i as f64).sin()) as f32;
            [s, s]
        })
        .collect();

    StereoAudio {
        sample_rate,
        data: AudioData::Float(samples).convert(format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rms(audio: &StereoAudio) -> f64 {
        let AudioData::Float(samples) = audio.data.clone().convert(SampleFormat::Float) else {
            unreachable!()
        };
        let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        (sum / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_generate_test_tone() {
        let tone = generate_test_tone(440.0, 0.5, 0.5, 48000, SampleFormat::Pcm16);
        assert_eq!(tone.frames(), 24000);
        assert_eq!(tone.format(), SampleFormat::Pcm16);
        assert!((tone.duration_secs() - 0.5).abs() < 1e-9);
        assert!((rms(&tone) - 0.5 / 2f64.sqrt()).abs() < 0.01);
    }

    #[test]
    fn test_convert_keeps_full_scale() {
        let data = AudioData::Pcm16(vec![i16::MIN, -16384, 0, 16384]);
        assert_eq!(
            data.clone().convert(SampleFormat::Float),
            AudioData::Float(vec![-1.0, -0.5, 0.0, 0.5])
        );
        assert_eq!(
            data.clone().convert(SampleFormat::Pcm32),
            AudioData::Pcm32(vec![i32::MIN, -1 << 30, 0, 1 << 30])
        );
        assert_eq!(data.clone().convert(SampleFormat::Pcm16), data);
    }

    #[test]
    fn test_wav_round_trip_each_format() {
        let dir = tempdir().unwrap();
        for format in [SampleFormat::Pcm16, SampleFormat::Float, SampleFormat::Pcm32] {
            let path = dir.path().join(format!("tone_{}.wav", format));
            let tone = generate_test_tone(1000.0, 0.25, 0.1, 44100, format);
            write_wav(&path, &tone).unwrap();
            assert_eq!(read_wav(&path).unwrap(), tone);
        }
    }

    #[test]
    fn test_mono_is_upmixed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: WavSampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [1i16, 2, 3] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.data, AudioData::Pcm16(vec![1, 1, 2, 2, 3, 3]));
    }

    #[test]
    fn test_rejects_8_bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eight.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: WavSampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i8).unwrap();
        writer.write_sample(0i8).unwrap();
        writer.finalize().unwrap();

        let err = read_wav(&path).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_wav(Path::new("/nonexistent/file.wav")).unwrap_err();
        assert_eq!(err.error_code(), "WAV_ERROR");
    }

    #[test]
    fn test_block_size_does_not_change_result() {
        let tone = generate_test_tone(100.0, 0.3, 0.2, 48000, SampleFormat::Pcm32);
        let mut settings = ChainSettings::default();
        settings.bass_boost.enabled = true;
        settings.bass_boost.strength = 700;
        settings.virtualizer.enabled = true;
        settings.virtualizer.strength = 600;

        let run = |block_size| {
            let mut chain = EffectChain::new();
            chain.configure(48000.0, 2, SampleFormat::Pcm32).unwrap();
            chain.apply_settings(&settings).unwrap();
            process_audio(&mut chain, &tone, block_size).unwrap()
        };

        let (a, report_a) = run(64);
        let (b, report_b) = run(1000);
        assert_eq!(a, b);
        assert_eq!(report_a.frames, 9600);
        assert_eq!(report_a.blocks, 150);
        assert_eq!(report_b.blocks, 10);
        assert_eq!(report_b.active_blocks, 10);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let tone = generate_test_tone(100.0, 0.3, 0.01, 48000, SampleFormat::Pcm16);
        let mut chain = EffectChain::new();
        assert!(process_audio(&mut chain, &tone, 0).is_err());
    }

    #[test]
    fn test_process_file_with_bass_boost() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let tone = generate_test_tone(55.0, 0.1, 1.0, 48000, SampleFormat::Pcm16);
        write_wav(&input, &tone).unwrap();

        let mut settings = ChainSettings::default();
        settings.bass_boost.enabled = true;
        settings.bass_boost.strength = 1000;

        let options = ProcessOptions {
            format: Some(SampleFormat::Float),
            block_size: 256,
        };
        let report = process_file(&input, &output, &settings, options).unwrap();
        assert_eq!(report.frames, 48000);

        let processed = read_wav(&output).unwrap();
        assert_eq!(processed.format(), SampleFormat::Float);
        let gain_db = 20.0 * (rms(&processed) / rms(&tone)).log10();
        assert!(gain_db > 10.0, "bass boost only added {:.2} dB", gain_db);
    }
}
