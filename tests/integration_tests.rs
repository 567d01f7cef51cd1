//! Integration Tests
//!
//! End-to-end tests for the headfx effect chain, driven through the public
//! API the way a host or the CLI would use it.

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

use headfx::config::ChainSettings;
use headfx::dsp::{EffectChain, EffectKind, Parameter, ParameterId, ProcessStatus};
use headfx::engine::io::{
    generate_test_tone, process_audio, process_file, read_wav, write_wav, AudioData,
    ProcessOptions,
};
use headfx::engine::SampleFormat;
use headfx::FxError;

const BLOCK_SIZE: usize = 1024;

fn configured_chain(sample_rate: f64, format: SampleFormat) -> EffectChain {
    let mut chain = EffectChain::new();
    chain.configure(sample_rate, 2, format).unwrap();
    chain
}

/// RMS in dB of one channel of interleaved float samples, from `start_frame`
fn channel_rms_db(samples: &[f32], channel: usize, start_frame: usize) -> f64 {
    let values: Vec<f64> = samples
        .chunks_exact(2)
        .skip(start_frame)
        .map(|frame| f64::from(frame[channel]))
        .collect();
    let mean_square = values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64;
    10.0 * mean_square.log10()
}

fn float_samples(data: &AudioData) -> &[f32] {
    match data {
        AudioData::Float(samples) => samples,
        other => panic!("expected float data, got {}", other.format()),
    }
}

// === Pipeline Tests ===

#[test]
fn test_equalizer_keeps_silence_silent() {
    let mut chain = configured_chain(48000.0, SampleFormat::Pcm32);
    chain
        .set_parameter(Parameter::EqualizerBandLevel {
            band: 3,
            gain_db: 8.0,
        })
        .unwrap();
    chain.set_parameter(Parameter::EqualizerEnabled(true)).unwrap();

    let input = vec![0i32; 2 * BLOCK_SIZE];
    let mut output = vec![1i32; 2 * BLOCK_SIZE];
    // Enough blocks for the fade to complete
    for _ in 0..60 {
        let status = chain.process(&input, &mut output).unwrap();
        assert_eq!(status, ProcessStatus::Active);
        assert!(output.iter().all(|&s| s == 0));
    }
    assert_eq!(chain.equalizer().fade(), 100);
}

#[test]
fn test_uniform_equalizer_gain_end_to_end() {
    let mut chain = configured_chain(48000.0, SampleFormat::Float);
    for band in 0..6 {
        chain
            .set_parameter(Parameter::EqualizerBandLevel { band, gain_db: 6.0 })
            .unwrap();
    }
    chain.set_parameter(Parameter::EqualizerEnabled(true)).unwrap();

    let tone = generate_test_tone(1000.0, 0.1, 2.0, 48000, SampleFormat::Float);
    let (processed, _) = process_audio(&mut chain, &tone, BLOCK_SIZE).unwrap();

    let start = 72000;
    let gain = channel_rms_db(float_samples(&processed.data), 0, start)
        - channel_rms_db(float_samples(&tone.data), 0, start);
    assert_abs_diff_eq!(gain, 6.0, epsilon = 0.3);
}

#[test]
fn test_bass_boost_gain_at_center_frequency() {
    let mut chain = configured_chain(48000.0, SampleFormat::Float);
    chain.set_parameter(Parameter::BassBoostStrength(1000)).unwrap();
    chain.set_parameter(Parameter::BassBoostEnabled(true)).unwrap();

    let tone = generate_test_tone(55.0, 0.05, 1.0, 48000, SampleFormat::Float);
    let (processed, report) = process_audio(&mut chain, &tone, BLOCK_SIZE).unwrap();
    assert_eq!(report.active_blocks, report.blocks);

    // Low-pass output at its corner is Q times the input, a quarter turn late
    let q: f64 = 0.5 + 1000.0 / 666.0;
    let expected = 20.0 * (1.0 + 4.0 * q * q).sqrt().log10();

    for channel in 0..2 {
        let gain = channel_rms_db(float_samples(&processed.data), channel, 24000)
            - channel_rms_db(float_samples(&tone.data), channel, 24000);
        assert_abs_diff_eq!(gain, expected, epsilon = 0.5);
    }
}

#[test]
fn test_idle_chain_passes_pcm32_through() {
    let mut chain = configured_chain(44100.0, SampleFormat::Pcm32);
    let input: Vec<i32> = (0..2048).map(|i| (i * 7919) % 100_000 - 50_000).collect();
    let mut output = vec![0i32; input.len()];

    let status = chain.process(&input, &mut output).unwrap();
    assert_eq!(status, ProcessStatus::Inactive);
    assert_eq!(output, input);
}

// === Status Tests ===

#[test]
fn test_status_follows_effects_and_master() {
    let mut chain = configured_chain(44100.0, SampleFormat::Pcm16);
    let input = vec![0i16; 256];
    let mut output = vec![0i16; 256];

    assert_eq!(chain.process(&input, &mut output).unwrap(), ProcessStatus::Inactive);

    chain.set_parameter(Parameter::VirtualizerEnabled(true)).unwrap();
    assert!(chain.is_effect_active(EffectKind::Virtualizer));
    assert_eq!(chain.process(&input, &mut output).unwrap(), ProcessStatus::Active);

    chain.set_parameter(Parameter::Enabled(false)).unwrap();
    assert_eq!(chain.process(&input, &mut output).unwrap(), ProcessStatus::Inactive);

    chain.set_parameter(Parameter::Enabled(true)).unwrap();
    chain.set_parameter(Parameter::VirtualizerEnabled(false)).unwrap();
    assert_eq!(chain.process(&input, &mut output).unwrap(), ProcessStatus::Inactive);
}

// === Error Handling Tests ===

#[test]
fn test_sample_type_must_match_configuration() {
    let mut chain = configured_chain(44100.0, SampleFormat::Pcm16);
    let input = vec![0.0f32; 64];
    let mut output = vec![0.0f32; 64];

    match chain.process(&input, &mut output) {
        Err(FxError::FormatMismatch { expected, actual }) => {
            assert_eq!(expected, "pcm16");
            assert_eq!(actual, "float");
        }
        other => panic!("expected a format mismatch, got {:?}", other),
    }
}

#[test]
fn test_malformed_buffers_are_rejected() {
    let mut chain = configured_chain(44100.0, SampleFormat::Pcm16);
    let mut output = vec![0i16; 64];
    assert!(chain.process(&[0i16; 63], &mut output[..63]).is_err());
    assert!(chain.process(&[0i16; 64], &mut output[..62]).is_err());
}

#[test]
fn test_rejected_configuration_leaves_chain_untouched() {
    let mut chain = configured_chain(48000.0, SampleFormat::Float);
    assert!(chain.configure(0.0, 2, SampleFormat::Pcm16).is_err());
    assert!(chain.configure(44100.0, 1, SampleFormat::Pcm16).is_err());
    assert_eq!(chain.sample_rate(), 48000.0);
    assert_eq!(chain.format(), SampleFormat::Float);
}

// === Parameter and Preset Tests ===

#[test]
fn test_named_parameters_round_trip() {
    let mut chain = EffectChain::new();
    chain.set_param("compression.ratio", &json!(4.0)).unwrap();
    chain
        .set_param("equalizer.band_level", &json!({"band": 1, "gain_db": -2.5}))
        .unwrap();
    chain.set_param("virtualizer.strength", &json!(750)).unwrap();

    assert_eq!(
        chain.parameter(ParameterId::CompressionRatio).unwrap(),
        Parameter::CompressionRatio(4.0)
    );
    assert_eq!(
        chain.parameter(ParameterId::EqualizerBandLevel(1)).unwrap(),
        Parameter::EqualizerBandLevel {
            band: 1,
            gain_db: -2.5
        }
    );
    assert!(chain.virtualizer().is_wide());

    assert!(chain.set_param("virtualizer.strength", &json!(1001)).is_err());
    assert!(chain.set_param("reverb.mix", &json!(0.5)).is_err());
    assert_eq!(chain.virtualizer().strength(), 750);
}

#[test]
fn test_settings_survive_file_round_trip() {
    let mut settings = ChainSettings::default();
    settings.compression.enabled = true;
    settings.compression.ratio = 3.0;
    settings.bass_boost.enabled = true;
    settings.bass_boost.strength = 400;
    settings.equalizer.band_levels = [1.0, 0.0, -2.0, 0.0, 3.0, 0.0];
    settings.equalizer.loudness_correction = true;
    settings.virtualizer.strength = 500;

    let dir = tempdir().unwrap();
    let path = dir.path().join("preset.json");
    settings.save(&path).unwrap();

    let mut chain = EffectChain::new();
    chain.apply_settings(&ChainSettings::load(&path).unwrap()).unwrap();
    assert_eq!(chain.settings(), settings);
    assert_eq!(chain.get_params(), serde_json::to_value(&settings).unwrap());
}

#[test]
fn test_invalid_preset_applies_nothing() {
    let mut settings = ChainSettings::default();
    settings.bass_boost.enabled = true;
    settings.equalizer.band_levels[0] = 42.0;

    let mut chain = EffectChain::new();
    assert!(chain.apply_settings(&settings).is_err());
    assert_eq!(chain.settings(), ChainSettings::default());
}

// === File Processing Tests ===

#[test]
fn test_process_file_with_preset() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");

    let tone = generate_test_tone(110.0, 0.1, 0.5, 44100, SampleFormat::Pcm16);
    write_wav(&input, &tone).unwrap();

    let mut settings = ChainSettings::default();
    settings.bass_boost.enabled = true;
    settings.bass_boost.strength = 500;

    let report = process_file(
        &input,
        &output,
        &settings,
        ProcessOptions {
            format: Some(SampleFormat::Float),
            block_size: 512,
        },
    )
    .unwrap();
    assert_eq!(report.frames, tone.frames());
    assert_eq!(report.active_blocks, report.blocks);

    let processed = read_wav(&output).unwrap();
    assert_eq!(processed.format(), SampleFormat::Float);
    assert_eq!(processed.frames(), tone.frames());
    assert_eq!(processed.sample_rate, 44100);
}
