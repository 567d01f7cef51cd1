//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::ChainSettings;
use crate::engine::io::{process_file, ProcessOptions};

/// Load the preset at `path`, or the defaults when none is given
fn load_settings(path: Option<&Path>) -> Result<ChainSettings> {
    match path {
        Some(path) => ChainSettings::load(path)
            .with_context(|| format!("Failed to load preset {}", path.display())),
        None => Ok(ChainSettings::default()),
    }
}

/// Process a single WAV file.
pub fn process(
    input: &Path,
    output: &Path,
    preset: Option<&Path>,
    options: ProcessOptions,
) -> Result<()> {
    info!("Processing {}", input.display());
    let settings = load_settings(preset)?;

    let report = process_file(input, output, &settings, options)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    println!(
        "Wrote {} ({} frames, active in {} of {} blocks)",
        output.display(),
        report.frames,
        report.active_blocks,
        report.blocks
    );
    Ok(())
}

/// Process every WAV file under `input_dir` into `output_dir`.
///
/// Files that fail are reported and skipped; the command fails only if
/// nothing could be processed.
pub fn batch(
    input_dir: &Path,
    output_dir: &Path,
    preset: Option<&Path>,
    options: ProcessOptions,
) -> Result<()> {
    info!("Batch processing {}", input_dir.display());
    let settings = load_settings(preset)?;

    let files = find_wav_files(input_dir);
    if files.is_empty() {
        anyhow::bail!("No WAV files found under {}", input_dir.display());
    }

    let mut processed = 0;
    for input in &files {
        let relative = input.strip_prefix(input_dir).unwrap_or(input);
        let output = output_dir.join(relative);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        match process_file(input, &output, &settings, options) {
            Ok(report) => {
                processed += 1;
                println!("{} -> {} ({} frames)", input.display(), output.display(), report.frames);
            }
            Err(e) => warn!("Skipping {}: {}", input.display(), e),
        }
    }

    if processed == 0 {
        anyhow::bail!("None of the {} files could be processed", files.len());
    }
    println!("Processed {} of {} files", processed, files.len());
    Ok(())
}

/// Print the default preset or write it to `output`.
pub fn preset(output: Option<&Path>) -> Result<()> {
    let settings = ChainSettings::default();
    match output {
        Some(path) => {
            settings
                .save(path)
                .with_context(|| format!("Failed to write preset {}", path.display()))?;
            println!("Preset written: {}", path.display());
        }
        None => println!("{}", settings.to_json_string()?),
    }
    Ok(())
}

/// WAV files under `dir`, sorted for stable output
fn find_wav_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::io::{generate_test_tone, read_wav, write_wav};
    use crate::engine::SampleFormat;
    use tempfile::tempdir;

    #[test]
    fn test_find_wav_files_recurses() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        for name in ["one.wav", "a/two.WAV", "a/b/three.wav", "a/notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = find_wav_files(dir.path());
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.extension().is_some()));
    }

    #[test]
    fn test_batch_mirrors_layout_and_skips_bad_files() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        fs::create_dir_all(input_dir.path().join("sub")).unwrap();

        let tone = generate_test_tone(440.0, 0.2, 0.05, 44100, SampleFormat::Pcm16);
        write_wav(&input_dir.path().join("sub/tone.wav"), &tone).unwrap();
        fs::write(input_dir.path().join("broken.wav"), b"not a wav").unwrap();

        batch(
            input_dir.path(),
            output_dir.path(),
            None,
            ProcessOptions::default(),
        )
        .unwrap();

        let out = read_wav(&output_dir.path().join("sub/tone.wav")).unwrap();
        assert_eq!(out.frames(), tone.frames());
        assert!(!output_dir.path().join("broken.wav").exists());
    }

    #[test]
    fn test_batch_empty_dir_fails() {
        let input_dir = tempdir().unwrap();
        let output_dir = tempdir().unwrap();
        assert!(batch(
            input_dir.path(),
            output_dir.path(),
            None,
            ProcessOptions::default()
        )
        .is_err());
    }

    #[test]
    fn test_preset_file_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.json");
        preset(Some(&path)).unwrap();
        assert_eq!(ChainSettings::load(&path).unwrap(), ChainSettings::default());
    }
}
