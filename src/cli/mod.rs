//! CLI Module
//!
//! Command-line interface for running WAV files through the effect chain.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::io::DEFAULT_BLOCK_SIZE;
use crate::engine::SampleFormat;

/// headfx - stereo headphone effects chain
#[derive(Parser, Debug)]
#[command(name = "headfx-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one WAV file
    #[command(name = "process")]
    Process {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Preset JSON file (defaults: every effect off)
        #[arg(short, long)]
        preset: Option<PathBuf>,

        /// Processing and output encoding: pcm16, float or pcm32
        #[arg(short, long)]
        format: Option<SampleFormat>,

        /// Frames per block
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },

    /// Process every WAV file under a directory
    #[command(name = "batch")]
    Batch {
        /// Directory to search for WAV files
        input_dir: PathBuf,

        /// Directory for processed files, mirroring the input layout
        output_dir: PathBuf,

        /// Preset JSON file (defaults: every effect off)
        #[arg(short, long)]
        preset: Option<PathBuf>,

        /// Processing and output encoding: pcm16, float or pcm32
        #[arg(short, long)]
        format: Option<SampleFormat>,

        /// Frames per block
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },

    /// Print the default preset, or write it to a file
    #[command(name = "preset")]
    Preset {
        /// File to write instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
