//! headfx CLI
//!
//! Runs WAV files through the stereo effect chain.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headfx::cli::{commands, Cli, Commands};
use headfx::engine::io::ProcessOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let default_filter = if cli.verbose { "headfx=debug" } else { "headfx=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("headfx v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Process {
            input,
            output,
            preset,
            format,
            block_size,
        } => commands::process(
            &input,
            &output,
            preset.as_deref(),
            ProcessOptions { format, block_size },
        ),
        Commands::Batch {
            input_dir,
            output_dir,
            preset,
            format,
            block_size,
        } => commands::batch(
            &input_dir,
            &output_dir,
            preset.as_deref(),
            ProcessOptions { format, block_size },
        ),
        Commands::Preset { output } => commands::preset(output.as_deref()),
    }
}
