//! TerraStream CLI - Command-line interface
//!
//! Drives a headless streaming session against the terrastream library:
//! tiles are requested, loaded, meshed and "uploaded" to a bookkeeping
//! render sink, then torn down.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use terrastream::logging::init_logging;

use commands::stream::StreamArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "terrastream")]
#[command(version, about = "Stream terrain tiles around a location", long_about = None)]
struct Cli {
    /// Default log level; RUST_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Stream the tile window around a location
    Stream {
        /// Latitude of the camera in degrees
        #[arg(long, default_value_t = 39.7391536, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude of the camera in degrees
        #[arg(long, default_value_t = -104.9847034, allow_hyphen_values = true)]
        lng: f64,

        /// Zoom level of the camera tile
        #[arg(long, short, default_value_t = 15)]
        zoom: u8,

        /// Tiles around the camera tile in each direction
        #[arg(long, short)]
        radius: Option<u32>,

        /// Worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Stop after this many frames (0 = until the window settles or Ctrl+C)
        #[arg(long, default_value_t = 0)]
        frames: u64,

        /// Frame interval in milliseconds
        #[arg(long, default_value_t = 16)]
        frame_ms: u64,

        /// Use the built-in synthetic provider instead of the network
        #[arg(long)]
        offline: bool,

        /// Config file (defaults to ./terrastream.ini when present)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// File holding the provider API key
        #[arg(long)]
        api_key_file: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Config file (defaults to ./terrastream.ini when present)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _guard = init_logging(&cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Stream {
            lat,
            lng,
            zoom,
            radius,
            workers,
            frames,
            frame_ms,
            offline,
            config,
            api_key_file,
        } => commands::stream::run(StreamArgs {
            lat,
            lng,
            zoom,
            radius,
            workers,
            frames,
            frame_ms,
            offline,
            config,
            api_key_file,
        }),
        Commands::Config { config } => commands::config::run(config),
    }
}
