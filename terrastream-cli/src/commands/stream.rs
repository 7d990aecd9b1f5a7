//! Stream command - run a headless streaming session around a location.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use terrastream::coord::{to_tile, GeoCoordinate};
use terrastream::loader::TileLoader;
use terrastream::provider::{SyntheticProvider, TileDataProvider};
use terrastream::streamer::{HeadlessSink, WorldStreamer};
use tracing::info;

use super::common::load_config;
use crate::error::CliError;

/// Arguments for the stream command.
pub struct StreamArgs {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
    pub radius: Option<u32>,
    pub workers: Option<usize>,
    pub frames: u64,
    pub frame_ms: u64,
    pub offline: bool,
    pub config: Option<PathBuf>,
    pub api_key_file: Option<PathBuf>,
}

/// Run the stream command.
pub fn run(args: StreamArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(radius) = args.radius {
        config.streamer.radius = radius;
    }
    if let Some(workers) = args.workers {
        config.loader = config.loader.with_workers(workers);
    }
    if let Some(path) = args.api_key_file {
        config.provider.api_key_file = path;
    }

    let center = GeoCoordinate::new(args.lat, args.lng)?;
    let camera = to_tile(center, config.streamer.tile_size, args.zoom)?;

    let provider: Arc<dyn TileDataProvider> = if args.offline {
        Arc::new(SyntheticProvider::new())
    } else {
        Arc::new(config.provider.google_provider()?)
    };

    let loader = TileLoader::with_shared_provider(Arc::clone(&provider), &config.loader)?;
    let sink = HeadlessSink::new();
    let ledger = sink.ledger();
    let mut streamer = WorldStreamer::new(loader, sink, camera, config.streamer.clone())?;

    println!("TerraStream v{}", terrastream::VERSION);
    println!("=====================");
    println!();
    println!("Center:   {}", center);
    println!("Camera:   {}", camera);
    println!("Window:   {} tiles", config.streamer.window_len());
    println!("Provider: {}", provider.name());
    println!("Workers:  {}", config.loader.workers);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let started = Instant::now();
    let frame = Duration::from_millis(args.frame_ms);
    let mut window = 0u64;
    let mut frames = 0u64;

    while !shutdown.load(Ordering::SeqCst) && (args.frames == 0 || frames < args.frames) {
        let summary = streamer.tick(camera);
        frames += 1;
        window = window.max(summary.window as u64);

        if summary.presented > 0 {
            let stats = streamer.stats();
            println!(
                "[frame {:>5}] {}/{} tiles presented ({} failed)",
                frames,
                stats.presented,
                window,
                stats.loader.failed + stats.render_failures
            );
        }

        let stats = streamer.stats();
        if stats.presented + stats.render_failures + stats.loader.failed >= window {
            info!(frames, "Window settled");
            break;
        }
        thread::sleep(frame);
    }

    let stats = streamer.stats();
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!("  Frames:          {} in {:.1?}", frames, started.elapsed());
    println!(
        "  Tiles presented: {} of {} ({} load failures, {} render failures)",
        stats.presented, window, stats.loader.failed, stats.render_failures
    );
    println!("  Loader:          {}", stats.loader);
    println!("  Vertices:        {}", ledger.vertices());
    println!("  Texture bytes:   {}", ledger.texture_bytes());

    let released = streamer.shutdown();
    println!("  Released:        {} resources ({} live)", released, ledger.live());
    println!();
    Ok(())
}
