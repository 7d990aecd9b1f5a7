//! Integration tests for the tile loader.
//!
//! These tests drive the loader through the public API with the offline
//! synthetic provider:
//! - Request → Pending → Ready → Consumed for a single tile
//! - Request coalescing while a tile is in flight
//! - Concurrent requests for one tile from many threads
//! - Provider failures confined to one tile
//! - Exactly-once delivery across repeated drains
//!
//! Run with: `cargo test --test loader_integration`

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use terrastream::coord::TileKey;
use terrastream::loader::{LoadState, LoaderConfig, TileLoader};
use terrastream::provider::{SyntheticProvider, TileDataProvider};

// ============================================================================
// Helper Functions
// ============================================================================

const WAIT: Duration = Duration::from_secs(10);

/// Tile near Denver at zoom 15.
const DENVER_TILE: TileKey = TileKey {
    zoom: 15,
    x: 1000,
    y: 1500,
};

/// Loader sharing `provider` so tests can inspect its call counters.
fn loader_with(provider: &Arc<SyntheticProvider>, config: &LoaderConfig) -> TileLoader {
    let shared: Arc<dyn TileDataProvider> = provider.clone();
    TileLoader::with_shared_provider(shared, config).expect("loader should start")
}

fn slow_provider() -> Arc<SyntheticProvider> {
    Arc::new(SyntheticProvider::new().with_latency(Duration::from_millis(150)))
}

// ============================================================================
// Integration Tests
// ============================================================================

/// One tile through its whole lifecycle with the default mesh settings.
#[test]
fn test_denver_tile_lifecycle() {
    let provider = slow_provider();
    let config = LoaderConfig::default();
    let loader = loader_with(&provider, &config);

    assert_eq!(loader.poll(DENVER_TILE), LoadState::Unrequested);
    assert!(loader.request(DENVER_TILE));
    assert_eq!(loader.poll(DENVER_TILE), LoadState::Pending);

    assert_eq!(loader.wait(DENVER_TILE, WAIT), LoadState::Ready);

    // 5 × 5 neighborhood fits one elevation batch, plus one imagery fetch
    assert_eq!(provider.elevation_calls(), 1);
    assert_eq!(provider.imagery_calls(), 1);

    let drained = loader.drain_ready();
    assert_eq!(drained.len(), 1);
    let (key, payload) = &drained[0];
    assert_eq!(*key, DENVER_TILE);

    let res = config.resolution as usize;
    assert_eq!(payload.vertices().len(), res * res);
    assert_eq!(payload.indices().len(), (res - 1) * res * 2);
    assert!(payload.image().width() > 0);

    assert_eq!(loader.poll(DENVER_TILE), LoadState::Consumed);
}

/// Requesting a tile twice before it completes runs exactly one worker.
#[test]
fn test_duplicate_request_runs_one_worker() {
    let provider = slow_provider();
    let loader = loader_with(&provider, &LoaderConfig::default().with_resolution(8));

    assert!(loader.request(DENVER_TILE));
    assert!(!loader.request(DENVER_TILE));
    assert_eq!(loader.wait(DENVER_TILE, WAIT), LoadState::Ready);
    assert!(!loader.request(DENVER_TILE));

    assert_eq!(provider.elevation_calls(), 1);
    assert_eq!(provider.imagery_calls(), 1);

    let metrics = loader.metrics();
    assert_eq!(metrics.requested, 1);
    assert_eq!(metrics.completed, 1);
    assert_eq!(metrics.coalesced, 2);
}

/// Requests racing from many threads schedule the tile exactly once.
#[test]
fn test_concurrent_requests_are_coalesced() {
    const THREADS: usize = 8;

    let provider = slow_provider();
    let loader = Arc::new(loader_with(
        &provider,
        &LoaderConfig::default().with_workers(4).with_resolution(8),
    ));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loader.request(DENVER_TILE)
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().expect("request thread panicked"))
        .filter(|scheduled| *scheduled)
        .count();
    assert_eq!(winners, 1);

    assert_eq!(loader.wait(DENVER_TILE, WAIT), LoadState::Ready);
    assert_eq!(provider.elevation_calls(), 1);
    assert_eq!(provider.imagery_calls(), 1);

    let metrics = loader.metrics();
    assert_eq!(metrics.requested, 1);
    assert_eq!(metrics.coalesced, (THREADS - 1) as u64);
    assert_eq!(loader.drain_ready().len(), 1);
}

/// A configuration error on one tile's imagery fails only that tile.
#[test]
fn test_imagery_failure_is_scoped_to_one_tile() {
    let bad = TileKey::new(15, 1001, 1500);
    let provider = Arc::new(SyntheticProvider::new().with_failing_imagery(bad));
    let loader = loader_with(
        &provider,
        &LoaderConfig::default().with_workers(3).with_resolution(8),
    );

    let good = [
        DENVER_TILE,
        TileKey::new(15, 1000, 1501),
        TileKey::new(15, 1001, 1501),
    ];
    loader.request(bad);
    for key in good {
        loader.request(key);
    }

    assert_eq!(loader.wait(bad, WAIT), LoadState::Failed);
    for key in good {
        assert_eq!(loader.wait(key, WAIT), LoadState::Ready);
    }

    let reason = loader.failure(bad).expect("failed tile keeps its reason");
    assert!(!reason.is_empty());

    let mut drained: Vec<TileKey> = loader.drain_ready().into_iter().map(|(k, _)| k).collect();
    drained.sort();
    let mut expected = good.to_vec();
    expected.sort();
    assert_eq!(drained, expected);

    assert_eq!(loader.poll(bad), LoadState::Failed);
    assert!(!loader.request(bad), "failed tiles are not retried");
    assert_eq!(loader.metrics().failed, 1);
}

/// Draining repeatedly after a tile becomes ready yields it once in total.
#[test]
fn test_repeated_drains_yield_tile_once() {
    let provider = Arc::new(SyntheticProvider::new());
    let loader = loader_with(&provider, &LoaderConfig::default().with_resolution(4));

    loader.request(DENVER_TILE);
    assert_eq!(loader.wait(DENVER_TILE, WAIT), LoadState::Ready);

    let total: usize = (0..10).map(|_| loader.drain_ready().len()).sum();
    assert_eq!(total, 1);
    assert_eq!(loader.metrics().drained, 1);
}

/// Many tiles on a small pool all complete and each drains once.
#[test]
fn test_window_of_tiles_completes() {
    let provider = Arc::new(SyntheticProvider::new());
    let loader = loader_with(
        &provider,
        &LoaderConfig::default().with_workers(2).with_resolution(4),
    );

    let keys: Vec<TileKey> = (0..4)
        .flat_map(|dy| (0..4).map(move |dx| TileKey::new(15, 1000 + dx, 1500 + dy)))
        .collect();
    for key in &keys {
        loader.request(*key);
    }
    for key in &keys {
        assert_eq!(loader.wait(*key, WAIT), LoadState::Ready);
    }

    assert_eq!(loader.drain_ready().len(), keys.len());
    assert_eq!(provider.imagery_calls(), keys.len());
    assert_eq!(loader.metrics().in_flight(), 0);
}
