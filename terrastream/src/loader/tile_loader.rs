//! Deduplicating tile loader backed by a bounded worker pool.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::coord::TileKey;
use crate::mesh::{MeshBuilder, MeshPayload};
use crate::provider::TileDataProvider;
use crate::telemetry::{LoaderMetrics, LoaderSnapshot};

use super::state::{LoadState, LoadTable};
use super::worker::load_tile;
use super::{LoadError, LoaderConfig};

/// State shared between the control thread and the workers.
///
/// The table is the only cross-thread mutable state and lives behind a
/// single lock.
struct Shared {
    table: Mutex<LoadTable>,
    settled: Condvar,
    metrics: LoaderMetrics,
}

/// Loads tiles on a bounded pool of worker threads.
///
/// [`request`](TileLoader::request), [`drain_ready`](TileLoader::drain_ready)
/// and [`poll`](TileLoader::poll) never block on I/O; all network waits
/// happen on the workers. Each tile is built at most once and handed out by
/// `drain_ready` at most once over the loader's lifetime.
///
/// Started workers are never cancelled, and no entry is ever evicted.
///
/// # Example
///
/// ```ignore
/// use terrastream::loader::{LoaderConfig, TileLoader};
/// use terrastream::provider::SyntheticProvider;
///
/// let loader = TileLoader::new(SyntheticProvider::new(), &LoaderConfig::default())?;
/// loader.request(key);
/// for (key, payload) in loader.drain_ready() {
///     // upload payload
/// }
/// ```
pub struct TileLoader {
    shared: Arc<Shared>,
    provider: Arc<dyn TileDataProvider>,
    builder: MeshBuilder,
    pool: ThreadPool,
}

impl TileLoader {
    /// Creates a loader that owns `provider`.
    pub fn new<P>(provider: P, config: &LoaderConfig) -> Result<Self, LoadError>
    where
        P: TileDataProvider + 'static,
    {
        Self::with_shared_provider(Arc::new(provider), config)
    }

    /// Creates a loader around a provider the caller keeps a handle to.
    pub fn with_shared_provider(
        provider: Arc<dyn TileDataProvider>,
        config: &LoaderConfig,
    ) -> Result<Self, LoadError> {
        let workers = config.workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("tile-worker-{}", i))
            .build()
            .map_err(|e| LoadError::Pool(e.to_string()))?;

        info!(
            provider = provider.name(),
            workers,
            resolution = config.resolution,
            elevation_grid = config.elevation_grid,
            "Tile loader started"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                table: Mutex::new(LoadTable::default()),
                settled: Condvar::new(),
                metrics: LoaderMetrics::new(),
            }),
            provider,
            builder: config.mesh_builder(),
            pool,
        })
    }

    /// Schedules `key` if it has never been requested.
    ///
    /// Returns true when a worker was scheduled; any other state makes this a
    /// no-op, so overlapping windows can be re-requested freely.
    pub fn request(&self, key: TileKey) -> bool {
        if !self.shared.table.lock().begin(key) {
            self.shared.metrics.request_coalesced();
            return false;
        }
        self.shared.metrics.tile_requested();
        debug!(tile = %key, "Tile requested");

        let shared = Arc::clone(&self.shared);
        let provider = Arc::clone(&self.provider);
        let builder = self.builder;
        self.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                load_tile(provider.as_ref(), &builder, key)
            }))
            .unwrap_or_else(|_| Err(LoadError::WorkerPanicked));
            settle(&shared, key, outcome);
        });
        true
    }

    /// Takes every tile that became ready since the last call.
    ///
    /// Drained tiles move to `Consumed` under the same lock, so a tile is
    /// yielded exactly once no matter how often this is called.
    pub fn drain_ready(&self) -> Vec<(TileKey, MeshPayload)> {
        let drained = self.shared.table.lock().drain();
        if !drained.is_empty() {
            self.shared.metrics.tiles_drained(drained.len() as u64);
            debug!(count = drained.len(), "Drained ready tiles");
        }
        drained
    }

    /// Current state of `key`.
    pub fn poll(&self, key: TileKey) -> LoadState {
        self.shared.table.lock().state(key)
    }

    /// Why `key` failed, if it did.
    pub fn failure(&self, key: TileKey) -> Option<String> {
        self.shared.table.lock().failure(key).map(str::to_string)
    }

    /// Blocks the caller until `key` leaves `Pending` or `timeout` elapses.
    ///
    /// Meant for tooling and tests; the per-frame path never waits.
    pub fn wait(&self, key: TileKey, timeout: Duration) -> LoadState {
        let deadline = Instant::now() + timeout;
        let mut table = self.shared.table.lock();
        while table.state(key) == LoadState::Pending {
            if self
                .shared
                .settled
                .wait_until(&mut table, deadline)
                .timed_out()
            {
                break;
            }
        }
        table.state(key)
    }

    /// Number of tiles ever requested.
    pub fn known_tiles(&self) -> usize {
        self.shared.table.lock().len()
    }

    /// Point-in-time copy of the loader counters.
    pub fn metrics(&self) -> LoaderSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

/// Records a worker's outcome and wakes any waiters.
fn settle(shared: &Shared, key: TileKey, outcome: Result<MeshPayload, LoadError>) {
    let mut table = shared.table.lock();
    match outcome {
        Ok(payload) => {
            if table.complete(key, payload) {
                shared.metrics.tile_completed();
                debug!(tile = %key, "Tile ready");
            }
        }
        Err(e) => {
            warn!(tile = %key, error = %e, "Tile failed");
            if table.fail(key, e.to_string()) {
                shared.metrics.tile_failed();
            }
        }
    }
    drop(table);
    shared.settled.notify_all();
}
