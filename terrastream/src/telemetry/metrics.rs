//! Atomic counters for the tile loader.

use std::sync::atomic::{AtomicU64, Ordering};

use super::snapshot::LoaderSnapshot;

/// Counters shared between the loader and its workers.
#[derive(Debug, Default)]
pub struct LoaderMetrics {
    requested: AtomicU64,
    coalesced: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    drained: AtomicU64,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new tile was scheduled.
    pub fn tile_requested(&self) {
        self.requested.fetch_add(1, Ordering::Relaxed);
    }

    /// A request hit a tile that was already known.
    pub fn request_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// A worker finished a tile successfully.
    pub fn tile_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// A worker gave up on a tile.
    pub fn tile_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Tiles handed to the consumer by a drain.
    pub fn tiles_drained(&self, count: u64) {
        self.drained.fetch_add(count, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of every counter.
    pub fn snapshot(&self) -> LoaderSnapshot {
        LoaderSnapshot {
            requested: self.requested.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = LoaderMetrics::new();
        metrics.tile_requested();
        metrics.tile_requested();
        metrics.request_coalesced();
        metrics.tile_completed();
        metrics.tile_failed();
        metrics.tiles_drained(1);

        let snap = metrics.snapshot();
        assert_eq!(snap.requested, 2);
        assert_eq!(snap.coalesced, 1);
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.drained, 1);
    }
}
