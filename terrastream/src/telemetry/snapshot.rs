//! Point-in-time copy of loader counters.

use std::fmt;

/// Snapshot of [`super::LoaderMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderSnapshot {
    /// Tiles scheduled on the worker pool
    pub requested: u64,
    /// Requests ignored because the tile was already known
    pub coalesced: u64,
    /// Tiles that reached `Ready`
    pub completed: u64,
    /// Tiles that reached `Failed`
    pub failed: u64,
    /// Tiles handed to the consumer
    pub drained: u64,
}

impl LoaderSnapshot {
    /// Tiles scheduled but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.requested.saturating_sub(self.completed + self.failed)
    }

    /// Tiles finished and waiting to be drained.
    pub fn awaiting_drain(&self) -> u64 {
        self.completed.saturating_sub(self.drained)
    }
}

impl fmt::Display for LoaderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requested {}, coalesced {}, completed {}, failed {}, drained {}",
            self.requested, self.coalesced, self.completed, self.failed, self.drained
        )
    }
}
