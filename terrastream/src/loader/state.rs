//! Per-tile load state table.
//!
//! Transitions are strictly `Unrequested → Pending → {Ready | Failed}` and
//! then `Ready → Consumed` once. Nothing ever moves a tile backwards.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::coord::TileKey;
use crate::mesh::MeshPayload;

/// Observable load state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// Never requested
    Unrequested,
    /// A worker is fetching and building the tile
    Pending,
    /// Payload built, waiting to be drained
    Ready,
    /// Fetch or build failed; the tile will not be retried
    Failed,
    /// Payload handed to the consumer
    Consumed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::Unrequested => "unrequested",
            LoadState::Pending => "pending",
            LoadState::Ready => "ready",
            LoadState::Failed => "failed",
            LoadState::Consumed => "consumed",
        };
        f.write_str(name)
    }
}

enum Slot {
    Pending,
    Ready(MeshPayload),
    Failed(String),
    Consumed,
}

impl Slot {
    fn state(&self) -> LoadState {
        match self {
            Slot::Pending => LoadState::Pending,
            Slot::Ready(_) => LoadState::Ready,
            Slot::Failed(_) => LoadState::Failed,
            Slot::Consumed => LoadState::Consumed,
        }
    }
}

/// Load state of every tile ever requested, plus the queue of tiles that
/// became ready since the last drain.
///
/// Entries are never evicted.
#[derive(Default)]
pub(crate) struct LoadTable {
    slots: HashMap<TileKey, Slot>,
    ready: VecDeque<TileKey>,
}

impl LoadTable {
    pub(crate) fn state(&self, key: TileKey) -> LoadState {
        self.slots
            .get(&key)
            .map(Slot::state)
            .unwrap_or(LoadState::Unrequested)
    }

    /// Moves an unrequested tile to `Pending`. Returns false (and changes
    /// nothing) for any other state.
    pub(crate) fn begin(&mut self, key: TileKey) -> bool {
        if self.slots.contains_key(&key) {
            return false;
        }
        self.slots.insert(key, Slot::Pending);
        true
    }

    /// Stores a pending tile's payload and queues it for draining.
    pub(crate) fn complete(&mut self, key: TileKey, payload: MeshPayload) -> bool {
        match self.slots.get_mut(&key) {
            Some(slot) if matches!(slot, Slot::Pending) => {
                *slot = Slot::Ready(payload);
                self.ready.push_back(key);
                true
            }
            _ => false,
        }
    }

    /// Marks a pending tile as failed.
    pub(crate) fn fail(&mut self, key: TileKey, reason: String) -> bool {
        match self.slots.get_mut(&key) {
            Some(slot) if matches!(slot, Slot::Pending) => {
                *slot = Slot::Failed(reason);
                true
            }
            _ => false,
        }
    }

    /// Takes every ready payload, marking each tile `Consumed`.
    pub(crate) fn drain(&mut self) -> Vec<(TileKey, MeshPayload)> {
        let mut drained = Vec::with_capacity(self.ready.len());
        while let Some(key) = self.ready.pop_front() {
            match self.slots.get_mut(&key) {
                Some(slot) if matches!(slot, Slot::Ready(_)) => {
                    if let Slot::Ready(payload) = std::mem::replace(slot, Slot::Consumed) {
                        drained.push((key, payload));
                    }
                }
                _ => {}
            }
        }
        drained
    }

    pub(crate) fn failure(&self, key: TileKey) -> Option<&str> {
        match self.slots.get(&key) {
            Some(Slot::Failed(reason)) => Some(reason.as_str()),
            _ => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
