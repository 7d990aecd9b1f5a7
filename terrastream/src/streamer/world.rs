//! Per-frame streaming controller.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::coord::{CoordError, TileKey};
use crate::loader::TileLoader;
use crate::mesh::MeshPayload;
use crate::resource::ResourceStack;
use crate::telemetry::LoaderSnapshot;

use super::{RenderError, RenderSink, StreamerConfig, WorldFrame};

/// Lifecycle of a [`WorldStreamer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamerState {
    /// No tile requested yet
    Idle,
    /// At least one tile requested; never leaves this state
    Streaming,
}

impl fmt::Display for StreamerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamerState::Idle => write!(f, "idle"),
            StreamerState::Streaming => write!(f, "streaming"),
        }
    }
}

/// What one [`WorldStreamer::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Window tiles that exist in the pyramid
    pub window: usize,
    /// Tiles newly handed to the loader
    pub requested: usize,
    /// Tiles drained and uploaded
    pub presented: usize,
    /// Drained tiles whose upload failed
    pub render_failures: usize,
}

/// Running totals across all ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    pub ticks: u64,
    pub requested: u64,
    pub presented: u64,
    pub render_failures: u64,
    /// Resources currently owned by the streamer
    pub resources: usize,
    pub loader: LoaderSnapshot,
}

impl fmt::Display for StreamerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} requested, {} presented, {} render failures, {} resources",
            self.ticks, self.requested, self.presented, self.render_failures, self.resources
        )
    }
}

/// Streams the tile window around the camera into a render sink.
///
/// Each [`tick`](WorldStreamer::tick) requests any window tile the streamer
/// has not asked for yet, then drains whatever the loader finished and turns
/// it into render resources. Nothing in a tick waits on the network.
///
/// Tiles are never unloaded when the camera moves away; resources live
/// until [`shutdown`](WorldStreamer::shutdown) or drop.
pub struct WorldStreamer<S: RenderSink> {
    loader: TileLoader,
    sink: S,
    stack: ResourceStack<S::Resource>,
    frame: WorldFrame,
    config: StreamerConfig,
    requested: HashSet<TileKey>,
    state: StreamerState,
    stats: StreamerStats,
}

impl<S: RenderSink> WorldStreamer<S> {
    /// Creates a streamer with world space anchored at `origin`.
    pub fn new(
        loader: TileLoader,
        sink: S,
        origin: TileKey,
        config: StreamerConfig,
    ) -> Result<Self, CoordError> {
        let frame = WorldFrame::new(origin, config.tile_size, config.tile_world_size)?;
        info!(
            %origin,
            center = %frame.origin_center(),
            radius = config.radius,
            "World streamer ready"
        );
        Ok(Self {
            loader,
            sink,
            stack: ResourceStack::new(),
            frame,
            config,
            requested: HashSet::new(),
            state: StreamerState::Idle,
            stats: StreamerStats::default(),
        })
    }

    /// Advances streaming by one frame around `camera`.
    pub fn tick(&mut self, camera: TileKey) -> TickSummary {
        let mut summary = TickSummary::default();
        self.stats.ticks += 1;

        for key in self.window(camera) {
            summary.window += 1;
            if !self.requested.insert(key) {
                continue;
            }
            self.loader.request(key);
            summary.requested += 1;
        }

        if summary.requested > 0 && self.state == StreamerState::Idle {
            self.state = StreamerState::Streaming;
            info!(state = %self.state, "Streaming started");
        }

        for (key, payload) in self.loader.drain_ready() {
            match self.present(key, payload) {
                Ok(()) => summary.presented += 1,
                Err(e) => {
                    warn!(tile = %key, error = %e, "Failed to present tile");
                    summary.render_failures += 1;
                }
            }
        }

        self.stats.requested += summary.requested as u64;
        self.stats.presented += summary.presented as u64;
        self.stats.render_failures += summary.render_failures as u64;
        if summary.requested > 0 || summary.presented > 0 {
            debug!(
                %camera,
                requested = summary.requested,
                presented = summary.presented,
                resources = self.stack.len(),
                "Tick"
            );
        }
        summary
    }

    /// Tiles within `radius` of `camera`, skipping those past the pyramid
    /// edge.
    fn window(&self, camera: TileKey) -> Vec<TileKey> {
        let r = self.config.radius as i64;
        let mut keys = Vec::with_capacity(self.config.window_len());
        for dy in -r..=r {
            for dx in -r..=r {
                if let Ok(key) = camera.neighbor(dx, dy) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Uploads texture, mesh and transform for one drained tile.
    fn present(&mut self, key: TileKey, payload: MeshPayload) -> Result<(), PresentError> {
        let transform = self.frame.transform_for(key)?;

        let texture = self.sink.upload_texture(key, payload.image())?;
        self.stack.push(texture);
        let mesh = self.sink.upload_mesh(key, &payload)?;
        self.stack.push(mesh);
        let placed = self.sink.set_world_transform(key, &transform)?;
        self.stack.push(placed);
        Ok(())
    }

    /// Destroys every render resource, newest first.
    pub fn shutdown(&mut self) -> usize {
        let released = self.stack.teardown();
        info!(released, "World streamer shut down");
        released
    }

    pub fn state(&self) -> StreamerState {
        self.state
    }

    /// Totals so far, including a loader snapshot.
    pub fn stats(&self) -> StreamerStats {
        StreamerStats {
            resources: self.stack.len(),
            loader: self.loader.metrics(),
            ..self.stats
        }
    }

    pub fn loader(&self) -> &TileLoader {
        &self.loader
    }

    pub fn frame(&self) -> &WorldFrame {
        &self.frame
    }

    pub fn resources(&self) -> &ResourceStack<S::Resource> {
        &self.stack
    }
}

#[derive(Debug, thiserror::Error)]
enum PresentError {
    #[error(transparent)]
    Coord(#[from] CoordError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
