//! Render backend seam.
//!
//! The streamer never talks to a graphics API directly. It hands payloads to
//! a [`RenderSink`], which returns one [`GpuResource`] per created object;
//! the streamer then owns those resources on its [`ResourceStack`].
//!
//! [`ResourceStack`]: crate::resource::ResourceStack

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;
use tracing::trace;

use crate::coord::TileKey;
use crate::mesh::MeshPayload;
use crate::resource::{GpuResource, ResourceId};

use super::WorldTransform;

/// Errors reported by a render backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// The backend refused or failed to create a resource.
    #[error("Failed to create {kind} for tile {tile}: {message}")]
    Upload {
        kind: ResourceKind,
        tile: TileKey,
        message: String,
    },

    /// The backend is no longer usable.
    #[error("Render backend lost: {0}")]
    BackendLost(String),
}

/// What a render resource holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Mesh,
    Transform,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Mesh => "mesh",
            ResourceKind::Transform => "transform",
        };
        f.write_str(name)
    }
}

/// Creates render-side resources for streamed tiles.
///
/// Called only from the thread that drives the streamer. For each tile the
/// streamer uploads the texture first, then the mesh, then its transform,
/// so teardown releases them in the opposite order.
pub trait RenderSink {
    /// Handle type produced by this backend.
    type Resource: GpuResource;

    fn upload_texture(
        &mut self,
        tile: TileKey,
        image: &RgbaImage,
    ) -> Result<Self::Resource, RenderError>;

    fn upload_mesh(
        &mut self,
        tile: TileKey,
        mesh: &MeshPayload,
    ) -> Result<Self::Resource, RenderError>;

    fn set_world_transform(
        &mut self,
        tile: TileKey,
        transform: &WorldTransform,
    ) -> Result<Self::Resource, RenderError>;
}

/// Counters shared between a [`HeadlessSink`] and the resources it created.
#[derive(Debug, Default)]
pub struct HeadlessLedger {
    created: AtomicU64,
    destroyed: AtomicU64,
    vertices: AtomicU64,
    texture_bytes: AtomicU64,
}

impl HeadlessLedger {
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed.load(Ordering::Relaxed)
    }

    /// Resources created and not yet destroyed.
    pub fn live(&self) -> u64 {
        self.created().saturating_sub(self.destroyed())
    }

    /// Total vertices uploaded.
    pub fn vertices(&self) -> u64 {
        self.vertices.load(Ordering::Relaxed)
    }

    /// Total texture bytes uploaded.
    pub fn texture_bytes(&self) -> u64 {
        self.texture_bytes.load(Ordering::Relaxed)
    }
}

/// Resource handle issued by [`HeadlessSink`].
#[derive(Debug)]
pub struct HeadlessResource {
    id: ResourceId,
    kind: ResourceKind,
    tile: TileKey,
    ledger: Arc<HeadlessLedger>,
}

impl HeadlessResource {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn tile(&self) -> TileKey {
        self.tile
    }
}

impl GpuResource for HeadlessResource {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn destroy(self) {
        self.ledger.destroyed.fetch_add(1, Ordering::Relaxed);
        trace!(id = %self.id, kind = %self.kind, tile = %self.tile, "Released");
    }
}

/// A render backend that keeps no GPU state, only bookkeeping.
///
/// Used by the CLI and tests to drive the full streaming path without a
/// graphics context. An optional failure trigger makes uploads for one tile
/// fail, either all of them or a single kind.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    next_id: u64,
    ledger: Arc<HeadlessLedger>,
    /// Tile whose uploads fail; `None` kind means every kind
    fail: Option<(TileKey, Option<ResourceKind>)>,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every upload for `tile` fail.
    pub fn with_failing_tile(mut self, tile: TileKey) -> Self {
        self.fail = Some((tile, None));
        self
    }

    /// Makes only the `kind` upload for `tile` fail.
    pub fn with_failing_upload(mut self, tile: TileKey, kind: ResourceKind) -> Self {
        self.fail = Some((tile, Some(kind)));
        self
    }

    fn rejects(&self, kind: ResourceKind, tile: TileKey) -> bool {
        match self.fail {
            Some((failing, only)) => failing == tile && only.map_or(true, |k| k == kind),
            None => false,
        }
    }

    /// Shared counters, valid after the sink is moved into a streamer.
    pub fn ledger(&self) -> Arc<HeadlessLedger> {
        Arc::clone(&self.ledger)
    }

    fn issue(
        &mut self,
        kind: ResourceKind,
        tile: TileKey,
    ) -> Result<HeadlessResource, RenderError> {
        if self.rejects(kind, tile) {
            return Err(RenderError::Upload {
                kind,
                tile,
                message: "rejected by headless sink".to_string(),
            });
        }
        self.next_id += 1;
        self.ledger.created.fetch_add(1, Ordering::Relaxed);
        let id = ResourceId(self.next_id);
        trace!(%id, %kind, %tile, "Created");
        Ok(HeadlessResource {
            id,
            kind,
            tile,
            ledger: Arc::clone(&self.ledger),
        })
    }
}

impl RenderSink for HeadlessSink {
    type Resource = HeadlessResource;

    fn upload_texture(
        &mut self,
        tile: TileKey,
        image: &RgbaImage,
    ) -> Result<HeadlessResource, RenderError> {
        let resource = self.issue(ResourceKind::Texture, tile)?;
        self.ledger
            .texture_bytes
            .fetch_add(image.as_raw().len() as u64, Ordering::Relaxed);
        Ok(resource)
    }

    fn upload_mesh(
        &mut self,
        tile: TileKey,
        mesh: &MeshPayload,
    ) -> Result<HeadlessResource, RenderError> {
        let resource = self.issue(ResourceKind::Mesh, tile)?;
        self.ledger
            .vertices
            .fetch_add(mesh.vertices().len() as u64, Ordering::Relaxed);
        Ok(resource)
    }

    fn set_world_transform(
        &mut self,
        tile: TileKey,
        _transform: &WorldTransform,
    ) -> Result<HeadlessResource, RenderError> {
        self.issue(ResourceKind::Transform, tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_counted() {
        let mut sink = HeadlessSink::new();
        let ledger = sink.ledger();
        let tile = TileKey::new(3, 1, 1);
        let a = sink.upload_texture(tile, &RgbaImage::new(2, 2)).unwrap();
        let b = sink
            .set_world_transform(
                tile,
                &WorldTransform {
                    translation: [0.0; 3],
                    scale: 1.0,
                    horizontal: 1.0,
                },
            )
            .unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(a.kind(), ResourceKind::Texture);
        assert_eq!(ledger.created(), 2);
        assert_eq!(ledger.texture_bytes(), 16);

        a.destroy();
        assert_eq!(ledger.destroyed(), 1);
        assert_eq!(ledger.live(), 1);
        b.destroy();
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn test_failing_tile_is_rejected() {
        let tile = TileKey::new(3, 1, 1);
        let mut sink = HeadlessSink::new().with_failing_tile(tile);
        let err = sink.upload_texture(tile, &RgbaImage::new(1, 1)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Upload {
                kind: ResourceKind::Texture,
                ..
            }
        ));
        assert_eq!(sink.ledger().created(), 0);
        assert!(sink
            .upload_texture(TileKey::new(3, 0, 0), &RgbaImage::new(1, 1))
            .is_ok());
    }

    #[test]
    fn test_failing_upload_rejects_one_kind() {
        let tile = TileKey::new(3, 1, 1);
        let mut sink = HeadlessSink::new().with_failing_upload(tile, ResourceKind::Transform);
        let transform = WorldTransform {
            translation: [0.0; 3],
            scale: 1.0,
            horizontal: 1.0,
        };

        assert!(sink.upload_texture(tile, &RgbaImage::new(1, 1)).is_ok());
        let err = sink.set_world_transform(tile, &transform).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Upload {
                kind: ResourceKind::Transform,
                ..
            }
        ));
        assert!(sink
            .set_world_transform(TileKey::new(3, 0, 0), &transform)
            .is_ok());
        assert_eq!(sink.ledger().created(), 2);
    }
}
