//! The per-tile fetch-and-build pipeline run on worker threads.

use tracing::debug;

use crate::coord::TileKey;
use crate::mesh::{MeshBuilder, MeshPayload};
use crate::provider::{ProviderError, TileDataProvider, MAX_ELEVATION_BATCH};

use super::LoadError;

/// Fetches everything a tile needs and builds its mesh.
///
/// 1. Spread an N×N neighborhood of sample coordinates over the tile.
/// 2. Fetch elevations in batches of at most [`MAX_ELEVATION_BATCH`], then
///    the tile's imagery.
/// 3. Decode the imagery and smooth heights onto the vertex grid.
pub(crate) fn load_tile(
    provider: &dyn TileDataProvider,
    builder: &MeshBuilder,
    tile: TileKey,
) -> Result<MeshPayload, LoadError> {
    let coords = builder.neighborhood(tile)?;

    let mut samples = Vec::with_capacity(coords.len());
    for batch in coords.chunks(MAX_ELEVATION_BATCH) {
        samples.extend(provider.fetch_elevation(batch)?);
    }
    if samples.is_empty() {
        return Err(
            ProviderError::Decode("Provider returned no elevation samples".to_string()).into(),
        );
    }

    let encoded = provider.fetch_imagery(tile)?;
    let image = image::load_from_memory(&encoded)
        .map_err(|e| {
            ProviderError::Decode(format!("Imagery for {} is not an image: {}", tile, e))
        })?
        .to_rgba8();

    debug!(
        %tile,
        samples = samples.len(),
        width = image.width(),
        height = image.height(),
        "Tile data fetched"
    );

    Ok(builder.build(tile, &samples, image)?)
}
