//! Offsets that align geometry across zoom levels.
//!
//! A zoom `z-1` tile does not sit exactly under the four zoom `z` tiles that
//! share its center, because latitude is compressed non-linearly. The offset
//! between two zoom levels is the displacement between the centers of the
//! tiles containing a coordinate at each level.
//!
//! Single steps are measured from the tile extents at both levels; longer
//! spans are composed recursively through every intermediate zoom. Results
//! are memoized per `(coordinate, from, to)` because every camera tick asks
//! for the same handful of offsets.

use std::ops::Add;

use dashmap::DashMap;

use super::{extent, to_geo, to_tile, CoordError, GeoCoordinate, TileKey, MAX_ZOOM};

/// Displacement in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomOffset {
    pub d_lat: f64,
    pub d_lng: f64,
}

impl Add for ZoomOffset {
    type Output = ZoomOffset;

    fn add(self, rhs: ZoomOffset) -> ZoomOffset {
        ZoomOffset {
            d_lat: self.d_lat + rhs.d_lat,
            d_lng: self.d_lng + rhs.d_lng,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AlignmentKey {
    lat_bits: u64,
    lng_bits: u64,
    from: u8,
    to: u8,
}

/// Memoizing calculator for zoom alignment offsets.
///
/// Safe to share between threads; the memo table is a `DashMap`.
pub struct ZoomAlignment {
    tile_size: u32,
    memo: DashMap<AlignmentKey, ZoomOffset>,
}

impl ZoomAlignment {
    /// Creates an empty calculator for tiles of `tile_size` pixels.
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            memo: DashMap::new(),
        }
    }

    /// Offset to move geometry placed at `from_zoom` so it lines up with
    /// geometry at `to_zoom` around `coord`.
    pub fn offset_between_zooms(
        &self,
        coord: GeoCoordinate,
        from_zoom: u8,
        to_zoom: u8,
    ) -> Result<ZoomOffset, CoordError> {
        for zoom in [from_zoom, to_zoom] {
            if zoom > MAX_ZOOM {
                return Err(CoordError::InvalidZoom(zoom));
            }
        }
        if from_zoom == to_zoom {
            return Ok(ZoomOffset::default());
        }

        let (lat_bits, lng_bits) = coord.bits();
        let key = AlignmentKey {
            lat_bits,
            lng_bits,
            from: from_zoom,
            to: to_zoom,
        };
        if let Some(hit) = self.memo.get(&key).map(|entry| *entry) {
            return Ok(hit);
        }

        let offset = if from_zoom.abs_diff(to_zoom) == 1 {
            self.single_step(coord, from_zoom, to_zoom)?
        } else {
            let next = if to_zoom > from_zoom {
                from_zoom + 1
            } else {
                from_zoom - 1
            };
            self.offset_between_zooms(coord, from_zoom, next)?
                + self.offset_between_zooms(coord, next, to_zoom)?
        };

        self.memo.insert(key, offset);
        Ok(offset)
    }

    /// Number of memoized offsets.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    fn single_step(
        &self,
        coord: GeoCoordinate,
        from_zoom: u8,
        to_zoom: u8,
    ) -> Result<ZoomOffset, CoordError> {
        let (from_lat, from_lng) = self.center_of(to_tile(coord, self.tile_size, from_zoom)?)?;
        let (to_lat, to_lng) = self.center_of(to_tile(coord, self.tile_size, to_zoom)?)?;
        Ok(ZoomOffset {
            d_lat: to_lat - from_lat,
            d_lng: to_lng - from_lng,
        })
    }

    fn center_of(&self, tile: TileKey) -> Result<(f64, f64), CoordError> {
        let corner = to_geo(tile, self.tile_size)?;
        let ext = extent(tile)?;
        Ok((corner.lat() - ext.half_lat, corner.lng() + ext.half_lng))
    }
}
