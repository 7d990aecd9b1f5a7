//! Deterministic offline provider.
//!
//! Produces smooth analytic terrain and small generated PNG tiles without
//! touching the network. Used for offline runs and for exercising the
//! loader in tests (latency and per-tile failures can be injected).

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::coord::{GeoCoordinate, TileKey};
use crate::provider::types::check_batch;
use crate::provider::{ElevationSample, ProviderError, TileDataProvider};

/// Edge length of generated imagery in pixels.
const IMAGE_SIZE: u32 = 16;

/// Offline provider with analytic elevation.
#[derive(Default)]
pub struct SyntheticProvider {
    latency: Duration,
    failing_imagery: HashSet<TileKey>,
    elevation_calls: AtomicUsize,
    imagery_calls: AtomicUsize,
}

impl SyntheticProvider {
    /// Creates a provider that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `latency` inside every fetch, like a slow network.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes imagery for `tile` fail with a configuration error.
    pub fn with_failing_imagery(mut self, tile: TileKey) -> Self {
        self.failing_imagery.insert(tile);
        self
    }

    /// Number of elevation batches served.
    pub fn elevation_calls(&self) -> usize {
        self.elevation_calls.load(Ordering::SeqCst)
    }

    /// Number of imagery requests served (including failures).
    pub fn imagery_calls(&self) -> usize {
        self.imagery_calls.load(Ordering::SeqCst)
    }

    /// Terrain height in meters at a coordinate.
    pub fn elevation_at(coord: GeoCoordinate) -> f64 {
        let (lat, lng) = (coord.lat().to_radians(), coord.lng().to_radians());
        1600.0 + 250.0 * (lat * 400.0).sin() * (lng * 400.0).cos()
    }

    fn pause(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }
}

impl TileDataProvider for SyntheticProvider {
    fn fetch_elevation(
        &self,
        coords: &[GeoCoordinate],
    ) -> Result<Vec<ElevationSample>, ProviderError> {
        check_batch(coords)?;
        self.elevation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();

        Ok(coords
            .iter()
            .map(|&location| ElevationSample {
                location,
                elevation: Self::elevation_at(location),
            })
            .collect())
    }

    fn fetch_imagery(&self, tile: TileKey) -> Result<Vec<u8>, ProviderError> {
        self.imagery_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();

        if self.failing_imagery.contains(&tile) {
            return Err(ProviderError::Configuration(format!(
                "No imagery access configured for tile {}",
                tile
            )));
        }

        let shade = ((tile.x ^ tile.y) % 200) as u8;
        let img = RgbaImage::from_fn(IMAGE_SIZE, IMAGE_SIZE, |x, y| {
            Rgba([shade, (x * 16) as u8, (y * 16) as u8, 255])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ProviderError::Decode(format!("PNG encoding failed: {}", e)))?;
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "Synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_is_deterministic() {
        let provider = SyntheticProvider::new();
        let coords = [GeoCoordinate::DENVER, GeoCoordinate::new(0.0, 0.0).unwrap()];
        let a = provider.fetch_elevation(&coords).unwrap();
        let b = provider.fetch_elevation(&coords).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].location, GeoCoordinate::DENVER);
        assert_eq!(provider.elevation_calls(), 2);
    }

    #[test]
    fn test_imagery_decodes_as_png() {
        let provider = SyntheticProvider::new();
        let bytes = provider.fetch_imagery(TileKey::new(3, 1, 2)).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), IMAGE_SIZE);
        assert_eq!(img.height(), IMAGE_SIZE);
    }

    #[test]
    fn test_failing_imagery_is_configuration_error() {
        let tile = TileKey::new(3, 1, 2);
        let provider = SyntheticProvider::new().with_failing_imagery(tile);
        assert!(matches!(
            provider.fetch_imagery(tile),
            Err(ProviderError::Configuration(_))
        ));
        assert!(provider.fetch_imagery(TileKey::new(3, 2, 2)).is_ok());
        assert_eq!(provider.imagery_calls(), 2);
    }

    #[test]
    fn test_rejects_oversized_batch() {
        let provider = SyntheticProvider::new();
        let coords = vec![GeoCoordinate::DENVER; 513];
        assert!(provider.fetch_elevation(&coords).is_err());
    }
}
