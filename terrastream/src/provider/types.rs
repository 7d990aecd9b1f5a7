//! Provider trait and error types.

use thiserror::Error;

use crate::coord::{GeoCoordinate, TileKey};

/// Hard upper bound on coordinates per elevation request.
///
/// Callers split larger neighborhoods; providers reject oversized batches.
pub const MAX_ELEVATION_BATCH: usize = 512;

/// Errors that can occur while fetching tile data.
///
/// Every variant is fatal only to the tile being fetched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport-level failure or non-success HTTP status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The provider refused the credentials.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Missing or malformed provider configuration (e.g. API key).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider answered with a non-OK status.
    #[error("Provider returned {status}: {message}")]
    Api { status: String, message: String },

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// More coordinates than [`MAX_ELEVATION_BATCH`] in one request.
    #[error("Elevation batch too large: {size} coordinates (max: {max})")]
    BatchTooLarge { size: usize, max: usize },

    /// The configured elevation query budget would be exceeded.
    #[error("Elevation query budget exhausted: {used} used, {requested} requested, limit {limit}")]
    QuotaExceeded {
        used: u64,
        requested: u64,
        limit: u64,
    },
}

/// One elevation answer from a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    /// Where the elevation was sampled
    pub location: GeoCoordinate,
    /// Height above sea level in meters
    pub elevation: f64,
}

/// Source of elevation samples and imagery for tiles.
///
/// Implementations are called from loader worker threads and may block on
/// network I/O. Timeouts are the implementation's business.
pub trait TileDataProvider: Send + Sync {
    /// Fetches elevations for at most [`MAX_ELEVATION_BATCH`] coordinates.
    ///
    /// Samples are returned in request order.
    fn fetch_elevation(
        &self,
        coords: &[GeoCoordinate],
    ) -> Result<Vec<ElevationSample>, ProviderError>;

    /// Fetches encoded imagery (PNG/JPEG bytes) for a tile.
    fn fetch_imagery(&self, tile: TileKey) -> Result<Vec<u8>, ProviderError>;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}

impl<P: TileDataProvider + ?Sized> TileDataProvider for std::sync::Arc<P> {
    fn fetch_elevation(
        &self,
        coords: &[GeoCoordinate],
    ) -> Result<Vec<ElevationSample>, ProviderError> {
        (**self).fetch_elevation(coords)
    }

    fn fetch_imagery(&self, tile: TileKey) -> Result<Vec<u8>, ProviderError> {
        (**self).fetch_imagery(tile)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Rejects batches above [`MAX_ELEVATION_BATCH`].
pub(crate) fn check_batch(coords: &[GeoCoordinate]) -> Result<(), ProviderError> {
    if coords.len() > MAX_ELEVATION_BATCH {
        return Err(ProviderError::BatchTooLarge {
            size: coords.len(),
            max: MAX_ELEVATION_BATCH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_batch_limit() {
        let coords = vec![GeoCoordinate::DENVER; MAX_ELEVATION_BATCH];
        assert!(check_batch(&coords).is_ok());

        let coords = vec![GeoCoordinate::DENVER; MAX_ELEVATION_BATCH + 1];
        assert_eq!(
            check_batch(&coords),
            Err(ProviderError::BatchTooLarge {
                size: 513,
                max: 512
            })
        );
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Api {
            status: "OVER_QUERY_LIMIT".to_string(),
            message: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "Provider returned OVER_QUERY_LIMIT: slow down");
    }
}
