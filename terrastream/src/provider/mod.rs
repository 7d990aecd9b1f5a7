//! Tile data provider abstraction
//!
//! This module provides the [`TileDataProvider`] trait through which loader
//! workers fetch elevation samples and imagery, plus its implementations:
//!
//! - [`GoogleProvider`] - Google Maps Platform elevation + satellite tiles
//! - [`SyntheticProvider`] - deterministic offline terrain
//!
//! Elevation requests are limited to [`MAX_ELEVATION_BATCH`] coordinates;
//! callers split larger requests.
//!
//! ```ignore
//! use terrastream::provider::{ApiKey, GoogleProvider, ReqwestClient};
//!
//! let client = ReqwestClient::with_timeout(30)?;
//! let provider = GoogleProvider::new(client, ApiKey::from_file(".google_api_key")?);
//! ```

mod google;
mod http;
mod key;
mod synthetic;
mod types;

pub use google::GoogleProvider;
pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use key::{ApiKey, DEFAULT_API_KEY_FILE};
pub use synthetic::SyntheticProvider;
pub use types::{ElevationSample, ProviderError, TileDataProvider, MAX_ELEVATION_BATCH};

#[cfg(test)]
pub use http::tests::{MockHttpClient, RecordingHttpClient};
