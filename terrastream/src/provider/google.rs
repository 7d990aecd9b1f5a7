//! Google Maps Platform elevation and imagery provider.
//!
//! Requires an API key with the Elevation API and map tiles enabled.
//!
//! # API Endpoints
//!
//! - Elevation: `https://maps.googleapis.com/maps/api/elevation/json?locations={lat},{lng}|...&key={API_KEY}`
//! - Imagery: `https://mt{server}.googleapis.com/vt?lyrs=s&x={x}&y={y}&z={z}&key={API_KEY}`
//!
//! Imagery uses the same XYZ tile indices as [`crate::coord`], so a
//! [`TileKey`] maps directly onto the URL.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tracing::debug;

use crate::coord::{GeoCoordinate, TileKey};
use crate::provider::types::check_batch;
use crate::provider::{ApiKey, ElevationSample, HttpClient, ProviderError, TileDataProvider};

const ELEVATION_URL: &str = "https://maps.googleapis.com/maps/api/elevation/json";

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: f64,
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Google Maps elevation + satellite imagery provider.
///
/// # Example
///
/// ```no_run
/// use terrastream::provider::{ApiKey, GoogleProvider, ReqwestClient};
///
/// let client = ReqwestClient::new().unwrap();
/// let key = ApiKey::from_file(".google_api_key").unwrap();
/// let provider = GoogleProvider::new(client, key);
/// ```
pub struct GoogleProvider<C: HttpClient> {
    http_client: C,
    api_key: ApiKey,
    /// Maximum sampled coordinates over the provider's lifetime
    query_budget: Option<u64>,
    queries_used: AtomicU64,
}

impl<C: HttpClient> GoogleProvider<C> {
    /// Creates a provider with no query budget.
    pub fn new(http_client: C, api_key: ApiKey) -> Self {
        Self {
            http_client,
            api_key,
            query_budget: None,
            queries_used: AtomicU64::new(0),
        }
    }

    /// Caps the total number of elevation coordinates this provider will
    /// ever request.
    pub fn with_query_budget(mut self, budget: u64) -> Self {
        self.query_budget = Some(budget);
        self
    }

    /// Coordinates requested so far.
    pub fn queries_used(&self) -> u64 {
        self.queries_used.load(Ordering::Relaxed)
    }

    fn elevation_url(&self, coords: &[GeoCoordinate]) -> String {
        let locations = coords
            .iter()
            .map(|c| format!("{:.7},{:.7}", c.lat(), c.lng()))
            .collect::<Vec<_>>()
            .join("|");
        format!(
            "{}?locations={}&key={}",
            ELEVATION_URL,
            locations,
            self.api_key.expose()
        )
    }

    /// Builds the imagery URL, spreading load across mt0-mt3.
    fn imagery_url(&self, tile: TileKey) -> String {
        let server = (tile.x as u64 + tile.y as u64) % 4;
        format!(
            "https://mt{}.googleapis.com/vt?lyrs=s&x={}&y={}&z={}&key={}",
            server,
            tile.x,
            tile.y,
            tile.zoom,
            self.api_key.expose()
        )
    }

    /// Reserves `count` coordinates against the budget.
    fn reserve(&self, count: u64) -> Result<(), ProviderError> {
        let Some(limit) = self.query_budget else {
            self.queries_used.fetch_add(count, Ordering::Relaxed);
            return Ok(());
        };
        self.queries_used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used + count <= limit).then_some(used + count)
            })
            .map(|_| ())
            .map_err(|used| ProviderError::QuotaExceeded {
                used,
                requested: count,
                limit,
            })
    }
}

fn parse_elevation(
    body: &[u8],
    expected: usize,
) -> Result<Vec<ElevationSample>, ProviderError> {
    let response: ElevationResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::Decode(format!("Invalid elevation JSON: {}", e)))?;

    match response.status.as_str() {
        "OK" => {}
        "REQUEST_DENIED" => {
            return Err(ProviderError::Authorization(
                response
                    .error_message
                    .unwrap_or_else(|| "request denied".to_string()),
            ))
        }
        _ => {
            return Err(ProviderError::Api {
                status: response.status,
                message: response.error_message.unwrap_or_default(),
            })
        }
    }

    if response.results.len() != expected {
        return Err(ProviderError::Decode(format!(
            "Expected {} elevation results, got {}",
            expected,
            response.results.len()
        )));
    }

    response
        .results
        .into_iter()
        .map(|r| {
            let location = GeoCoordinate::new(r.location.lat, r.location.lng)
                .map_err(|e| ProviderError::Decode(e.to_string()))?;
            Ok(ElevationSample {
                location,
                elevation: r.elevation,
            })
        })
        .collect()
}

impl<C: HttpClient> TileDataProvider for GoogleProvider<C> {
    fn fetch_elevation(
        &self,
        coords: &[GeoCoordinate],
    ) -> Result<Vec<ElevationSample>, ProviderError> {
        check_batch(coords)?;
        if coords.is_empty() {
            return Ok(Vec::new());
        }
        self.reserve(coords.len() as u64)?;

        debug!(count = coords.len(), "Requesting elevation batch");
        let body = self.http_client.get(&self.elevation_url(coords))?;
        parse_elevation(&body, coords.len())
    }

    fn fetch_imagery(&self, tile: TileKey) -> Result<Vec<u8>, ProviderError> {
        debug!(%tile, "Requesting imagery");
        self.http_client.get(&self.imagery_url(tile))
    }

    fn name(&self) -> &str {
        "Google Maps"
    }
}
