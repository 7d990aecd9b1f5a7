//! Streaming configuration and INI loading.
//!
//! All settings have defaults; a config file only needs the keys it changes.
//!
//! ```ini
//! [loader]
//! workers = 8
//! resolution = 32
//! elevation_grid = 5
//!
//! [idw]
//! power = 2.0
//! min_distance = 0.001
//!
//! [streamer]
//! radius = 2
//! tile_size = 256
//! tile_world_size = 100.0
//!
//! [provider]
//! api_key_file = .google_api_key
//! timeout_secs = 30
//! elevation_query_budget = 10000
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loader::LoaderConfig;
use crate::mesh::{MAX_ELEVATION_GRID, MAX_RESOLUTION};
use crate::provider::{
    ApiKey, GoogleProvider, ProviderError, ReqwestClient, DEFAULT_API_KEY_FILE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::streamer::StreamerConfig;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// The text is not valid INI.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A key holds a value of the wrong type or range.
    #[error("Invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Data provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// File holding the provider API key
    pub api_key_file: PathBuf,
    /// HTTP request timeout
    pub timeout_secs: u64,
    /// Cap on elevation coordinates sampled over the session
    pub elevation_query_budget: Option<u64>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key_file: PathBuf::from(DEFAULT_API_KEY_FILE),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            elevation_query_budget: None,
        }
    }
}

impl ProviderSettings {
    /// Set the API key file.
    pub fn with_api_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.api_key_file = path.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Cap the number of elevation coordinates sampled.
    pub fn with_elevation_query_budget(mut self, budget: u64) -> Self {
        self.elevation_query_budget = Some(budget);
        self
    }

    /// Builds a Google provider from these settings.
    pub fn google_provider(&self) -> Result<GoogleProvider<ReqwestClient>, ProviderError> {
        let key = ApiKey::from_file(&self.api_key_file)?;
        let client = ReqwestClient::with_timeout(self.timeout_secs)?;
        let provider = GoogleProvider::new(client, key);
        Ok(match self.elevation_query_budget {
            Some(budget) => provider.with_query_budget(budget),
            None => provider,
        })
    }
}

/// Complete configuration for a streaming session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub loader: LoaderConfig,
    pub streamer: StreamerConfig,
    pub provider: ProviderSettings,
}

impl StreamConfig {
    /// Replace the loader settings.
    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the streamer settings.
    pub fn with_streamer(mut self, streamer: StreamerConfig) -> Self {
        self.streamer = streamer;
        self
    }

    /// Replace the provider settings.
    pub fn with_provider(mut self, provider: ProviderSettings) -> Self {
        self.provider = provider;
        self
    }

    /// Loads configuration from an INI file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = StreamConfig::default();

        if let Some(section) = ini.section(Some("loader")) {
            let loader = &mut config.loader;
            if let Some(workers) = parse::<usize>(section, "loader", "workers")? {
                loader.workers = at_least(workers, 1, "loader", "workers")?;
            }
            if let Some(res) = parse::<u32>(section, "loader", "resolution")? {
                loader.resolution = within(res, 2, MAX_RESOLUTION, "loader", "resolution")?;
            }
            if let Some(grid) = parse::<u32>(section, "loader", "elevation_grid")? {
                loader.elevation_grid =
                    within(grid, 2, MAX_ELEVATION_GRID, "loader", "elevation_grid")?;
            }
        }

        if let Some(section) = ini.section(Some("idw")) {
            let idw = &mut config.loader.idw;
            if let Some(power) = parse::<f64>(section, "idw", "power")? {
                idw.power = power;
            }
            if let Some(min) = parse::<f64>(section, "idw", "min_distance")? {
                if min <= 0.0 {
                    return Err(invalid("idw", "min_distance", min, "must be positive"));
                }
                idw.min_distance = min;
            }
        }

        if let Some(section) = ini.section(Some("streamer")) {
            let streamer = &mut config.streamer;
            if let Some(radius) = parse::<u32>(section, "streamer", "radius")? {
                streamer.radius = radius;
            }
            if let Some(size) = parse::<u32>(section, "streamer", "tile_size")? {
                streamer.tile_size = at_least(size, 1, "streamer", "tile_size")?;
            }
            if let Some(size) = parse::<f64>(section, "streamer", "tile_world_size")? {
                if size <= 0.0 {
                    return Err(invalid("streamer", "tile_world_size", size, "must be positive"));
                }
                streamer.tile_world_size = size;
            }
        }

        if let Some(section) = ini.section(Some("provider")) {
            let provider = &mut config.provider;
            if let Some(file) = section.get("api_key_file").map(str::trim) {
                if !file.is_empty() {
                    provider.api_key_file = PathBuf::from(file);
                }
            }
            if let Some(secs) = parse::<u64>(section, "provider", "timeout_secs")? {
                provider.timeout_secs = secs;
            }
            if let Some(budget) = parse::<u64>(section, "provider", "elevation_query_budget")? {
                provider.elevation_query_budget = Some(budget);
            }
        }

        Ok(config)
    }
}

/// Reads and parses `key`, treating missing and empty values as unset.
fn parse<T>(section: &Properties, name: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = section.get(key).map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| invalid(name, key, raw, e))
}

fn at_least<T>(value: T, min: T, section: &str, key: &str) -> Result<T, ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min {
        return Err(invalid(section, key, &value, format!("must be at least {}", min)));
    }
    Ok(value)
}

fn within<T>(value: T, min: T, max: T, section: &str, key: &str) -> Result<T, ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value > max {
        return Err(invalid(section, key, &value, format!("must be at most {}", max)));
    }
    at_least(value, min, section, key)
}

fn invalid(
    section: &str,
    key: &str,
    value: impl std::fmt::Display,
    reason: impl std::fmt::Display,
) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_text_gives_defaults() {
        let config = StreamConfig::from_ini_str("").unwrap();
        assert_eq!(config, StreamConfig::default());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = StreamConfig::from_ini_str(
            "[loader]\nworkers = 8\nresolution = 16\n\n\
             [idw]\npower = 3.5\n\n\
             [streamer]\nradius = 2\ntile_world_size = 50.0\n\n\
             [provider]\napi_key_file = /etc/key\nelevation_query_budget = 900\n",
        )
        .unwrap();

        assert_eq!(config.loader.workers, 8);
        assert_eq!(config.loader.resolution, 16);
        assert_eq!(config.loader.elevation_grid, 5);
        assert_eq!(config.loader.idw.power, 3.5);
        assert_eq!(config.streamer.radius, 2);
        assert_eq!(config.streamer.tile_size, 256);
        assert_eq!(config.streamer.tile_world_size, 50.0);
        assert_eq!(config.provider.api_key_file, PathBuf::from("/etc/key"));
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.provider.elevation_query_budget, Some(900));
    }

    #[test]
    fn test_unparsable_value_is_rejected() {
        let err = StreamConfig::from_ini_str("[loader]\nworkers = many\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "loader");
                assert_eq!(key, "workers");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(matches!(
            StreamConfig::from_ini_str("[loader]\nresolution = 1\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            StreamConfig::from_ini_str("[loader]\nresolution = 100000\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            StreamConfig::from_ini_str("[loader]\nelevation_grid = 65\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            StreamConfig::from_ini_str("[idw]\nmin_distance = 0\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_value_keeps_default() {
        let config = StreamConfig::from_ini_str("[streamer]\nradius =\n").unwrap();
        assert_eq!(config.streamer.radius, 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[loader]").unwrap();
        writeln!(file, "elevation_grid = 7").unwrap();
        file.flush().unwrap();

        let config = StreamConfig::load(file.path()).unwrap();
        assert_eq!(config.loader.elevation_grid, 7);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = StreamConfig::load("/nonexistent/terrastream.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_google_provider_requires_key_file() {
        let settings = ProviderSettings::default().with_api_key_file("/nonexistent/key");
        assert!(matches!(
            settings.google_provider(),
            Err(ProviderError::Configuration(_))
        ));
    }
}
