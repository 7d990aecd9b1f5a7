//! CLI error types.

use std::fmt;

use terrastream::config::ConfigError;
use terrastream::coord::CoordError;
use terrastream::loader::LoadError;
use terrastream::logging::LoggingError;
use terrastream::provider::ProviderError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or unreadable configuration.
    Config(String),

    /// The requested location or zoom is unusable.
    Location(CoordError),

    /// The data provider could not be set up.
    Provider(ProviderError),

    /// The tile loader could not be started.
    Loader(LoadError),

    /// Logging could not be installed.
    Logging(LoggingError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Location(e) => write!(f, "Invalid location: {}", e),
            CliError::Provider(e) => write!(f, "Provider setup failed: {}", e),
            CliError::Loader(e) => write!(f, "Failed to start tile loader: {}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Location(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Loader(e) => Some(e),
            CliError::Logging(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Location(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        CliError::Loader(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config("bad radius".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad radius");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_location_error_has_source() {
        let err: CliError = CoordError::InvalidCoordinate {
            lat: 91.0,
            lng: 0.0,
        }
        .into();
        assert!(err.to_string().starts_with("Invalid location:"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_provider_error_conversion() {
        let err: CliError = ProviderError::Configuration("no key".to_string()).into();
        assert!(matches!(err, CliError::Provider(_)));
        assert!(err.to_string().contains("no key"));
    }
}
