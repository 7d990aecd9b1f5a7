//! API key loading.

use std::fmt;
use std::fs;
use std::path::Path;

use super::types::ProviderError;

/// Default file an API key is read from.
pub const DEFAULT_API_KEY_FILE: &str = ".google_api_key";

/// Shortest key accepted as plausible.
const MIN_KEY_LEN: usize = 8;

/// A provider API key.
///
/// `Debug` and `Display` never print the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key, rejecting keys shorter than 8 characters.
    pub fn new(key: impl Into<String>) -> Result<Self, ProviderError> {
        let key = key.into();
        if key.len() < MIN_KEY_LEN {
            return Err(ProviderError::Configuration(
                "API key is not a reasonable length".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Reads the first whitespace-delimited token of `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ProviderError::Configuration(format!(
                "No API key readable at {}: {}",
                path.display(),
                e
            ))
        })?;
        let token = contents.split_whitespace().next().unwrap_or_default();
        Self::new(token)
    }

    /// The raw key, for building request URLs.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_short_key_rejected() {
        assert!(matches!(
            ApiKey::new("short"),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn test_key_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  AIzaSyExampleKey123 trailing").unwrap();

        let key = ApiKey::from_file(file.path()).unwrap();
        assert_eq!(key.expose(), "AIzaSyExampleKey123");
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ApiKey::from_file(dir.path().join("nope"));
        assert!(matches!(result, Err(ProviderError::Configuration(_))));
    }

    #[test]
    fn test_empty_file_is_configuration_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(ApiKey::from_file(file.path()).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let key = ApiKey::new("super-secret-key").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.to_string(), "***");
    }
}
