//! Common helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use terrastream::config::StreamConfig;

use crate::error::CliError;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "terrastream.ini";

/// Resolve the configuration: explicit path > `./terrastream.ini` > defaults.
pub fn load_config(path: Option<&Path>) -> Result<StreamConfig, CliError> {
    match path {
        Some(path) => Ok(StreamConfig::load(path)?),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            if local.is_file() {
                Ok(StreamConfig::load(&local)?)
            } else {
                Ok(StreamConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.ini");
        fs::write(&path, "[streamer]\nradius = 3\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.streamer.radius, 3);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let result = load_config(Some(Path::new("/nonexistent/terrastream.ini")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_bad_value_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ini");
        fs::write(&path, "[loader]\nworkers = lots\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("loader.workers"));
    }
}
