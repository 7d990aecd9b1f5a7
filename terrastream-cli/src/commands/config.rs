//! Config command - show the effective configuration.

use std::path::PathBuf;

use super::common::load_config;
use crate::error::CliError;

/// Print the configuration a `stream` run would use, as JSON.
pub fn run(path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(path.as_deref())?;
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| CliError::Config(format!("Failed to render configuration: {}", e)))?;
    println!("{}", json);
    Ok(())
}
