//! Serialize a [`Config`] struct to the chosen output format.

use crate::cli::ConfigFormat;
use crate::config::model::Config;
use crate::error::PorticoError;

/// Serialize a `Config` to a formatted string in the given format.
pub fn serialize_config(config: &Config, format: &ConfigFormat) -> Result<String, PorticoError> {
    match format {
        ConfigFormat::Yaml => serde_yml::to_string(config)
            .map_err(|e| PorticoError::Io(std::io::Error::other(e.to_string()))),

        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| PorticoError::Io(std::io::Error::other(e.to_string()))),
    }
}
