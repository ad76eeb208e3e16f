//! Configuration loading and validation.
//!
//! A gateway process reads its route table from one file at startup.
//! [`load_path`] parses (by extension), validates, and hashes the file in a
//! single pass; [`detect_config_file`] probes the conventional file names in
//! the working directory. Submodules provide the data model and the
//! validation logic shared with the `init` wizard.

pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::PorticoError;
use model::Config;
use validation::validate;

/// File names probed (in order) when no `--config` flag is given.
pub const CONFIG_CANDIDATES: &[&str] = &["portico.yaml", "portico.yml", "portico.json"];

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, PorticoError> {
    match ext {
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| PorticoError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        "json" => serde_json::from_str(content).map_err(|e| PorticoError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(PorticoError::UnsupportedFormat(other.to_string())),
    }
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Read, parse, and validate a config file.
///
/// Returns the config together with the SHA-256 digest of the raw file
/// bytes, which `/health` reports so operators can tell which revision a
/// running gateway was started from.
pub fn load_path(path: &Path) -> Result<(Config, String), PorticoError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PorticoError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PorticoError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validate(&config) {
        return Err(PorticoError::ConfigValidation { errors });
    }

    let digest = sha256_hex(content.as_bytes());
    Ok((config, digest))
}

/// Look for a conventional config file in the current directory.
#[must_use]
pub fn detect_config_file() -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r"
routes:
  - prefix: /svc
    target: http://localhost:3000
";

    #[test]
    fn parses_yaml_by_extension() {
        let config = parse_config_str("yaml", YAML, "test.yaml").unwrap();
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].prefix, "/svc");
    }

    #[test]
    fn parses_json_by_extension() {
        let json = r#"{"routes":[{"prefix":"/svc","target":"http://localhost:3000"}]}"#;
        let config = parse_config_str("json", json, "test.json").unwrap();
        assert_eq!(config.routes[0].target, "http://localhost:3000");
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = parse_config_str("ini", "", "test.ini").unwrap_err();
        assert!(matches!(err, PorticoError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = load_path(Path::new("/nonexistent/portico.yaml")).unwrap_err();
        assert!(matches!(err, PorticoError::ConfigFileNotFound { .. }));
    }

    #[test]
    fn digest_is_stable_hex() {
        let digest = sha256_hex(b"hello");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
