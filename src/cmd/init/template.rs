//! Static config templates for non-interactive `init`.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::PorticoError;

pub fn run(args: &InitArgs) -> Result<(), PorticoError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("portico.{}", args.format.extension())));

    if output.exists() {
        return Err(PorticoError::FileExists { path: output });
    }

    let content = match (&args.format, args.full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
    };

    std::fs::write(&output, content)?;
    println!("Created {}", output.display());
    Ok(())
}

const YAML_MINIMAL: &str = r#"# Portico config

routes:
  - prefix: "/example"
    target: "http://localhost:3000"
"#;

const YAML_FULL: &str = r#"# Portico config
#
# All values shown are defaults. Uncomment and modify as needed.

# Global defaults applied to all routes unless overridden
# defaults:
#   timeout: 30000             # Upstream timeout in ms
#   path_pattern: "/*"         # Accepted paths after the prefix
#   forward_headers: true      # Forward client headers upstream
#   proxy_headers: true        # Add X-Forwarded-*, Via headers
#   strip_hop_by_hop: true     # Strip Connection, TE, etc.

routes:
  # Simple: prefix and target, everything else defaulted.
  # Routes are matched in the order listed here; the first prefix that
  # matches wins.
  - prefix: "/example"
    target: "http://localhost:3000"

  # Full: all options shown
  # - prefix: "/orders"
  #   target: "http://orders:8080"
  #   docs: "Order management service"
  #   path_pattern: "/*"               # Default: gateway path_pattern
  #   methods: ["GET", "POST"]         # Default: all methods
  #   timeout: 10000                   # Override default for this route
  #   proxy_type: "http"               # Default: http
  #   prefix_rewrite: "/v2/orders"     # Default: "" (prefix is stripped)

  # Catch-all: a "/" prefix matches every path not claimed above
  # - prefix: "/"
  #   target: "http://fallback:8080"
"#;

const JSON_MINIMAL: &str = r#"{
  "routes": [
    {
      "prefix": "/example",
      "target": "http://localhost:3000"
    }
  ]
}
"#;

const JSON_FULL: &str = r#"{
  "defaults": {
    "timeout": 30000,
    "path_pattern": "/*",
    "forward_headers": true,
    "proxy_headers": true,
    "strip_hop_by_hop": true
  },
  "routes": [
    {
      "prefix": "/example",
      "target": "http://localhost:3000",
      "docs": "Example service",
      "methods": ["GET", "POST"],
      "timeout": 10000,
      "proxy_type": "http",
      "prefix_rewrite": ""
    }
  ]
}
"#;
