//! Serde data structures for the Portico configuration file.
//!
//! Contains [`Config`] (the root), [`RouteConfig`], and [`Defaults`]. All
//! types derive `Serialize` and `Deserialize` with `deny_unknown_fields`
//! for strict parsing, and the serialized form omits anything still at its
//! default so generated files stay small.

use serde::{Deserialize, Serialize};

const fn default_timeout() -> u64 {
    30_000
}

const fn default_true() -> bool {
    true
}

fn default_path_pattern() -> String {
    "/*".to_string()
}

fn default_proxy_type() -> String {
    "http".to_string()
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_default_path_pattern(v: &str) -> bool {
    v == "/*"
}

fn is_default_proxy_type(v: &str) -> bool {
    v == "http"
}

fn is_default_defaults(v: &Defaults) -> bool {
    v.timeout == default_timeout()
        && v.path_pattern == "/*"
        && v.forward_headers
        && v.proxy_headers
        && v.strip_hop_by_hop
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "is_default_defaults")]
    pub defaults: Defaults,

    pub routes: Vec<RouteConfig>,
}

/// Gateway-wide fallbacks, overridable per route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Upstream timeout in milliseconds.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,

    /// Pattern matched against the path remainder after the route prefix.
    #[serde(
        default = "default_path_pattern",
        skip_serializing_if = "is_default_path_pattern"
    )]
    pub path_pattern: String,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub forward_headers: bool,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub proxy_headers: bool,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub strip_hop_by_hop: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            path_pattern: default_path_pattern(),
            forward_headers: default_true(),
            proxy_headers: default_true(),
            strip_hop_by_hop: default_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Path prefix this route owns, e.g. `/orders`.
    pub prefix: String,

    /// Upstream base URL, e.g. `http://orders.internal:8080`.
    pub target: String,

    /// Free-form description surfaced by `/services.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,

    /// Accepted verbs; omit to accept the full default set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,

    /// Upstream timeout override in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(
        default = "default_proxy_type",
        skip_serializing_if = "is_default_proxy_type"
    )]
    pub proxy_type: String,

    /// Replacement for the stripped prefix when building the outbound path.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix_rewrite: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_route_round_trips() {
        let yaml = "routes:\n  - prefix: /svc\n    target: http://upstream:8080\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].proxy_type, "http");
        assert_eq!(config.routes[0].prefix_rewrite, "");
        assert!(config.routes[0].methods.is_none());
        assert_eq!(config.defaults.timeout, 30_000);
        assert_eq!(config.defaults.path_pattern, "/*");

        let out = serde_yml::to_string(&config).unwrap();
        assert!(out.contains("/svc"));
        // Defaults and unset options stay out of the serialized form.
        assert!(!out.contains("proxy_type"));
        assert!(!out.contains("defaults"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let yaml = "routes:\n  - prefix: /svc\n    target: http://upstream:8080\n    shiny: true\n";
        assert!(serde_yml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn defaults_section_parses() {
        let yaml = concat!(
            "defaults:\n",
            "  timeout: 5000\n",
            "  path_pattern: \"/v1/*\"\n",
            "  proxy_headers: false\n",
            "routes:\n",
            "  - prefix: /svc\n",
            "    target: http://upstream:8080\n",
        );
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.defaults.timeout, 5000);
        assert_eq!(config.defaults.path_pattern, "/v1/*");
        assert!(!config.defaults.proxy_headers);
        assert!(config.defaults.forward_headers);
    }
}
