//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as empty routes, invalid prefixes, duplicate entries, bad
//! HTTP methods, unknown proxy types, and malformed target URLs. Returns a
//! list of [`ValidationError`] values with per-field suggestions. The route
//! table compiler enforces the same rules; this pass exists so `validate`
//! and the wizard can report problems without building anything.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;
use crate::routes::{parse_method, ProxyType};

/// Validate a single route prefix. Returns `Ok(())` or a human-readable error.
pub fn validate_prefix(prefix: &str) -> Result<(), String> {
    if prefix.is_empty() {
        return Err("prefix cannot be empty".into());
    }
    if !prefix.starts_with('/') {
        return Err("prefix must start with '/'".into());
    }
    Ok(())
}

/// Validate a single target URL. Returns `Ok(())` or a human-readable error.
pub fn validate_target_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Validate an HTTP method string. Returns `Ok(())` or a human-readable error.
pub fn validate_method(method: &str) -> Result<(), String> {
    parse_method(method).map(|_| ())
}

/// Validate a proxy type string. Returns `Ok(())` or a human-readable error.
pub fn validate_proxy_type(proxy_type: &str) -> Result<(), String> {
    ProxyType::parse(proxy_type).map(|_| ())
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routes.is_empty() {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "routes".into(),
            message: "at least one route must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    if config.defaults.timeout == 0 {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "defaults.timeout".into(),
            message: "timeout must be greater than 0".into(),
            suggestion: None,
        });
    }

    let mut seen_prefixes = std::collections::HashSet::new();

    for (i, route) in config.routes.iter().enumerate() {
        let route_id = if route.prefix.is_empty() {
            format!("routes[{i}]")
        } else {
            route.prefix.clone()
        };

        if let Err(msg) = validate_prefix(&route.prefix) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "prefix".into(),
                message: msg,
                suggestion: if !route.prefix.is_empty() && !route.prefix.starts_with('/') {
                    Some(format!("did you mean '/{}'?", route.prefix))
                } else {
                    None
                },
            });
        }

        if !seen_prefixes.insert(route.prefix.trim_end_matches('/')) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "prefix".into(),
                message: "duplicate route prefix".into(),
                suggestion: None,
            });
        }

        match &route.methods {
            None => {}
            Some(methods) if methods.is_empty() => {
                errors.push(ValidationError {
                    route: route_id.clone(),
                    field: "methods".into(),
                    message: "methods cannot be empty".into(),
                    suggestion: Some("omit the field to accept all methods".into()),
                });
            }
            Some(methods) => {
                for method in methods {
                    if let Err(msg) = validate_method(method) {
                        errors.push(ValidationError {
                            route: route_id.clone(),
                            field: "methods".into(),
                            message: msg,
                            suggestion: None,
                        });
                    }
                }
            }
        }

        if let Err(msg) = validate_target_url(&route.target) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "target".into(),
                message: msg,
                suggestion: None,
            });
        }

        if let Err(msg) = validate_proxy_type(&route.proxy_type) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "proxy_type".into(),
                message: msg,
                suggestion: None,
            });
        }

        if route.timeout == Some(0) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "timeout".into(),
                message: "timeout must be greater than 0".into(),
                suggestion: None,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!("  {} routes\n", config.routes.len())];

    for route in &config.routes {
        let methods = route
            .methods
            .as_ref()
            .map_or_else(|| "all (default)".to_string(), |m| m.join(", "));
        let timeout = route.timeout.map_or_else(
            || format!("{}ms (default)", config.defaults.timeout),
            |t| format!("{t}ms"),
        );
        let pattern = route
            .path_pattern
            .as_deref()
            .unwrap_or(&config.defaults.path_pattern);

        lines.push(format!("  {}  -> {}", route.prefix, route.target));
        lines.push(format!("    methods: {methods}"));
        lines.push(format!("    timeout: {timeout}"));
        lines.push(format!("    pattern: {pattern}"));
        if !route.prefix_rewrite.is_empty() {
            lines.push(format!("    rewrite: {}", route.prefix_rewrite));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Config, Defaults, RouteConfig};

    fn route(prefix: &str, target: &str) -> RouteConfig {
        RouteConfig {
            prefix: prefix.into(),
            target: target.into(),
            docs: None,
            path_pattern: None,
            methods: None,
            timeout: None,
            proxy_type: "http".into(),
            prefix_rewrite: String::new(),
        }
    }

    fn config_with(routes: Vec<RouteConfig>) -> Config {
        Config {
            defaults: Defaults::default(),
            routes,
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = config_with(vec![route("/test", "http://localhost:8080")]);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn empty_routes_fails() {
        let errors = validate(&config_with(vec![])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least one route"));
    }

    #[test]
    fn duplicate_prefix_fails() {
        let config = config_with(vec![
            route("/test", "http://a:80"),
            route("/test", "http://b:80"),
        ]);
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }

    #[test]
    fn invalid_url_fails() {
        let config = config_with(vec![route("/test", "not a url")]);
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("not a valid URL")));
    }

    #[test]
    fn prefix_without_slash_fails() {
        let config = config_with(vec![route("test", "http://localhost:8080")]);
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean '/test'?")));
    }

    #[test]
    fn invalid_method_fails() {
        let mut bad = route("/test", "http://localhost:8080");
        bad.methods = Some(vec!["INVALID".into()]);
        let errors = validate(&config_with(vec![bad])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("not a supported HTTP method")));
    }

    #[test]
    fn lowercase_methods_pass() {
        let mut ok = route("/test", "http://localhost:8080");
        ok.methods = Some(vec!["get".into(), "post".into()]);
        assert!(validate(&config_with(vec![ok])).is_ok());
    }

    #[test]
    fn unknown_proxy_type_fails() {
        let mut bad = route("/test", "http://localhost:8080");
        bad.proxy_type = "websocket".into();
        let errors = validate(&config_with(vec![bad])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("unsupported proxy type")));
    }

    #[test]
    fn zero_timeout_fails() {
        let mut bad = route("/test", "http://localhost:8080");
        bad.timeout = Some(0);
        let errors = validate(&config_with(vec![bad])).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("greater than 0")));
    }

    #[test]
    fn report_lists_routes() {
        let mut documented = route("/orders", "http://orders:8080");
        documented.methods = Some(vec!["GET".into()]);
        documented.timeout = Some(2000);
        let config = config_with(vec![documented]);
        let report = format_validation_report("portico.yaml", &config);
        assert!(report.contains("portico.yaml is valid"));
        assert!(report.contains("/orders  -> http://orders:8080"));
        assert!(report.contains("methods: GET"));
        assert!(report.contains("timeout: 2000ms"));
    }
}
