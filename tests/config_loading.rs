//! Integration tests for config loading across file formats.

use portico::config::model::Config;
use portico::config::parse_config_str;
use portico::config::validation::validate;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("portico.yaml");
    let config = parse_config_str("yaml", &content, "portico.yaml").unwrap();
    validate(&config).unwrap();
    assert!(!config.routes.is_empty());
}

#[test]
fn yaml_full_example_loads_and_validates() {
    let content = load_example("full.yaml");
    let config = parse_config_str("yaml", &content, "full.yaml").unwrap();
    validate(&config).unwrap();
    assert!(config.routes.len() >= 3);

    // The catch-all route is declared last so it cannot shadow the others.
    assert_eq!(config.routes.last().unwrap().prefix, "/");
}

#[test]
fn json_example_loads_and_validates() {
    let content = load_example("portico.json");
    let config = parse_config_str("json", &content, "portico.json").unwrap();
    validate(&config).unwrap();
    assert!(!config.routes.is_empty());
}

#[test]
fn yaml_and_json_produce_equivalent_configs() {
    let yaml_content = load_example("portico.yaml");
    let json_content = load_example("portico.json");

    let yaml_config = parse_config_str("yaml", &yaml_content, "yaml").unwrap();
    let json_config = parse_config_str("json", &json_content, "json").unwrap();

    assert_eq!(yaml_config.routes.len(), json_config.routes.len());
    for (yaml_route, json_route) in yaml_config.routes.iter().zip(&json_config.routes) {
        assert_eq!(yaml_route.prefix, json_route.prefix);
        assert_eq!(yaml_route.target, json_route.target);
        assert_eq!(yaml_route.docs, json_route.docs);
    }
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "test.xml");
    assert!(result.is_err());
}

#[test]
fn invalid_config_fails_validation() {
    let empty = r#"{"routes": []}"#;
    let config: Config = serde_json::from_str(empty).unwrap();
    assert!(validate(&config).is_err());
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{
        "routes": [
            {"prefix": "/a", "target": "http://a:80", "retries": 5}
        ]
    }"#;
    assert!(serde_json::from_str::<Config>(json).is_err());
}

#[test]
fn omitted_defaults_fill_in() {
    let json = r#"{"routes": [{"prefix": "/a", "target": "http://a:80"}]}"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.defaults.timeout, 30_000);
    assert_eq!(config.defaults.path_pattern, "/*");
    assert!(config.defaults.forward_headers);
    assert!(config.defaults.proxy_headers);
    assert!(config.defaults.strip_hop_by_hop);

    let route = &config.routes[0];
    assert_eq!(route.proxy_type, "http");
    assert_eq!(route.prefix_rewrite, "");
    assert!(route.methods.is_none());
    assert!(route.timeout.is_none());
}

#[test]
fn duplicate_prefixes_fail_validation() {
    let json = r#"{
        "routes": [
            {"prefix": "/a", "target": "http://a:80"},
            {"prefix": "/a", "target": "http://b:80"}
        ]
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let errors = validate(&config).unwrap_err();
    assert!(errors.iter().any(|e| e.message.contains("duplicate")));
}
