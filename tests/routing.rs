//! Integration tests for ordered route matching through the public API.

use std::sync::Arc;

use hyper::Method;
use portico::routes::RouteTable;
use portico::{Gateway, Route};

fn table(routes: Vec<Route>) -> Gateway {
    Gateway::builder().routes(routes).build().unwrap()
}

fn matched_prefix<'a>(gateway: &'a Gateway, method: &Method, path: &str) -> Option<&'a str> {
    gateway
        .table()
        .find(method, path)
        .map(|route| route.prefix.as_str())
}

#[test]
fn registration_order_beats_specificity() {
    // The broader prefix is registered first, so it claims everything under
    // it even though a more specific route exists.
    let gateway = table(vec![
        Route::new("/api", "http://general:8080"),
        Route::new("/api/users", "http://users:8080"),
    ]);

    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/api/users/42"),
        Some("/api")
    );
    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/api/orders"),
        Some("/api")
    );
}

#[test]
fn narrower_route_first_still_leaves_the_rest() {
    let gateway = table(vec![
        Route::new("/api/users", "http://users:8080"),
        Route::new("/api", "http://general:8080"),
    ]);

    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/api/users/42"),
        Some("/api/users")
    );
    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/api/orders"),
        Some("/api")
    );
}

#[test]
fn prefix_matching_is_segment_safe() {
    let gateway = table(vec![Route::new("/api", "http://api:8080")]);

    assert_eq!(matched_prefix(&gateway, &Method::GET, "/api"), Some("/api"));
    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/api/users"),
        Some("/api")
    );
    // A longer word sharing the prefix characters is a different path.
    assert_eq!(matched_prefix(&gateway, &Method::GET, "/apifoo"), None);
}

#[test]
fn root_prefix_catches_everything() {
    let gateway = table(vec![
        Route::new("/svc", "http://svc:8080"),
        Route::new("/", "http://fallback:8080"),
    ]);

    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/svc/x"),
        Some("/svc")
    );
    assert_eq!(matched_prefix(&gateway, &Method::GET, "/other"), Some("/"));
    assert_eq!(matched_prefix(&gateway, &Method::GET, "/"), Some("/"));
}

#[test]
fn method_restriction_falls_through_to_later_route() {
    let gateway = table(vec![
        Route::new("/api/items", "http://writer:8080").methods(["POST"]),
        Route::new("/api", "http://reader:8080"),
    ]);

    assert_eq!(
        matched_prefix(&gateway, &Method::POST, "/api/items"),
        Some("/api/items")
    );
    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/api/items"),
        Some("/api")
    );
}

#[test]
fn trailing_slash_in_declaration_is_ignored_for_matching() {
    let gateway = table(vec![Route::new("/api/", "http://api:8080")]);

    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/api/users"),
        Some("/api/")
    );
    assert_eq!(matched_prefix(&gateway, &Method::GET, "/api"), Some("/api/"));
}

#[test]
fn no_route_returns_none() {
    let gateway = table(vec![Route::new("/svc", "http://svc:8080")]);
    assert_eq!(matched_prefix(&gateway, &Method::GET, "/other"), None);
}

#[test]
fn exact_path_pattern_restricts_depth() {
    let gateway = table(vec![
        Route::new("/ping", "http://ping:8080").path_pattern("")
    ]);

    assert_eq!(matched_prefix(&gateway, &Method::GET, "/ping"), Some("/ping"));
    assert_eq!(matched_prefix(&gateway, &Method::GET, "/ping/deep"), None);
}

#[test]
fn wildcard_pattern_matches_head_and_below() {
    let gateway = table(vec![
        Route::new("/files", "http://files:8080").path_pattern("/public/*")
    ]);

    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/files/public"),
        Some("/files")
    );
    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/files/public/a/b.txt"),
        Some("/files")
    );
    assert_eq!(matched_prefix(&gateway, &Method::GET, "/files/private/x"), None);
}

#[test]
fn summaries_keep_registration_order() {
    let gateway = table(vec![
        Route::new("/users", "http://users:8080").docs("User directory"),
        Route::new("/orders", "http://orders:8080"),
    ]);

    let summaries = gateway.table().summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].prefix, "/users");
    assert_eq!(summaries[0].docs.as_deref(), Some("User directory"));
    assert_eq!(summaries[1].prefix, "/orders");
    assert!(summaries[1].docs.is_none());
}

#[test]
fn custom_rewrite_controls_outbound_path() {
    // The rewrite rule only shapes the outbound path; matching is untouched.
    let route = Route::new("/svc", "http://svc:8080")
        .rewrite(Arc::new(|_req: &portico::GatewayRequest| "/fixed".to_string()));

    let gateway = table(vec![route]);
    assert_eq!(
        matched_prefix(&gateway, &Method::GET, "/svc/anything"),
        Some("/svc")
    );
}

#[test]
fn duplicate_prefixes_rejected_at_build() {
    let result = Gateway::builder()
        .route(Route::new("/api", "http://a:8080"))
        .route(Route::new("/api/", "http://b:8080"))
        .build();

    assert!(result.is_err());
}

#[test]
fn table_builds_directly_without_gateway() {
    use portico::proxy::dispatcher::HttpDispatcher;
    use portico::proxy::headers::HeaderPolicy;
    use portico::routes::RouteDefaults;
    use portico::server;
    use std::time::Duration;

    let dispatcher: Arc<dyn portico::ProxyDispatcher> = Arc::new(HttpDispatcher::new(
        server::build_http_client(),
        HeaderPolicy::default(),
    ));
    let defaults = RouteDefaults {
        path_pattern: "/*".to_string(),
        timeout: Duration::from_secs(30),
    };

    let table =
        RouteTable::build(vec![Route::new("/a", "http://a:8080")], &defaults, &dispatcher)
            .unwrap();
    assert_eq!(table.len(), 1);
    assert!(!table.is_empty());
}
