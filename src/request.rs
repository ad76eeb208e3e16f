//! The mutable request envelope threaded through the pipeline.
//!
//! Every stage (global middleware, route middleware, rewrite, onRequest
//! hooks, dispatch) sees the same [`GatewayRequest`]. Hooks and middleware
//! mutate it in place; the dispatcher reads the final state directly, so
//! anything a hook changed is what the upstream sees.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use axum::http::{HeaderMap, Method, Uri};
use bytes::Bytes;
use uuid::Uuid;

use crate::routes::RouteSummary;

const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// One inbound request, decomposed into freely mutable parts.
pub struct GatewayRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub ctx: RequestContext,
}

/// Per-request gateway context, separate from the HTTP parts so pipeline
/// stages can pass information forward without inventing headers.
pub struct RequestContext {
    /// Inbound path before any rewriting.
    pub original_path: String,
    /// Summary of the matched route, populated after matching.
    pub route: Option<RouteSummary>,
    /// Outbound path, populated once the rewrite stage has run.
    pub rewritten_path: Option<String>,
    /// Peer address, or whatever a trusted middleware replaced it with.
    pub client_ip: IpAddr,
    /// Per-request deadline override; wins over the route timeout.
    pub timeout_override: Option<Duration>,
    /// Decoded query parameters. Later duplicates of a key win.
    pub query: HashMap<String, String>,
    /// Raw query string exactly as received.
    pub raw_query: Option<String>,
    /// Taken from the inbound `x-correlation-id` header, else a fresh v4.
    pub correlation_id: String,
}

impl GatewayRequest {
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        client_ip: IpAddr,
    ) -> Self {
        let original_path = uri.path().to_string();
        let raw_query = uri.query().map(str::to_string);
        let query = raw_query.as_deref().map(parse_query).unwrap_or_default();
        let correlation_id = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

        Self {
            method,
            uri,
            headers,
            body,
            ctx: RequestContext {
                original_path,
                route: None,
                rewritten_path: None,
                client_ip,
                timeout_override: None,
                query,
                raw_query,
                correlation_id,
            },
        }
    }

    /// Path the dispatcher should send upstream: the rewritten one when the
    /// rewrite stage has run, the original otherwise.
    #[must_use]
    pub fn outbound_path(&self) -> &str {
        self.ctx
            .rewritten_path
            .as_deref()
            .unwrap_or(&self.ctx.original_path)
    }
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn request(uri: &'static str) -> GatewayRequest {
        GatewayRequest::new(
            Method::GET,
            Uri::from_static(uri),
            HeaderMap::new(),
            Bytes::new(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        )
    }

    #[test]
    fn splits_path_and_query() {
        let req = request("/service/items?page=2&tag=a%20b");
        assert_eq!(req.ctx.original_path, "/service/items");
        assert_eq!(req.ctx.raw_query.as_deref(), Some("page=2&tag=a%20b"));
        assert_eq!(req.ctx.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(req.ctx.query.get("tag").map(String::as_str), Some("a b"));
    }

    #[test]
    fn no_query_yields_empty_map() {
        let req = request("/service");
        assert!(req.ctx.raw_query.is_none());
        assert!(req.ctx.query.is_empty());
    }

    #[test]
    fn outbound_path_prefers_rewrite() {
        let mut req = request("/service/items");
        assert_eq!(req.outbound_path(), "/service/items");
        req.ctx.rewritten_path = Some("/items".to_string());
        assert_eq!(req.outbound_path(), "/items");
    }

    #[test]
    fn correlation_id_prefers_inbound_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", "abc-123".parse().unwrap());
        let req = GatewayRequest::new(
            Method::GET,
            Uri::from_static("/"),
            headers,
            Bytes::new(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        assert_eq!(req.ctx.correlation_id, "abc-123");
    }

    #[test]
    fn correlation_id_generated_when_absent() {
        let req = request("/");
        assert!(!req.ctx.correlation_id.is_empty());
    }
}
