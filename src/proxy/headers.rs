//! Header construction, forwarding, and hop-by-hop stripping.
//!
//! [`build_forwarded_headers`] clones the original client headers (when
//! forwarding is enabled), strips hop-by-hop headers, rewrites `Host`, and
//! adds proxy metadata (`X-Forwarded-For`, `X-Real-IP`, `Via`,
//! `X-Correlation-Id`). Behavior is driven by a [`HeaderPolicy`] resolved
//! once at gateway build time.

use std::net::IpAddr;
use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderValue};
use hyper::header::HeaderName;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Header handling toggles shared by every route.
#[derive(Debug, Clone, Copy)]
pub struct HeaderPolicy {
    /// Copy client headers onto the upstream request.
    pub forward_headers: bool,
    /// Add `X-Forwarded-*`, `X-Real-IP`, `Via`, and the correlation id.
    pub proxy_headers: bool,
    /// Remove hop-by-hop headers before forwarding.
    pub strip_hop_by_hop: bool,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self {
            forward_headers: true,
            proxy_headers: true,
            strip_hop_by_hop: true,
        }
    }
}

/// Strip hop-by-hop headers and `content-length` from an upstream response.
///
/// The body has already been fully collected by the dispatcher, so
/// `transfer-encoding` and `content-length` from the origin are no longer
/// accurate. Axum will set the correct `content-length` based on the actual
/// body bytes.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(hyper::header::CONTENT_LENGTH);
}

pub fn build_forwarded_headers(
    original: &HeaderMap,
    client_ip: IpAddr,
    target_url: &url::Url,
    policy: &HeaderPolicy,
    correlation_id: &str,
) -> HeaderMap {
    let mut headers = if policy.forward_headers {
        original.clone()
    } else {
        HeaderMap::new()
    };

    // Strip hop-by-hop
    if policy.strip_hop_by_hop {
        for header_name in HOP_BY_HOP.iter() {
            headers.remove(header_name);
        }
    }

    // Rewrite Host
    if let Some(host) = target_url.host_str() {
        let host_value = target_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert("host", val);
        }
    }

    if policy.proxy_headers {
        let client_ip = client_ip.to_string();

        // X-Forwarded-For: append to chain
        let xff = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map_or_else(
                || client_ip.clone(),
                |existing| format!("{existing}, {client_ip}"),
            );
        if let Ok(val) = HeaderValue::from_str(&xff) {
            headers.insert("x-forwarded-for", val);
        }

        // X-Real-IP (first IP in chain)
        let real_ip = xff.split(',').next().unwrap_or(&client_ip).trim();
        if let Ok(val) = HeaderValue::from_str(real_ip) {
            headers.insert("x-real-ip", val);
        }

        // X-Forwarded-Proto
        let proto = if target_url.scheme() == "https" {
            "https"
        } else {
            "http"
        };
        if let Ok(val) = HeaderValue::from_str(proto) {
            headers.insert("x-forwarded-proto", val);
        }

        // X-Forwarded-Host (original Host the client targeted)
        if let Some(original_host) = original.get("host") {
            headers.insert("x-forwarded-host", original_host.clone());
        }

        // Via
        if let Ok(val) = HeaderValue::from_str("1.1 portico") {
            headers.insert("via", val);
        }

        // Correlation ID
        if let Ok(val) = HeaderValue::from_str(correlation_id) {
            headers.insert("x-correlation-id", val);
        }
    }

    headers
}
