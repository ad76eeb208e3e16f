//! Upstream dispatch: the [`ProxyDispatcher`] seam and its HTTP
//! implementation.
//!
//! [`HttpDispatcher`] sends the request through the shared pooled hyper
//! client under a per-request deadline and collects the full response body
//! before returning. Routes can swap in their own [`ProxyDispatcher`] to
//! reach upstreams over anything else; the pipeline never knows the
//! difference.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::HeaderMap;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::StatusCode;
use url::Url;

use crate::hooks::RouteHooks;
use crate::request::GatewayRequest;
use crate::server::HttpClient;

use super::headers::{build_forwarded_headers, HeaderPolicy};

/// Everything a dispatcher gets besides the request itself.
pub struct DispatchOptions {
    /// Effective deadline: the request override when present, the route
    /// timeout otherwise.
    pub timeout: Duration,
    /// Decoded query parameters, handed through for dispatchers that want
    /// them structured. The default dispatcher forwards the raw query string
    /// byte-for-byte instead.
    pub query_string: HashMap<String, String>,
    /// The matched route's hooks, for dispatchers that layer their own
    /// processing.
    pub hooks: RouteHooks,
}

/// A fully collected upstream response.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("upstream call timed out after {}ms", timeout.as_millis())]
    Timeout { timeout: Duration },

    #[error("upstream unreachable: {source}")]
    Unreachable {
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("upstream transport error: {source}")]
    Transport {
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("invalid outbound URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: hyper::http::uri::InvalidUri,
    },

    #[error("failed to build outbound request: {source}")]
    Request {
        #[source]
        source: hyper::http::Error,
    },

    #[error("failed to read upstream body: {source}")]
    Body {
        #[source]
        source: hyper::Error,
    },
}

impl DispatchError {
    /// Gateway status for this failure: 504 when the deadline elapsed, 502
    /// for everything else on the upstream leg.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Unreachable { .. }
            | Self::Transport { .. }
            | Self::InvalidUri { .. }
            | Self::Request { .. }
            | Self::Body { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

// async_trait is required because dispatchers are stored as
// Arc<dyn ProxyDispatcher> per route.
#[async_trait]
pub trait ProxyDispatcher: Send + Sync {
    /// Send `req` to `target` using `outbound_path` (already rewritten) and
    /// return the collected response.
    async fn dispatch(
        &self,
        req: &GatewayRequest,
        outbound_path: &str,
        target: &Url,
        opts: &DispatchOptions,
    ) -> Result<UpstreamResponse, DispatchError>;
}

/// The default dispatcher: pooled hyper client, one attempt, hard deadline.
pub struct HttpDispatcher {
    client: HttpClient,
    policy: HeaderPolicy,
}

impl HttpDispatcher {
    #[must_use]
    pub fn new(client: HttpClient, policy: HeaderPolicy) -> Self {
        Self { client, policy }
    }
}

#[async_trait]
impl ProxyDispatcher for HttpDispatcher {
    #[allow(clippy::cast_possible_truncation)]
    async fn dispatch(
        &self,
        req: &GatewayRequest,
        outbound_path: &str,
        target: &Url,
        opts: &DispatchOptions,
    ) -> Result<UpstreamResponse, DispatchError> {
        let outbound_url = build_outbound_url(target, outbound_path, req.ctx.raw_query.as_deref());
        let uri: hyper::Uri = outbound_url
            .parse()
            .map_err(|source| DispatchError::InvalidUri {
                uri: outbound_url.clone(),
                source,
            })?;

        let forwarded_headers = build_forwarded_headers(
            &req.headers,
            req.ctx.client_ip,
            target,
            &self.policy,
            &req.ctx.correlation_id,
        );

        let mut builder = hyper::Request::builder().method(req.method.clone()).uri(uri);
        for (key, value) in &forwarded_headers {
            builder = builder.header(key, value);
        }
        let outbound = builder
            .body(Full::new(req.body.clone()))
            .map_err(|source| DispatchError::Request { source })?;

        let start = Instant::now();
        let round_trip = async {
            let response = self.client.request(outbound).await.map_err(|source| {
                if source.is_connect() {
                    DispatchError::Unreachable { source }
                } else {
                    DispatchError::Transport { source }
                }
            })?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|source| DispatchError::Body { source })?
                .to_bytes();

            Ok(UpstreamResponse {
                status,
                headers,
                body,
            })
        };

        // The deadline covers the whole round trip, body included. Elapsing
        // drops the client future, abandoning the connection.
        let result = tokio::time::timeout(opts.timeout, round_trip)
            .await
            .unwrap_or(Err(DispatchError::Timeout {
                timeout: opts.timeout,
            }));

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(upstream) => {
                tracing::info!(
                    correlation_id = %req.ctx.correlation_id,
                    target = %outbound_url,
                    status = upstream.status.as_u16(),
                    latency_ms,
                    "upstream responded"
                );
            }
            Err(e) => {
                tracing::warn!(
                    correlation_id = %req.ctx.correlation_id,
                    target = %outbound_url,
                    error = %e,
                    latency_ms,
                    "upstream call failed"
                );
            }
        }

        result
    }
}

/// Join target base, outbound path, and the raw inbound query string.
fn build_outbound_url(target: &Url, path: &str, raw_query: Option<&str>) -> String {
    let base = target.as_str().trim_end_matches('/');
    match raw_query {
        Some(query) => format!("{base}{path}?{query}"),
        None => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn joins_base_and_path() {
        assert_eq!(
            build_outbound_url(&url("http://upstream:8080"), "/items", None),
            "http://upstream:8080/items"
        );
    }

    #[test]
    fn target_path_is_preserved() {
        assert_eq!(
            build_outbound_url(&url("http://upstream:8080/api"), "/items", None),
            "http://upstream:8080/api/items"
        );
    }

    #[test]
    fn trailing_slash_never_doubles() {
        assert_eq!(
            build_outbound_url(&url("http://upstream:8080/api/"), "/items", None),
            "http://upstream:8080/api/items"
        );
    }

    #[test]
    fn raw_query_carried_verbatim() {
        assert_eq!(
            build_outbound_url(&url("http://upstream:8080"), "/items", Some("a=1&b=x%20y")),
            "http://upstream:8080/items?a=1&b=x%20y"
        );
    }

    #[test]
    fn timeout_maps_to_504_everything_else_502() {
        let timeout = DispatchError::Timeout {
            timeout: Duration::from_millis(50),
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(timeout.to_string().contains("50ms"));
    }
}
