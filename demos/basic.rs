//! Minimal programmatic gateway: one proxied service, a naive per-IP rate
//! limiter, an API-key guard on the admin paths, and a response hook that
//! stamps the gateway name on everything it forwards.
//!
//! Start an upstream on port 3000 (anything will do), then:
//!
//! ```sh
//! cargo run --example basic
//! curl -H 'x-api-key: dev' http://127.0.0.1:8080/service/hello
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::response::IntoResponse;
use hyper::header::HeaderValue;
use hyper::StatusCode;
use tokio::sync::Mutex;

use portico::cli::LogLevel;
use portico::logging::{self, LogFormat};
use portico::proxy::dispatcher::UpstreamResponse;
use portico::{
    BoxError, Flow, Gateway, GatewayRequest, HookOutcome, Middleware, RequestHook, ResponseHook,
    Route,
};

/// Allows `max_per_minute` requests per client IP, then answers 429 until
/// the minute window rolls over.
struct RateLimit {
    max_per_minute: u32,
    hits: Mutex<HashMap<IpAddr, (Instant, u32)>>,
}

impl RateLimit {
    fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Middleware for RateLimit {
    async fn handle(&self, req: &mut GatewayRequest) -> Result<Flow, BoxError> {
        let mut hits = self.hits.lock().await;
        let entry = hits
            .entry(req.ctx.client_ip)
            .or_insert_with(|| (Instant::now(), 0));

        if entry.0.elapsed() > Duration::from_secs(60) {
            *entry = (Instant::now(), 0);
        }
        entry.1 += 1;

        if entry.1 > self.max_per_minute {
            let response =
                (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
            return Ok(Flow::Respond(response));
        }
        Ok(Flow::Continue)
    }
}

/// Rejects admin paths that arrive without an `x-api-key` header.
struct ApiKeyGuard;

#[async_trait]
impl RequestHook for ApiKeyGuard {
    async fn on_request(&self, req: &mut GatewayRequest) -> Result<HookOutcome, BoxError> {
        let is_admin = req.ctx.original_path.starts_with("/service/admin");
        if is_admin && !req.headers.contains_key("x-api-key") {
            let response = (StatusCode::UNAUTHORIZED, "missing x-api-key").into_response();
            return Ok(HookOutcome::Abort(response));
        }
        Ok(HookOutcome::Continue)
    }
}

/// Tags every forwarded response so callers can tell it came through the
/// gateway.
struct ServedBy;

#[async_trait]
impl ResponseHook for ServedBy {
    async fn on_response(
        &self,
        _req: &GatewayRequest,
        upstream: &mut UpstreamResponse,
    ) -> Result<(), BoxError> {
        upstream
            .headers
            .insert("x-served-by", HeaderValue::from_static("portico"));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    logging::init(&LogLevel::Info, LogFormat::Pretty);

    let gateway = Gateway::builder()
        .middleware(Arc::new(RateLimit::new(60)))
        .route(
            Route::new("/service", "http://127.0.0.1:3000")
                .docs("just a test example")
                .timeout(Duration::from_secs(5))
                .on_request(Arc::new(ApiKeyGuard))
                .on_response(Arc::new(ServedBy)),
        )
        .build()?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!("gateway listening on http://127.0.0.1:8080");

    axum::serve(
        listener,
        gateway
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
