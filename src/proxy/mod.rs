//! Core request pipeline: the Axum fallback handler.
//!
//! [`gateway_handler`] receives every request that is not `/health` or
//! `/services.json` and walks it through the fixed stage order: global
//! middleware, route match, route middleware, path rewrite, onRequest hooks,
//! upstream dispatch, onResponse hooks. Any stage can end the request early;
//! whatever response leaves this module is exactly what the client sees.
//! Submodules provide header construction ([`headers`]) and the upstream
//! dispatch seam ([`dispatcher`]).

pub mod dispatcher;
pub mod headers;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::error::RequestError;
use crate::hooks::{self, HookOutcome};
use crate::middleware::{self, Flow};
use crate::request::GatewayRequest;
use crate::server::AppState;
use dispatcher::{DispatchOptions, UpstreamResponse};

pub async fn gateway_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut req = GatewayRequest::new(method, uri, req_headers, body, addr.ip());
    let correlation_id = req.ctx.correlation_id.clone();

    let mut response = match run_pipeline(&state, &mut req).await {
        Ok(response) => response,
        Err(err) => {
            if err.status().is_server_error() {
                state.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
            err.into_response()
        }
    };

    // Correlation id goes on every response, errors included.
    if let Ok(value) = correlation_id.parse() {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

/// Drive one request through every stage. Returns the response to relay, or
/// the error whose status the client gets.
async fn run_pipeline(
    state: &AppState,
    req: &mut GatewayRequest,
) -> Result<Response, RequestError> {
    let gateway = &state.gateway;

    if let Flow::Respond(response) = middleware::run_chain(gateway.middlewares(), req)
        .await
        .map_err(|source| RequestError::Middleware { source })?
    {
        return Ok(response);
    }

    let Some(route) = gateway.table().find(&req.method, &req.ctx.original_path) else {
        return Err(RequestError::NoRoute {
            method: req.method.clone(),
            path: req.ctx.original_path.clone(),
        });
    };
    req.ctx.route = Some(route.summary.clone());

    tracing::info!(
        correlation_id = %req.ctx.correlation_id,
        method = %req.method,
        path = %req.ctx.original_path,
        prefix = %route.prefix,
        target = %route.target,
        "route matched"
    );

    if let Flow::Respond(response) = middleware::run_chain(&route.middlewares, req)
        .await
        .map_err(|source| RequestError::Middleware { source })?
    {
        return Ok(response);
    }

    // Rewrite exactly once, before any hook, so hooks see the final path.
    let outbound_path = route.rewrite.apply(req);
    req.ctx.rewritten_path = Some(outbound_path.clone());

    match hooks::run_on_request(&route.hooks.on_request, req)
        .await
        .map_err(|source| RequestError::Hook { source })?
    {
        HookOutcome::Continue => {}
        HookOutcome::Abort(response) => {
            state.stats.aborted.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                correlation_id = %req.ctx.correlation_id,
                prefix = %route.prefix,
                "request aborted by onRequest hook"
            );
            return Ok(response);
        }
    }

    let opts = DispatchOptions {
        timeout: req.ctx.timeout_override.unwrap_or(route.timeout),
        query_string: req.ctx.query.clone(),
        hooks: route.hooks.clone(),
    };

    let mut upstream = route
        .dispatcher
        .dispatch(req, &outbound_path, &route.target, &opts)
        .await?;

    // Response hooks run only when an upstream response exists; their
    // failures are logged inside and never surface here.
    hooks::run_on_response(&route.hooks.on_response, req, &mut upstream).await;

    state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
    Ok(relay_response(upstream))
}

/// Turn a collected upstream response into the client-facing response.
fn relay_response(mut upstream: UpstreamResponse) -> Response {
    headers::strip_response_hop_by_hop(&mut upstream.headers);
    let mut builder = Response::builder().status(upstream.status);
    for (key, value) in &upstream.headers {
        builder = builder.header(key, value);
    }
    builder
        .body(axum::body::Body::from(upstream.body))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to build relay response");
            StatusCode::BAD_GATEWAY.into_response()
        })
}
