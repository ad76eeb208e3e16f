//! `GET /services.json` — the route listing endpoint.
//!
//! Returns one entry per registered route, in registration order, exposing
//! only the prefix and optional docs string. The global middleware chain
//! runs first, so anything guarding the proxied routes also guards the
//! listing; `/health` stays outside of it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::RequestError;
use crate::middleware::{self, Flow};
use crate::request::GatewayRequest;
use crate::server::AppState;

pub async fn services_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut req = GatewayRequest::new(method, uri, headers, body, addr.ip());

    match middleware::run_chain(state.gateway.middlewares(), &mut req).await {
        Ok(Flow::Continue) => {
            Json(state.gateway.table().summaries().to_vec()).into_response()
        }
        Ok(Flow::Respond(response)) => response,
        Err(source) => RequestError::Middleware { source }.into_response(),
    }
}
