//! The middleware trait and ordered chain execution.
//!
//! Middleware wraps the whole proxy flow: the global chain runs before route
//! matching on every request (introspection included), per-route chains run
//! after a match. Each middleware returns a [`Flow`]: continue down the
//! chain, or respond immediately and skip everything behind it, including
//! the upstream dispatch. Cross-cutting concerns like client IP extraction,
//! rate limiting, or response caching plug in here without the core knowing
//! about them.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use crate::error::BoxError;
use crate::request::GatewayRequest;

/// Verdict of a single middleware.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next middleware, or onward to the route
    /// pipeline if the chain is exhausted.
    Continue,
    /// Stop here and send this response to the client.
    Respond(Response),
}

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, req: &mut GatewayRequest) -> Result<Flow, BoxError>;
}

/// Run a middleware chain in order, stopping at the first `Respond` or error.
pub async fn run_chain(
    chain: &[Arc<dyn Middleware>],
    req: &mut GatewayRequest,
) -> Result<Flow, BoxError> {
    for middleware in chain {
        match middleware.handle(req).await? {
            Flow::Continue => {}
            stop @ Flow::Respond(_) => return Ok(stop),
        }
    }
    Ok(Flow::Continue)
}
