//! Portico is a lightweight reverse-proxy API gateway.
//!
//! It receives incoming HTTP requests, matches them against an ordered route
//! table (first registered prefix wins), runs them through middleware and
//! hook pipelines, rewrites the path, and forwards them to the upstream
//! service that owns the matched prefix. The upstream response flows back
//! through the response hooks before returning to the caller.
//!
//! Routes can come from a YAML/JSON config file (the `portico` binary) or be
//! declared in code through [`Gateway::builder`](gateway::Gateway::builder),
//! which is where hooks, middlewares, and custom dispatchers are attached.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, routes).
//! - [`config`] -- Config file loading and validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`gateway`] -- The [`Gateway`](gateway::Gateway) type and its builder.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`hooks`] -- Request/response hook traits and pipeline runners.
//! - [`introspect`] -- `GET /services.json` route listing endpoint.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- Middleware trait and chain runner with short-circuiting.
//! - [`proxy`] -- Request pipeline, header construction, and upstream dispatch.
//! - [`request`] -- The in-flight request representation passed through the pipeline.
//! - [`rewrite`] -- Path rewriting rules applied before dispatch.
//! - [`routes`] -- Route declarations, compilation, and ordered matching.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.

#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod hooks;
pub mod introspect;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod request;
pub mod rewrite;
pub mod routes;
pub mod server;

pub use error::{BoxError, PorticoError, RequestError};
pub use gateway::{Gateway, GatewayBuilder};
pub use hooks::{HookOutcome, RequestHook, ResponseHook};
pub use middleware::{Flow, Middleware};
pub use proxy::dispatcher::{DispatchError, ProxyDispatcher, UpstreamResponse};
pub use request::GatewayRequest;
pub use rewrite::{PathRewrite, RewriteRule};
pub use routes::Route;
