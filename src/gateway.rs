//! Gateway assembly: the builder, defaults resolution, and config loading.
//!
//! A [`Gateway`] is the compiled artifact the server runs: the global
//! middleware chain plus the immutable route table. It is built exactly once,
//! either fluently through [`GatewayBuilder`] or from a parsed config file
//! via [`Gateway::from_config`]; nothing about it changes after that.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::config::model::Config;
use crate::config::validation;
use crate::error::PorticoError;
use crate::middleware::Middleware;
use crate::proxy::dispatcher::{HttpDispatcher, ProxyDispatcher};
use crate::proxy::headers::HeaderPolicy;
use crate::routes::{Route, RouteDefaults, RouteTable};
use crate::server::{self, AppState};

/// Route timeout when neither the route nor the gateway sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path pattern applied to routes that do not declare their own.
pub const DEFAULT_PATH_PATTERN: &str = "/*";

pub struct Gateway {
    middlewares: Vec<Arc<dyn Middleware>>,
    table: RouteTable,
}

// Trait-object fields keep this from deriving; summarize counts instead.
impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("middlewares", &self.middlewares.len())
            .field("routes", &self.table.len())
            .finish()
    }
}

impl Gateway {
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Validate a parsed config file and compile it into a gateway.
    pub fn from_config(config: &Config) -> Result<Self, PorticoError> {
        validation::validate(config)
            .map_err(|errors| PorticoError::ConfigValidation { errors })?;

        let defaults = &config.defaults;
        let mut builder = Self::builder()
            .timeout(Duration::from_millis(defaults.timeout))
            .path_pattern(&defaults.path_pattern)
            .header_policy(HeaderPolicy {
                forward_headers: defaults.forward_headers,
                proxy_headers: defaults.proxy_headers,
                strip_hop_by_hop: defaults.strip_hop_by_hop,
            });

        for route_cfg in &config.routes {
            builder = builder.route(Route::from(route_cfg));
        }
        builder.build()
    }

    #[must_use]
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Wrap the gateway in a ready-to-serve router with default limits, for
    /// embedding without the CLI.
    ///
    /// The handlers need the client address, so serve the result with
    /// `into_make_service_with_connect_info::<SocketAddr>()`.
    #[must_use]
    pub fn into_router(self) -> Router {
        let state = Arc::new(AppState::new(self, "builder".to_string(), None));
        server::build_router(state, server::DEFAULT_MAX_BODY)
    }
}

pub struct GatewayBuilder {
    middlewares: Vec<Arc<dyn Middleware>>,
    routes: Vec<Route>,
    path_pattern: String,
    timeout: Duration,
    header_policy: HeaderPolicy,
    dispatcher: Option<Arc<dyn ProxyDispatcher>>,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
            routes: Vec::new(),
            path_pattern: DEFAULT_PATH_PATTERN.to_string(),
            timeout: DEFAULT_TIMEOUT,
            header_policy: HeaderPolicy::default(),
            dispatcher: None,
        }
    }

    /// Append to the global middleware chain; order of calls is execution
    /// order.
    #[must_use]
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Register a route. Registration order is match precedence.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    #[must_use]
    pub fn routes<I>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = Route>,
    {
        self.routes.extend(routes);
        self
    }

    /// Default path pattern for routes that do not set one.
    #[must_use]
    pub fn path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.path_pattern = pattern.into();
        self
    }

    /// Default upstream timeout for routes that do not set one.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = policy;
        self
    }

    /// Default dispatcher for routes that do not bring their own. Without
    /// this, a pooled HTTP client is built.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Arc<dyn ProxyDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> Result<Gateway, PorticoError> {
        let Self {
            middlewares,
            routes,
            path_pattern,
            timeout,
            header_policy,
            dispatcher,
        } = self;

        let fallback_dispatcher = dispatcher.unwrap_or_else(|| {
            Arc::new(HttpDispatcher::new(
                server::build_http_client(),
                header_policy,
            ))
        });

        let defaults = RouteDefaults {
            path_pattern,
            timeout,
        };
        let table = RouteTable::build(routes, &defaults, &fallback_dispatcher)?;

        Ok(Gateway {
            middlewares,
            table,
        })
    }
}
