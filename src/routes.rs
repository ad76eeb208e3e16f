//! Route declarations, the compiled route table, and request matching.
//!
//! A [`Route`] is the user-facing declaration: prefix, upstream target, and
//! optional overrides plus attached hooks, middleware, and rewriters. The
//! gateway compiles the declared list once into a [`RouteTable`] of
//! [`CompiledRoute`]s with every default resolved and every string parsed
//! into its typed form. The table is immutable afterwards, so lookups touch
//! no locks.
//!
//! Matching walks routes in registration order and the first route whose
//! method set and path accept the request wins, regardless of how specific a
//! later route would have been. Prefix matching is segment-safe: `/service`
//! accepts `/service/x` but never `/servicex`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PorticoError, ValidationError};
use crate::hooks::{RequestHook, ResponseHook, RouteHooks};
use crate::middleware::Middleware;
use crate::proxy::dispatcher::ProxyDispatcher;
use crate::rewrite::{PathRewrite, RewriteRule};

/// Verbs a route listens on when it does not name its own set.
pub const DEFAULT_METHODS: [Method; 8] = [
    Method::GET,
    Method::DELETE,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
];

/// Parse a configured verb, case-insensitively, against the supported set.
pub fn parse_method(raw: &str) -> Result<Method, String> {
    let upper = raw.to_ascii_uppercase();
    DEFAULT_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or_else(|| format!("'{raw}' is not a supported HTTP method"))
}

/// Upstream dispatch flavor. Only plain HTTP proxying exists today; the enum
/// keeps the config field honest and leaves room for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProxyType {
    Http,
}

impl ProxyType {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "http" => Ok(Self::Http),
            other => Err(format!(
                "unsupported proxy type '{other}', expected one of: http"
            )),
        }
    }
}

/// What a route accepts *after* its prefix has been stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// `/*` (or `*`): any remainder, including none.
    Any,
    /// A literal remainder, matched exactly.
    Exact(String),
    /// A literal head ending in `/*`: the head itself or anything below it.
    Wildcard(String),
}

impl PathPattern {
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        match pattern {
            "*" | "/*" => Self::Any,
            p if p.ends_with("/*") => Self::Wildcard(p[..p.len() - 2].to_string()),
            p => Self::Exact(p.to_string()),
        }
    }

    /// `remainder` is the request path with the route prefix already removed.
    #[must_use]
    pub fn matches(&self, remainder: &str) -> bool {
        match self {
            Self::Any => remainder.is_empty() || remainder.starts_with('/'),
            Self::Exact(want) => remainder == want,
            Self::Wildcard(head) => {
                remainder == head
                    || (remainder.starts_with(head.as_str())
                        && remainder[head.len()..].starts_with('/'))
            }
        }
    }
}

/// What `/services.json` exposes per route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub prefix: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// One route declaration, before compilation.
///
/// Built fluently; everything beyond prefix and target is optional and falls
/// back to the gateway defaults at compile time.
pub struct Route {
    prefix: String,
    target: String,
    docs: Option<String>,
    path_pattern: Option<String>,
    methods: Option<Vec<String>>,
    timeout: Option<Duration>,
    proxy_type: String,
    prefix_rewrite: String,
    rewrite: Option<Arc<dyn PathRewrite>>,
    on_request: Vec<Arc<dyn RequestHook>>,
    on_response: Vec<Arc<dyn ResponseHook>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    dispatcher: Option<Arc<dyn ProxyDispatcher>>,
}

impl Route {
    #[must_use]
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
            docs: None,
            path_pattern: None,
            methods: None,
            timeout: None,
            proxy_type: "http".to_string(),
            prefix_rewrite: String::new(),
            rewrite: None,
            on_request: Vec::new(),
            on_response: Vec::new(),
            middlewares: Vec::new(),
            dispatcher: None,
        }
    }

    #[must_use]
    pub fn docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    #[must_use]
    pub fn path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.path_pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn proxy_type(mut self, proxy_type: impl Into<String>) -> Self {
        self.proxy_type = proxy_type.into();
        self
    }

    /// Replacement glued onto the path once the prefix is stripped. Empty by
    /// default, which plain-strips the prefix.
    #[must_use]
    pub fn prefix_rewrite(mut self, replacement: impl Into<String>) -> Self {
        self.prefix_rewrite = replacement.into();
        self
    }

    /// Take over path rewriting entirely; `prefix_rewrite` is ignored.
    #[must_use]
    pub fn rewrite(mut self, rule: Arc<dyn PathRewrite>) -> Self {
        self.rewrite = Some(rule);
        self
    }

    #[must_use]
    pub fn on_request(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.on_request.push(hook);
        self
    }

    #[must_use]
    pub fn on_response(mut self, hook: Arc<dyn ResponseHook>) -> Self {
        self.on_response.push(hook);
        self
    }

    #[must_use]
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Dispatch through a custom transport instead of the gateway's pooled
    /// HTTP client.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Arc<dyn ProxyDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    #[must_use]
    pub fn prefix_str(&self) -> &str {
        &self.prefix
    }
}

impl From<&crate::config::model::RouteConfig> for Route {
    fn from(cfg: &crate::config::model::RouteConfig) -> Self {
        let mut route = Route::new(&cfg.prefix, &cfg.target)
            .proxy_type(&cfg.proxy_type)
            .prefix_rewrite(&cfg.prefix_rewrite);
        route.docs = cfg.docs.clone();
        route.path_pattern = cfg.path_pattern.clone();
        route.methods = cfg.methods.clone();
        route.timeout = cfg.timeout.map(Duration::from_millis);
        route
    }
}

/// Gateway-level fallbacks applied to routes that leave a field unset.
#[derive(Debug, Clone)]
pub struct RouteDefaults {
    pub path_pattern: String,
    pub timeout: Duration,
}

/// A fully resolved route: strings parsed, defaults applied, extensions
/// attached.
pub struct CompiledRoute {
    /// Prefix as declared, shown in summaries.
    pub prefix: String,
    /// Prefix with any trailing slash trimmed, used for matching and the
    /// default rewrite. `/` normalizes to the empty string so a root route
    /// matches everything.
    match_prefix: String,
    pub pattern: PathPattern,
    pub target: Url,
    pub methods: Vec<Method>,
    pub timeout: Duration,
    pub proxy_type: ProxyType,
    pub rewrite: RewriteRule,
    pub hooks: RouteHooks,
    pub middlewares: Vec<Arc<dyn Middleware>>,
    pub dispatcher: Arc<dyn ProxyDispatcher>,
    pub summary: RouteSummary,
}

impl CompiledRoute {
    #[must_use]
    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    fn matches_path(&self, path: &str) -> bool {
        path.strip_prefix(self.match_prefix.as_str())
            .is_some_and(|remainder| self.pattern.matches(remainder))
    }
}

/// The immutable, ordered route set the gateway serves from.
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    summaries: Vec<RouteSummary>,
}

impl RouteTable {
    /// Compile declarations into a table. All validation failures across all
    /// routes are collected and reported together.
    pub fn build(
        declarations: Vec<Route>,
        defaults: &RouteDefaults,
        fallback_dispatcher: &Arc<dyn ProxyDispatcher>,
    ) -> Result<Self, PorticoError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(declarations.len());

        for declaration in declarations {
            let match_prefix = normalize_prefix(&declaration.prefix);
            if !seen.insert(match_prefix.clone()) {
                errors.push(ValidationError {
                    route: declaration.prefix.clone(),
                    field: "prefix".into(),
                    message: "duplicate route prefix".into(),
                    suggestion: None,
                });
                continue;
            }
            if let Some(route) = compile_route(declaration, defaults, fallback_dispatcher, &mut errors)
            {
                routes.push(route);
            }
        }

        if !errors.is_empty() {
            return Err(PorticoError::ConfigValidation { errors });
        }

        let summaries = routes.iter().map(|r| r.summary.clone()).collect();
        Ok(Self { routes, summaries })
    }

    /// First route, in registration order, that accepts the method and path.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<&CompiledRoute> {
        self.routes
            .iter()
            .find(|route| route.allows_method(method) && route.matches_path(path))
    }

    #[must_use]
    pub fn summaries(&self) -> &[RouteSummary] {
        &self.summaries
    }

    #[must_use]
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    if prefix == "/" {
        String::new()
    } else {
        prefix.trim_end_matches('/').to_string()
    }
}

fn compile_route(
    declaration: Route,
    defaults: &RouteDefaults,
    fallback_dispatcher: &Arc<dyn ProxyDispatcher>,
    errors: &mut Vec<ValidationError>,
) -> Option<CompiledRoute> {
    let route_id = if declaration.prefix.is_empty() {
        "(unnamed)".to_string()
    } else {
        declaration.prefix.clone()
    };
    let before = errors.len();

    if declaration.prefix.is_empty() {
        errors.push(ValidationError {
            route: route_id.clone(),
            field: "prefix".into(),
            message: "prefix cannot be empty".into(),
            suggestion: None,
        });
    } else if !declaration.prefix.starts_with('/') {
        errors.push(ValidationError {
            route: route_id.clone(),
            field: "prefix".into(),
            message: "prefix must start with '/'".into(),
            suggestion: Some(format!("did you mean '/{}'?", declaration.prefix)),
        });
    }

    let methods = match &declaration.methods {
        None => DEFAULT_METHODS.to_vec(),
        Some(list) if list.is_empty() => {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "methods".into(),
                message: "methods cannot be empty".into(),
                suggestion: Some("omit the field to accept all methods".into()),
            });
            Vec::new()
        }
        Some(list) => {
            let mut parsed = Vec::with_capacity(list.len());
            for raw in list {
                match parse_method(raw) {
                    Ok(method) => parsed.push(method),
                    Err(message) => errors.push(ValidationError {
                        route: route_id.clone(),
                        field: "methods".into(),
                        message,
                        suggestion: None,
                    }),
                }
            }
            parsed
        }
    };

    let target = match Url::parse(&declaration.target) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        Ok(url) => {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "target".into(),
                message: format!(
                    "unsupported scheme '{}' (expected http or https)",
                    url.scheme()
                ),
                suggestion: None,
            });
            None
        }
        Err(_) => {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "target".into(),
                message: format!("'{}' is not a valid URL", declaration.target),
                suggestion: None,
            });
            None
        }
    };

    let proxy_type = match ProxyType::parse(&declaration.proxy_type) {
        Ok(pt) => Some(pt),
        Err(message) => {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "proxy_type".into(),
                message,
                suggestion: None,
            });
            None
        }
    };

    if declaration.timeout == Some(Duration::ZERO) {
        errors.push(ValidationError {
            route: route_id.clone(),
            field: "timeout".into(),
            message: "timeout must be greater than 0".into(),
            suggestion: None,
        });
    }

    if errors.len() > before {
        return None;
    }

    let match_prefix = normalize_prefix(&declaration.prefix);
    let pattern = PathPattern::parse(
        declaration
            .path_pattern
            .as_deref()
            .unwrap_or(&defaults.path_pattern),
    );
    let rewrite = declaration.rewrite.map_or_else(
        || RewriteRule::StripPrefix {
            prefix: match_prefix.clone(),
            replacement: declaration.prefix_rewrite.clone(),
        },
        RewriteRule::Custom,
    );
    let summary = RouteSummary {
        prefix: declaration.prefix.clone(),
        docs: declaration.docs.clone(),
    };

    Some(CompiledRoute {
        prefix: declaration.prefix,
        match_prefix,
        pattern,
        target: target?,
        methods,
        timeout: declaration.timeout.unwrap_or(defaults.timeout),
        proxy_type: proxy_type?,
        rewrite,
        hooks: RouteHooks {
            on_request: declaration.on_request,
            on_response: declaration.on_response,
        },
        middlewares: declaration.middlewares,
        dispatcher: declaration
            .dispatcher
            .unwrap_or_else(|| Arc::clone(fallback_dispatcher)),
        summary,
    })
}
