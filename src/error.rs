//! Unified error types for Portico.
//!
//! Defines [`PorticoError`] (the main crate error enum), [`ValidationError`]
//! for config validation failures, and [`RequestError`] for failures inside
//! the per-request pipeline. All use `thiserror` for `Display` and `Error`
//! derives. Crate-level error messages include contextual hints to guide the
//! user toward a fix; request-level errors map onto gateway status codes.

use std::path::PathBuf;

use axum::response::{IntoResponse, Response};
use hyper::{Method, StatusCode};

use crate::proxy::dispatcher::DispatchError;

/// Boxed error carried by hook and middleware implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub route: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "  route {}: {} — {}",
            self.route, self.field, self.message
        )?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PorticoError {
    #[error("No config source found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Route table rejected:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Route listing failed with status {0}")]
    IntrospectionFailed(hyper::StatusCode),
}

/// Failure of a single in-flight request.
///
/// Every pipeline stage funnels into one of these variants, and
/// [`IntoResponse`] is the only place they turn into wire responses, so the
/// status mapping lives in exactly one spot.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("no route for {method} {path}")]
    NoRoute { method: Method, path: String },

    #[error("middleware failed: {source}")]
    Middleware {
        #[source]
        source: BoxError,
    },

    #[error("onRequest hook failed: {source}")]
    Hook {
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RequestError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoRoute { .. } => StatusCode::NOT_FOUND,
            Self::Middleware { .. } | Self::Hook { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Dispatch(err) => err.status(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::NoRoute { method, path } => {
                tracing::warn!(method = %method, path = %path, "no route matched");
            }
            other => {
                tracing::error!(error = %other, status = %status, "request failed");
            }
        }
        status.into_response()
    }
}
