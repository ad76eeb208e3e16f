//! Outbound path rewriting.
//!
//! Each route rewrites the inbound path exactly once, after route middleware
//! and before any onRequest hook runs, so hooks always observe the final
//! outbound path. The default rule strips the matched route prefix and glues
//! on a replacement (empty by default); a route can swap in its own
//! [`PathRewrite`] implementation to take full control.

use std::sync::Arc;

use crate::request::GatewayRequest;

/// Custom path computation for a route.
///
/// Gets the full request, so the outbound path can depend on headers, query
/// parameters, or anything else already in the context. Must return a path
/// beginning with `/`.
pub trait PathRewrite: Send + Sync {
    fn rewrite(&self, req: &GatewayRequest) -> String;
}

impl<F> PathRewrite for F
where
    F: Fn(&GatewayRequest) -> String + Send + Sync,
{
    fn rewrite(&self, req: &GatewayRequest) -> String {
        self(req)
    }
}

/// How a route derives its outbound path.
#[derive(Clone)]
pub enum RewriteRule {
    /// Drop the matched prefix from the front of the path and prepend
    /// `replacement`. An all-empty result collapses to `/`.
    StripPrefix {
        prefix: String,
        replacement: String,
    },
    Custom(Arc<dyn PathRewrite>),
}

impl RewriteRule {
    #[must_use]
    pub fn apply(&self, req: &GatewayRequest) -> String {
        match self {
            Self::StripPrefix {
                prefix,
                replacement,
            } => strip_prefix(&req.ctx.original_path, prefix, replacement),
            Self::Custom(rule) => rule.rewrite(req),
        }
    }
}

fn strip_prefix(path: &str, prefix: &str, replacement: &str) -> String {
    // The route matched, so the prefix is present; the fallback covers
    // direct calls outside the pipeline.
    let remainder = path.strip_prefix(prefix).unwrap_or(path);
    let rewritten = format!("{replacement}{remainder}");
    if rewritten.is_empty() {
        "/".to_string()
    } else {
        rewritten
    }
}
