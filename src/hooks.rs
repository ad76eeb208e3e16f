//! Request and response hook traits and the sequential hook pipeline.
//!
//! Hooks are per-route extension points that run inside the proxy flow:
//! [`RequestHook`]s after the rewrite stage and before dispatch,
//! [`ResponseHook`]s after the upstream response arrives and before it is
//! relayed. Hooks run strictly in registration order. A request hook answers
//! with a [`HookOutcome`]: [`Continue`](HookOutcome::Continue) passes control
//! to the next hook, [`Abort`](HookOutcome::Abort) carries the response to
//! send instead of proxying, and later hooks never run.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use crate::error::BoxError;
use crate::proxy::dispatcher::UpstreamResponse;
use crate::request::GatewayRequest;

/// Verdict of a single request hook.
#[derive(Debug)]
pub enum HookOutcome {
    /// Proceed to the next hook, or to dispatch if this was the last one.
    Continue,
    /// Stop the pipeline and send this response to the client.
    Abort(Response),
}

impl HookOutcome {
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }
}

// async_trait is required because hooks are stored as Arc<dyn RequestHook>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait RequestHook: Send + Sync {
    async fn on_request(&self, req: &mut GatewayRequest) -> Result<HookOutcome, BoxError>;
}

#[async_trait]
pub trait ResponseHook: Send + Sync {
    async fn on_response(
        &self,
        req: &GatewayRequest,
        upstream: &mut UpstreamResponse,
    ) -> Result<(), BoxError>;
}

/// The hook sets attached to one route, in registration order.
#[derive(Clone, Default)]
pub struct RouteHooks {
    pub on_request: Vec<Arc<dyn RequestHook>>,
    pub on_response: Vec<Arc<dyn ResponseHook>>,
}

impl RouteHooks {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_request.is_empty() && self.on_response.is_empty()
    }
}

/// Run request hooks in order. Stops at the first abort or error; hooks
/// after that point are never invoked.
pub async fn run_on_request(
    hooks: &[Arc<dyn RequestHook>],
    req: &mut GatewayRequest,
) -> Result<HookOutcome, BoxError> {
    for hook in hooks {
        match hook.on_request(req).await? {
            HookOutcome::Continue => {}
            abort @ HookOutcome::Abort(_) => return Ok(abort),
        }
    }
    Ok(HookOutcome::Continue)
}

/// Run response hooks in order. A failing hook is logged and skipped; the
/// response continues to the client unaffected and later hooks still run.
pub async fn run_on_response(
    hooks: &[Arc<dyn ResponseHook>],
    req: &GatewayRequest,
    upstream: &mut UpstreamResponse,
) {
    for hook in hooks {
        if let Err(e) = hook.on_response(req, upstream).await {
            tracing::warn!(
                correlation_id = %req.ctx.correlation_id,
                error = %e,
                "onResponse hook failed, response unaffected"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use axum::response::IntoResponse;
    use bytes::Bytes;

    use super::*;

    fn request() -> GatewayRequest {
        GatewayRequest::new(
            Method::GET,
            Uri::from_static("/service/x"),
            HeaderMap::new(),
            Bytes::new(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        )
    }

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        outcome: fn() -> HookOutcome,
    }

    #[async_trait]
    impl RequestHook for Recorder {
        async fn on_request(&self, _req: &mut GatewayRequest) -> Result<HookOutcome, BoxError> {
            self.log.lock().unwrap().push(self.label);
            Ok((self.outcome)())
        }
    }

    struct Failing;

    #[async_trait]
    impl RequestHook for Failing {
        async fn on_request(&self, _req: &mut GatewayRequest) -> Result<HookOutcome, BoxError> {
            Err("hook blew up".into())
        }
    }

    fn upstream() -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"ok"),
        }
    }

    #[tokio::test]
    async fn hooks_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks: Vec<Arc<dyn RequestHook>> = vec![
            Arc::new(Recorder {
                label: "first",
                log: log.clone(),
                outcome: || HookOutcome::Continue,
            }),
            Arc::new(Recorder {
                label: "second",
                log: log.clone(),
                outcome: || HookOutcome::Continue,
            }),
        ];

        let outcome = run_on_request(&hooks, &mut request()).await.unwrap();
        assert!(!outcome.is_abort());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn abort_skips_remaining_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks: Vec<Arc<dyn RequestHook>> = vec![
            Arc::new(Recorder {
                label: "first",
                log: log.clone(),
                outcome: || HookOutcome::Continue,
            }),
            Arc::new(Recorder {
                label: "aborter",
                log: log.clone(),
                outcome: || HookOutcome::Abort(StatusCode::FORBIDDEN.into_response()),
            }),
            Arc::new(Recorder {
                label: "never",
                log: log.clone(),
                outcome: || HookOutcome::Continue,
            }),
        ];

        let outcome = run_on_request(&hooks, &mut request()).await.unwrap();
        match outcome {
            HookOutcome::Abort(resp) => assert_eq!(resp.status(), StatusCode::FORBIDDEN),
            HookOutcome::Continue => panic!("expected abort"),
        }
        assert_eq!(*log.lock().unwrap(), vec!["first", "aborter"]);
    }

    #[tokio::test]
    async fn error_stops_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks: Vec<Arc<dyn RequestHook>> = vec![
            Arc::new(Failing),
            Arc::new(Recorder {
                label: "never",
                log: log.clone(),
                outcome: || HookOutcome::Continue,
            }),
        ];

        let err = run_on_request(&hooks, &mut request()).await.unwrap_err();
        assert!(err.to_string().contains("hook blew up"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn hooks_observe_earlier_mutations() {
        struct Tagger;

        #[async_trait]
        impl RequestHook for Tagger {
            async fn on_request(&self, req: &mut GatewayRequest) -> Result<HookOutcome, BoxError> {
                req.headers.insert("x-tag", "set".parse().unwrap());
                Ok(HookOutcome::Continue)
            }
        }

        struct Checker;

        #[async_trait]
        impl RequestHook for Checker {
            async fn on_request(&self, req: &mut GatewayRequest) -> Result<HookOutcome, BoxError> {
                assert_eq!(req.headers.get("x-tag").unwrap(), "set");
                Ok(HookOutcome::Continue)
            }
        }

        let hooks: Vec<Arc<dyn RequestHook>> = vec![Arc::new(Tagger), Arc::new(Checker)];
        let outcome = run_on_request(&hooks, &mut request()).await.unwrap();
        assert!(!outcome.is_abort());
    }

    #[tokio::test]
    async fn response_hook_failure_is_swallowed() {
        struct Broken;

        #[async_trait]
        impl ResponseHook for Broken {
            async fn on_response(
                &self,
                _req: &GatewayRequest,
                _upstream: &mut UpstreamResponse,
            ) -> Result<(), BoxError> {
                Err("broken".into())
            }
        }

        struct Counter(Arc<AtomicUsize>);

        #[async_trait]
        impl ResponseHook for Counter {
            async fn on_response(
                &self,
                _req: &GatewayRequest,
                upstream: &mut UpstreamResponse,
            ) -> Result<(), BoxError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                upstream.headers.insert("x-touched", "yes".parse().unwrap());
                Ok(())
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let hooks: Vec<Arc<dyn ResponseHook>> =
            vec![Arc::new(Broken), Arc::new(Counter(calls.clone()))];

        let mut up = upstream();
        run_on_response(&hooks, &request(), &mut up).await;

        // The broken hook did not stop the later one, and the response kept
        // the later hook's mutation.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(up.headers.get("x-touched").unwrap(), "yes");
        assert_eq!(up.status, StatusCode::OK);
    }
}
