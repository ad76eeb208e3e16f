//! `portico run` — start the gateway server.
//!
//! Loads and validates the route config, compiles it into a [`Gateway`],
//! and serves it with Axum until a shutdown signal arrives. The route
//! table is immutable for the lifetime of the process; restart to pick
//! up config changes.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config;
use crate::error::PorticoError;
use crate::gateway::Gateway;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), PorticoError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let path = match args.config {
        Some(path) => path,
        None => config::detect_config_file().ok_or_else(|| PorticoError::NoConfigSource {
            hint: "Provide --config <file> or place a portico.yaml in the working directory.\n  \
                   Run 'portico init' to create one."
                .into(),
        })?,
    };
    tracing::info!(path = %path.display(), "loading config");

    let (mut loaded, digest) = config::load_path(&path)?;

    if let Some(timeout) = args.timeout {
        loaded.defaults.timeout = timeout;
    }

    let route_count = loaded.routes.len();
    let gateway = Gateway::from_config(&loaded)?;

    let state = Arc::new(AppState::new(
        gateway,
        path.display().to_string(),
        Some(digest),
    ));

    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        routes = route_count,
        config = %path.display(),
        "portico started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("portico stopped");
    Ok(())
}
