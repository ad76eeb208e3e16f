//! `portico routes` — list the routes of a running gateway.
//!
//! Sends a `GET /services.json` request to the specified URL and displays
//! the registered routes as formatted text or raw JSON.

use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::RoutesArgs;
use crate::error::PorticoError;
use crate::routes::RouteSummary;

pub async fn execute(args: RoutesArgs) -> Result<(), PorticoError> {
    let url = format!("{}/services.json", args.url.trim_end_matches('/'));
    let uri: hyper::Uri =
        url.parse()
            .map_err(|e: hyper::http::uri::InvalidUri| PorticoError::UriParse {
                source: Box::new(e),
            })?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(http_body_util::Full::new(bytes::Bytes::new()))
        .map_err(|e| PorticoError::HttpRequest {
            source: Box::new(e),
        })?;

    let response = tokio::time::timeout(std::time::Duration::from_secs(10), client.request(req))
        .await
        .map_err(|_| PorticoError::HttpRequest {
            source: "route listing timed out after 10s".into(),
        })?
        .map_err(|e| PorticoError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| PorticoError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    if !status.is_success() {
        return Err(PorticoError::IntrospectionFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    let body_str = String::from_utf8_lossy(&body);
    match serde_json::from_str::<Vec<RouteSummary>>(&body_str) {
        Ok(summaries) => {
            println!(
                "\u{2713} {} routes registered at {}",
                summaries.len(),
                args.url
            );
            for summary in &summaries {
                match &summary.docs {
                    Some(docs) => println!("  {}  {}", summary.prefix, docs),
                    None => println!("  {}", summary.prefix),
                }
            }
        }
        Err(e) => {
            eprintln!("Failed to parse route listing: {e}");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}
