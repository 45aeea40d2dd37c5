//! Edge middleware: request correlation ids and response logging.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics::histogram;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

/// Correlation id minted at the edge. Stamped on the request for
/// handlers and echoed on the response for the log line.
#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let started = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = started.elapsed();
    let status = response.status();

    histogram!("rostra_http_request_seconds").record(elapsed.as_secs_f64());

    if !status.is_client_error() && !status.is_server_error() {
        debug!(
            target: "rostra::http",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            elapsed_ms = elapsed.as_millis() as u64,
            request_id,
            "request served",
        );
        return response;
    }

    let (origin, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.origin, report.chain),
        None => ("unknown", Vec::new()),
    };
    let detail = chain
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());

    if status.is_server_error() {
        error!(
            target: "rostra::http",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            elapsed_ms = elapsed.as_millis() as u64,
            origin,
            detail = %detail,
            chain = ?chain,
            request_id,
            "request failed",
        );
    } else {
        warn!(
            target: "rostra::http",
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            query = uri.query().unwrap_or(""),
            elapsed_ms = elapsed.as_millis() as u64,
            origin,
            detail = %detail,
            chain = ?chain,
            request_id,
            "client request error",
        );
    }

    response
}
