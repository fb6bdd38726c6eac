//! Request logging for the check endpoints

use axum::body::Body;
use axum::Router;
use http::{Request, Response};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};

pub fn with_request_logging<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    query = ?request.uri().query(),
                )
            })
            .on_request(|request: &Request<Body>, _span: &Span| {
                tracing::debug!(
                    "started processing request {} {}",
                    request.method(),
                    request.uri().path()
                );
            })
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                let status = response.status();
                let latency_ms = latency.as_millis();

                // Failing checks answer with a server error on purpose; that is a
                // report, not a broken request.
                if status.is_success() || status.is_server_error() {
                    tracing::info!(
                        status = status.as_u16(),
                        latency_ms = latency_ms,
                        "request completed"
                    );
                } else {
                    tracing::warn!(
                        status = status.as_u16(),
                        latency_ms = latency_ms,
                        "client error response"
                    );
                }
            })
            .on_failure(|error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                tracing::debug!(
                    latency_ms = latency.as_millis(),
                    error = ?error,
                    "request classified as failure"
                );
            }),
    )
}
