//! Custom tracing utilities for HTTP requests
//!
//! Spans carry the request metadata the helpers resolve (API version, client IP, API-ness) so
//! every log line under a request can be filtered by them.

use axum::http::{Request, Response};
use std::collections::BTreeMap;
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tracing::{info_span, Level, Span};

use crate::request::InboundRequest;
use crate::version::{is_api_request, resolve_version};

const REDACTED: &str = "[REDACTED]";

/// Creates the span for one HTTP request
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request.header("x-request-id").unwrap_or("unknown");
    let correlation_id = request.header("x-correlation-id").unwrap_or("unknown");

    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri().path(),
        query = ?request.uri().query(),
        request_id = request_id,
        correlation_id = correlation_id,
        api_version = ?resolve_version(request),
        api_request = is_api_request(request),
        client_ip = ?request.ip(),
        user_agent = ?request.header("user-agent"),
        content_type = ?request.header("content-type"),
    )
}

/// Header map with credentials masked
pub fn redacted_headers<R: InboundRequest + ?Sized>(request: &R) -> BTreeMap<String, Vec<String>> {
    let mut headers = request.all_headers();
    for (name, values) in headers.iter_mut() {
        if is_sensitive(name) {
            values.iter_mut().for_each(|v| *v = REDACTED.to_string());
        }
    }
    headers
}

fn is_sensitive(name: &str) -> bool {
    name.contains("authorization")
        || name.contains("cookie")
        || name.contains("token")
        || name == "x-api-key"
}

pub fn on_request<B>(request: &Request<B>, _span: &Span) {
    tracing::info!(
        method = %request.method(),
        uri = %request.uri(),
        headers = ?redacted_headers(request),
        "Incoming HTTP request"
    );
}

/// Logs the response at a level matching its status class
pub fn on_response<B>(response: &Response<B>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis();

    let log_level = match status.as_u16() {
        400..=499 => Level::WARN,
        500..=599 => Level::ERROR,
        _ => Level::INFO,
    };

    match log_level {
        Level::WARN => tracing::warn!(
            status = %status,
            latency_ms = latency_ms,
            "HTTP request completed with client error"
        ),
        Level::ERROR => tracing::error!(
            status = %status,
            latency_ms = latency_ms,
            "HTTP request completed with server error"
        ),
        _ => tracing::info!(
            status = %status,
            latency_ms = latency_ms,
            "HTTP request completed successfully"
        ),
    }
}

pub fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    let error_type = match error {
        ServerErrorsFailureClass::StatusCode(code) => format!("HTTP {}", code.as_u16()),
        ServerErrorsFailureClass::Error(_) => "Internal Error".to_string(),
    };

    tracing::error!(
        error = ?error,
        latency_ms = latency.as_millis(),
        error_type = %error_type,
        "HTTP request failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_masked() {
        let request = Request::builder()
            .uri("/api/v1/request-info")
            .header("Authorization", "Bearer abc")
            .header("Cookie", "auth-token=abc")
            .header("X-API-KEY", "k")
            .header("Accept", "application/json")
            .body(())
            .unwrap();

        let headers = redacted_headers(&request);
        assert_eq!(headers["authorization"], vec![REDACTED.to_string()]);
        assert_eq!(headers["cookie"], vec![REDACTED.to_string()]);
        assert_eq!(headers["x-api-key"], vec![REDACTED.to_string()]);
        assert_eq!(headers["accept"], vec!["application/json".to_string()]);
    }

    #[test]
    fn span_builds_without_subscriber() {
        let request = Request::builder()
            .uri("/api/v3/things")
            .body(())
            .unwrap();
        let _span = make_request_span(&request);
    }
}
