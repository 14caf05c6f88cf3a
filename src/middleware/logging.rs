//! Request logging middleware
//!
//! Logs each request and response with a trace ID for correlation. The
//! ID is taken from the `x-trace-id` header when the caller supplies one
//! and generated otherwise, and is echoed back on the response.

use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

/// Header name for trace ID
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Trace ID attached to a request
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new trace ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Middleware to log HTTP requests and responses
pub async fn log_request(request: Request, next: Next) -> Response<Body> {
    let start = Instant::now();

    let trace_id = extract_or_generate_trace_id(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::info!(
        trace_id = %trace_id,
        method = %method,
        path = %path,
        "Incoming request"
    );

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %method,
        path = %path,
    );

    let response = {
        let _guard = span.enter();
        next.run(request).await
    };

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            trace_id = %trace_id,
            status = status.as_u16(),
            duration_ms = %format!("{:.2}", duration_ms),
            "Request failed"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            trace_id = %trace_id,
            status = status.as_u16(),
            duration_ms = %format!("{:.2}", duration_ms),
            "Client error"
        );
    } else {
        tracing::info!(
            trace_id = %trace_id,
            status = status.as_u16(),
            duration_ms = %format!("{:.2}", duration_ms),
            "Request completed"
        );
    }

    // Echo the trace ID on the response
    let mut response = response;
    if let Ok(header_value) = HeaderValue::from_str(&trace_id.0) {
        response.headers_mut().insert(TRACE_ID_HEADER, header_value);
    }

    response
}

/// Extract trace ID from request headers or generate a new one
fn extract_or_generate_trace_id(request: &Request) -> TraceId {
    request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|id| TraceId(id.to_string()))
        .unwrap_or_default()
}
