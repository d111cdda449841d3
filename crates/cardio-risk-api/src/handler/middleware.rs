//! Request middleware
//!
//! Every request gets an id (taken from `x-request-id` when the client sent
//! one) that is logged and echoed back in the response headers.

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
    Extension,
};
use std::time::Instant;

use super::routes::HandlerState;

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned to the current request
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Id of the current request, or a fresh one when the logging middleware is not installed
    pub fn resolve(id: Option<Extension<RequestId>>) -> String {
        id.map(|Extension(id)| id.0)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

/// Request logging middleware
///
/// Logs request start and completion with method, URI, status and duration.
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let start = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Count requests by matched route and status
pub async fn metrics_middleware(
    State(state): State<HandlerState>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    state
        .metrics
        .assessment()
        .record_http_request(&route, response.status().as_u16());

    response
}
