//! Request logging applied uniformly to every route.
//!
//! Records the method, path, caller and outcome of each request. The caller is
//! taken from the `x-user-id` header set by the fronting gateway; requests
//! without it are logged as `unauthenticated`.

use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Header carrying the external id of the calling user.
pub const CALLER_HEADER: &str = "x-user-id";

const ANONYMOUS: &str = "unauthenticated";

/// Caller id from the request headers, or `unauthenticated`.
pub fn caller_id(headers: &HeaderMap) -> &str {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS)
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
pub fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Log every handled request with its caller and response status.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let caller = caller_id(req.headers()).to_string();
    let started = Instant::now();

    tracing::info!(%method, %path, %caller, "Request received");

    let response = next.run(req).await;
    let status = response.status();
    let elapsed_ms = elapsed_millis(started.elapsed());

    if status.is_server_error() {
        tracing::error!(%method, %path, %caller, status = status.as_u16(), elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, %caller, status = status.as_u16(), elapsed_ms, "Request rejected");
    } else {
        tracing::debug!(%method, %path, %caller, status = status.as_u16(), elapsed_ms, "Request completed");
    }

    response
}
