pub mod chat;
pub mod health;
pub mod history;
pub mod maintenance;

use axum::http::HeaderMap;

/// `X-Request-Id` of the incoming request, `-` when absent.
pub(crate) fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}
