//! Request identification.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - An ID sent by the client is kept, so callers can correlate across hops

use axum::http::HeaderMap;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request ID assigned by `SetRequestIdLayer`, if any.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
