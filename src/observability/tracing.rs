//! Request correlation.
//!
//! # Responsibilities
//! - Generate request ids sent as the `request_id` query parameter
//! - Create the span wrapping one dispatch
//!
//! # Design Decisions
//! - One id per dispatch; every host attempt carries the same id so the
//!   server side can correlate retries

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use http::Method;
use tracing::Span;
use uuid::Uuid;

/// Query parameter carrying the request id.
pub const REQUEST_ID_PARAM: &str = "request_id";

/// New url-safe request id (base64 of 16 random bytes).
pub fn new_request_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

/// Span for one dispatch.
pub fn request_span(method: &Method, target: &str, request_id: Option<&str>) -> Span {
    tracing::info_span!(
        "rest_request",
        method = %method,
        target = %target,
        request_id = request_id.unwrap_or("-"),
    )
}
