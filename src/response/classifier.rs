//! Success/error classification of raw HTTP results.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::{ErrorCode, ErrorInfo, TransportError};
use crate::resilience::retries::is_retryable_status;
use crate::response::body::ResponseBody;
use crate::response::outcome::{FailureResponse, ResponseOutcome, SuccessResponse};

/// Header carrying a server error code when the body has no error payload.
pub const ERROR_CODE_HEADER: &str = "x-ably-errorcode";
/// Header carrying a server error message when the body has no error payload.
pub const ERROR_MESSAGE_HEADER: &str = "x-ably-errormessage";

/// Classify a received response.
pub fn classify_response(status: StatusCode, headers: HeaderMap, raw: Bytes) -> ResponseOutcome {
    let retryable = is_retryable_status(status);

    let body = match ResponseBody::decode(&headers, raw.clone()) {
        Ok(body) => body,
        Err(mut error) if status.as_u16() < 300 => {
            error.status_code = Some(status.as_u16());
            return ResponseOutcome::Failure(FailureResponse {
                error,
                body: Some(ResponseBody::Raw(raw)),
                headers: Some(headers),
                status: Some(status),
                retryable: false,
            });
        }
        // An error status with a mislabelled body still reports the status.
        Err(_) => Some(ResponseBody::Raw(raw)),
    };

    if status.as_u16() < 300 {
        return ResponseOutcome::Success(SuccessResponse {
            body,
            headers,
            status,
        });
    }

    let error = body
        .as_ref()
        .and_then(ResponseBody::error_payload)
        .or_else(|| error_from_headers(status, &headers))
        .unwrap_or_else(|| generic_error(status, body.as_ref()));

    ResponseOutcome::Failure(FailureResponse {
        error,
        body,
        headers: Some(headers),
        status: Some(status),
        retryable,
    })
}

/// Wrap a transport failure; no body is decoded.
pub fn classify_transport_error(err: &TransportError) -> ResponseOutcome {
    ResponseOutcome::Failure(FailureResponse {
        error: err.to_error_info(),
        body: None,
        headers: None,
        status: None,
        retryable: err.is_retryable(),
    })
}

fn error_from_headers(status: StatusCode, headers: &HeaderMap) -> Option<ErrorInfo> {
    let code = headers
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| match v.parse::<i64>() {
            Ok(n) => ErrorCode::Number(n),
            Err(_) => ErrorCode::Text(v.to_string()),
        });
    let message = headers
        .get(ERROR_MESSAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if code.is_none() && message.is_none() {
        return None;
    }
    let message = message
        .unwrap_or_else(|| format!("Error response received from server: {}", status.as_u16()));
    Some(ErrorInfo::new(message, code, Some(status.as_u16())))
}

fn generic_error(status: StatusCode, body: Option<&ResponseBody>) -> ErrorInfo {
    let rendered = body
        .map(ResponseBody::render_safe)
        .unwrap_or_else(|| "<empty>".to_string());
    ErrorInfo::new(
        format!(
            "Error response received from server: {} body was: {}",
            status.as_u16(),
            rendered
        ),
        None,
        Some(status.as_u16()),
    )
}
