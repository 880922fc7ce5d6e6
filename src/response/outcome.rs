//! Result of one request, as seen by callers.

use http::{HeaderMap, StatusCode};

use crate::error::ErrorInfo;
use crate::response::body::ResponseBody;

/// Successful (status < 300) response.
#[derive(Debug, Clone)]
pub struct SuccessResponse {
    pub body: Option<ResponseBody>,
    pub headers: HeaderMap,
    pub status: StatusCode,
}

/// Failed request: transport failure, error status, or undecodable body.
#[derive(Debug, Clone)]
pub struct FailureResponse {
    pub error: ErrorInfo,
    pub body: Option<ResponseBody>,
    pub headers: Option<HeaderMap>,
    pub status: Option<StatusCode>,
    /// Network-layer failure or 500-504 response; another host may help.
    pub retryable: bool,
}

/// Exactly one of success or failure.
#[derive(Debug, Clone)]
pub enum ResponseOutcome {
    Success(SuccessResponse),
    Failure(FailureResponse),
}

impl ResponseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseOutcome::Success(_))
    }

    pub fn is_retryable_failure(&self) -> bool {
        matches!(self, ResponseOutcome::Failure(f) if f.retryable)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ResponseOutcome::Success(s) => Some(s.status),
            ResponseOutcome::Failure(f) => f.status,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            ResponseOutcome::Success(_) => None,
            ResponseOutcome::Failure(f) => Some(&f.error),
        }
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        match self {
            ResponseOutcome::Success(s) => s.body.as_ref(),
            ResponseOutcome::Failure(f) => f.body.as_ref(),
        }
    }

    /// Label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ResponseOutcome::Success(_) => "success",
            ResponseOutcome::Failure(f) if f.retryable => "retryable_failure",
            ResponseOutcome::Failure(_) => "failure",
        }
    }

    /// Flatten into the `(error, body, headers, is_error, status)` caller shape.
    pub fn into_rest_response(self) -> RestResponse {
        match self {
            ResponseOutcome::Success(s) => RestResponse {
                error: None,
                body: s.body,
                headers: s.headers,
                is_error: false,
                status_code: Some(s.status.as_u16()),
            },
            ResponseOutcome::Failure(f) => RestResponse {
                error: Some(f.error),
                body: f.body,
                headers: f.headers.unwrap_or_default(),
                is_error: true,
                status_code: f.status.map(|s| s.as_u16()),
            },
        }
    }
}

/// Caller-facing response shape.
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub error: Option<ErrorInfo>,
    pub body: Option<ResponseBody>,
    pub headers: HeaderMap,
    pub is_error: bool,
    pub status_code: Option<u16>,
}

impl From<ResponseOutcome> for RestResponse {
    fn from(outcome: ResponseOutcome) -> Self {
        outcome.into_rest_response()
    }
}
