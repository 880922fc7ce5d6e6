//! Response body decoding by declared content type.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::Deserialize;

use crate::error::{ErrorCode, ErrorInfo};

/// Longest body excerpt embedded in synthesized error messages.
const MAX_RENDERED_BODY: usize = 512;

/// Body encodings the classifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    MsgPack,
    Other,
}

impl ContentKind {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(Self::from_mime)
            .unwrap_or(ContentKind::Other)
    }

    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => ContentKind::Json,
            "application/x-msgpack" | "application/msgpack" => ContentKind::MsgPack,
            _ => ContentKind::Other,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ContentKind::Json => "application/json",
            ContentKind::MsgPack => "application/x-msgpack",
            ContentKind::Other => "application/octet-stream",
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    MsgPack(rmpv::Value),
    /// Unrecognized content type, passed through untouched.
    Raw(Bytes),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorInfo,
}

impl ResponseBody {
    /// Decode `bytes` according to the response's content type.
    ///
    /// Empty bodies decode to `None`.
    pub fn decode(headers: &HeaderMap, bytes: Bytes) -> Result<Option<Self>, ErrorInfo> {
        if bytes.is_empty() {
            return Ok(None);
        }
        match ContentKind::from_headers(headers) {
            ContentKind::Json => serde_json::from_slice(&bytes)
                .map(|value| Some(ResponseBody::Json(value)))
                .map_err(|e| decode_error("JSON", &e.to_string())),
            ContentKind::MsgPack => {
                let mut reader: &[u8] = &bytes;
                rmpv::decode::read_value(&mut reader)
                    .map(|value| Some(ResponseBody::MsgPack(value)))
                    .map_err(|e| decode_error("MessagePack", &e.to_string()))
            }
            ContentKind::Other => Ok(Some(ResponseBody::Raw(bytes))),
        }
    }

    /// Structured `{"error": {...}}` payload, if the body carries one.
    pub fn error_payload(&self) -> Option<ErrorInfo> {
        match self {
            ResponseBody::Json(value) => {
                let error = value.get("error")?;
                if !error.is_object() {
                    return None;
                }
                serde_json::from_value(error.clone()).ok()
            }
            ResponseBody::MsgPack(value) => {
                if !value.is_map() {
                    return None;
                }
                rmpv::ext::from_value::<ErrorEnvelope>(value.clone())
                    .ok()
                    .map(|envelope| envelope.error)
            }
            ResponseBody::Raw(_) => None,
        }
    }

    /// JSON view of the body, for display and for JSON-typed callers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ResponseBody::Json(value) => value.clone(),
            ResponseBody::MsgPack(value) => {
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
            }
            ResponseBody::Raw(bytes) => {
                serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }

    /// Raw text, if the body was passed through undecoded.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ResponseBody::Raw(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// Bounded, lossless-enough rendering for error messages.
    pub fn render_safe(&self) -> String {
        let text = match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::MsgPack(value) => value.to_string(),
            ResponseBody::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        truncate(text)
    }
}

fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_RENDERED_BODY {
        return text;
    }
    let mut out: String = text.chars().take(MAX_RENDERED_BODY).collect();
    out.push_str("...");
    out
}

fn decode_error(format: &str, detail: &str) -> ErrorInfo {
    ErrorInfo::new(
        format!("Failed to decode {} response body: {}", format, detail),
        Some(ErrorCode::Number(40000)),
        None,
    )
}
