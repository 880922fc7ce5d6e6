//! Default request decoration.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderName, HeaderValue};

use crate::config::{RequestConfig, PROTOCOL_VERSION};
use crate::observability::tracing::REQUEST_ID_PARAM;
use crate::response::ContentKind;
use crate::transport::RequestDescriptor;

/// Protocol version header sent with every request.
pub const VERSION_HEADER: HeaderName = HeaderName::from_static("x-ably-version");

/// Supplies the `Authorization` header value for outgoing requests.
pub trait AuthHeaderSource: Send + Sync {
    fn authorization(&self) -> Option<HeaderValue>;
}

/// HTTP Basic credentials from an API key (`name:secret`).
#[derive(Clone)]
pub struct BasicKeyAuth {
    value: HeaderValue,
}

impl BasicKeyAuth {
    /// Returns `None` if the encoded key is not a valid header value.
    pub fn new(api_key: &str) -> Option<Self> {
        let encoded = format!("Basic {}", STANDARD.encode(api_key));
        let mut value = HeaderValue::from_str(&encoded).ok()?;
        value.set_sensitive(true);
        Some(Self { value })
    }
}

impl AuthHeaderSource for BasicKeyAuth {
    fn authorization(&self) -> Option<HeaderValue> {
        Some(self.value.clone())
    }
}

impl std::fmt::Debug for BasicKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BasicKeyAuth(..)")
    }
}

/// Adds protocol headers, credentials and the request id to a request.
///
/// Headers already set by the caller are left untouched.
#[derive(Clone, Default)]
pub struct DefaultHeaders {
    binary: bool,
    auth: Option<Arc<dyn AuthHeaderSource>>,
}

impl DefaultHeaders {
    pub fn new(config: &RequestConfig) -> Self {
        let auth = config
            .api_key
            .as_deref()
            .and_then(BasicKeyAuth::new)
            .map(|auth| Arc::new(auth) as Arc<dyn AuthHeaderSource>);
        Self {
            binary: config.use_binary_protocol,
            auth,
        }
    }

    /// Replace the credential source.
    pub fn with_auth(mut self, auth: Arc<dyn AuthHeaderSource>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn apply(&self, mut request: RequestDescriptor, request_id: Option<&str>) -> RequestDescriptor {
        let kind = if self.binary {
            ContentKind::MsgPack
        } else {
            ContentKind::Json
        };
        let mime = HeaderValue::from_static(kind.mime());

        let headers = &mut request.headers;
        headers.entry(ACCEPT).or_insert_with(|| mime.clone());
        headers
            .entry(VERSION_HEADER)
            .or_insert_with(|| HeaderValue::from_static(PROTOCOL_VERSION));
        if request.body.is_some() {
            headers.entry(CONTENT_TYPE).or_insert(mime);
        }
        if !headers.contains_key(AUTHORIZATION) {
            if let Some(value) = self.auth.as_ref().and_then(|auth| auth.authorization()) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        if let Some(id) = request_id {
            request.query.push((REQUEST_ID_PARAM.to_string(), id.to_string()));
        }
        request
    }
}

impl std::fmt::Debug for DefaultHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultHeaders")
            .field("binary", &self.binary)
            .field("has_auth", &self.auth.is_some())
            .finish()
    }
}
