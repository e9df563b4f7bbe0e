//! Response actions.
//!
//! An [`Action`] writes a response into a [`ResponseSink`]. Actions are async
//! and the dispatcher awaits them to completion before the request is done.
//! Errors are not caught by the rule engine; they propagate to whoever drives
//! the request (the server turns them into a 500).

use crate::error::RuleError;
use crate::response::ResponseSink;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::http::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Body written by the built-in not-found fallback.
pub const DEFAULT_NOT_FOUND_BODY: &str = "Simon says Not Match";

/// Body written by `set_bad_request` when no message is given.
pub const DEFAULT_BAD_REQUEST_BODY: &str = "Bad Request";

#[async_trait]
pub trait Action: Send + Sync {
    async fn respond(&self, response: &mut ResponseSink) -> anyhow::Result<()>;
}

/// Shared, type-erased action as stored on rules.
pub type SharedAction = Arc<dyn Action>;

/// Fixed status, headers and body.
#[derive(Clone)]
pub struct StaticResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl StaticResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Add a response header. Repeated names produce repeated headers.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, RuleError> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RuleError::InvalidHeaderName(name.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| RuleError::InvalidHeaderValue(name.to_string()))?;
        self.headers.append(header, value);
        Ok(self)
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn bad_request(message: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Debug for StaticResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[async_trait]
impl Action for StaticResponse {
    async fn respond(&self, response: &mut ResponseSink) -> anyhow::Result<()> {
        response.set_status(self.status);
        for (name, value) in &self.headers {
            response.headers_mut().append(name.clone(), value.clone());
        }
        response.write(&self.body);
        Ok(())
    }
}

/// Adapts a synchronous closure into an [`Action`].
pub struct FnAction<F>(F);

impl<F> FnAction<F>
where
    F: Fn(&mut ResponseSink) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: Fn(&mut ResponseSink) -> anyhow::Result<()> + Send + Sync,
{
    async fn respond(&self, response: &mut ResponseSink) -> anyhow::Result<()> {
        (self.0)(response)
    }
}

/// The fallback used by a fresh rule set: 404 with [`DEFAULT_NOT_FOUND_BODY`].
pub fn default_not_found() -> SharedAction {
    Arc::new(StaticResponse::not_found(DEFAULT_NOT_FOUND_BODY))
}
