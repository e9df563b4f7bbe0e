//! Buffered response written by actions.

use crate::error::RuleError;
use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::http::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Response, StatusCode};

/// Settable status, headers and an append-only body.
///
/// Starts as `200 OK` with an empty body, the transport default.
#[derive(Debug)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Insert a header, replacing any existing values for that name.
    pub fn insert_header(&mut self, name: &str, value: &str) -> Result<(), RuleError> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RuleError::InvalidHeaderName(name.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| RuleError::InvalidHeaderValue(name.to_string()))?;
        self.headers.insert(header, value);
        Ok(())
    }

    /// Append to the body.
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossily decoded.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
