//! Immutable request snapshot that predicates evaluate against.

use hyper::http::request::Parts;
use hyper::http::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use std::net::SocketAddr;

/// Snapshot of an incoming request: method token, display URL and headers.
///
/// Header lookups are case-insensitive and a header may carry several values,
/// both courtesy of [`HeaderMap`].
#[derive(Debug, Clone)]
pub struct RequestView {
    method: String,
    url: String,
    headers: HeaderMap,
}

impl RequestView {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Append a header value. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Build a view from hyper request parts.
    ///
    /// The display URL is `http://{authority}{path}?{query}` where the
    /// authority comes from the `Host` header, falling back to the local
    /// address the connection was accepted on.
    pub fn from_parts(parts: &Parts, local_addr: SocketAddr) -> Self {
        let authority = parts
            .uri
            .authority()
            .map(|a| a.to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(hyper::header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| local_addr.to_string());
        let scheme = parts.uri.scheme_str().unwrap_or("http");
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Self {
            method: parts.method.as_str().to_string(),
            url: format!("{scheme}://{authority}{path_and_query}"),
            headers: parts.headers.clone(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Full display URL (scheme, host, path and query).
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
