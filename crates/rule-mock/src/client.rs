//! HTTP client bound to a spawned server.

use crate::error::ServerError;
use crate::server::ServerHandle;
use reqwest::{Method, RequestBuilder};

/// A `reqwest` client whose relative paths resolve against one listener.
///
/// Holds the listener's [`ServerHandle`], so the server stays up for as long
/// as the client exists.
#[derive(Debug)]
pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
    server: ServerHandle,
}

impl TestClient {
    pub(crate) fn new(server: ServerHandle) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            base_url: server.base_url(),
            server,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn server(&self) -> &ServerHandle {
        &self.server
    }

    /// Resolve `path` against the base URL.
    ///
    /// `"/a"`, `"a"` and `"?id=1"` all resolve under the root, matching how a
    /// relative reference resolves against `http://host/`.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }
}
