//! Error types for rule setup and hosting.

use std::net::SocketAddr;

/// Errors raised while building rules.
///
/// These surface at setup time; the dispatch loop itself never fails on a
/// malformed rule (rules without an action are simply inactive).
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),
    #[error("Invalid header value for '{0}'")]
    InvalidHeaderValue(String),
    #[error("Invalid status code: {0}")]
    InvalidStatus(u16),
    #[error("Rule {index} has no action; set one before adding the next rule")]
    IncompleteRule { index: usize },
}

/// Errors raised by the hosting layer.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
