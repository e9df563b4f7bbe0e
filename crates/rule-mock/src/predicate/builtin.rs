//! Built-in predicate constructors.

use super::Predicate;
use crate::error::RuleError;
use hyper::http::HeaderName;
use regex::Regex;

/// Request method equals `method` exactly. Method tokens are case-sensitive.
pub fn method_is(method: impl Into<String>) -> Predicate {
    let method = method.into();
    Predicate::new(format!("method is {method}"), move |request| {
        request.method() == method
    })
}

/// The display URL contains a match for `pattern` (search, not full match).
pub fn url_matches(pattern: &str) -> Result<Predicate, RuleError> {
    let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(Predicate::new(format!("url matches {pattern}"), move |request| {
        regex.is_match(request.url())
    }))
}

/// Header `name` is present and one of its values equals `value` exactly.
pub fn header_matches(name: &str, value: impl Into<String>) -> Result<Predicate, RuleError> {
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| RuleError::InvalidHeaderName(name.to_string()))?;
    let value = value.into();
    Ok(Predicate::new(
        format!("header {header} is {value}"),
        move |request| {
            request
                .headers()
                .get_all(&header)
                .iter()
                .any(|actual| actual.as_bytes() == value.as_bytes())
        },
    ))
}

/// Shorthand for `header_matches("Authorization", token)`. The token is the
/// full header value including the scheme, e.g. `"Bearer abc"`.
pub fn authorization_matches(token: impl Into<String>) -> Result<Predicate, RuleError> {
    header_matches("Authorization", token)
}
