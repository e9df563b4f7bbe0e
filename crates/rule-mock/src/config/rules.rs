//! Declarative rule definitions.

use crate::action::StaticResponse;
use crate::error::RuleError;
use crate::predicate::{authorization_matches, header_matches, method_is, url_matches};
use crate::rule::RuleSet;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One rule as written in a config file.
///
/// Each populated field adds a predicate, in this order: method, url,
/// headers, authorization.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RuleConfig {
    /// Exact method token, e.g. "GET"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Regex searched in the full display URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Header matchers (all must match)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderMatch>,
    /// Exact Authorization header value, scheme included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    pub response: ResponseConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_match_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderMatch {
    pub name: String,
    pub value: String,
}

/// Fixed response written when a rule (or the fallback) fires.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResponseConfig {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

fn default_status() -> u16 {
    200
}

impl ResponseConfig {
    pub fn to_action(&self) -> Result<StaticResponse, RuleError> {
        let status =
            StatusCode::from_u16(self.status).map_err(|_| RuleError::InvalidStatus(self.status))?;
        self.headers.iter().try_fold(
            StaticResponse::new(status, self.body.clone()),
            |action, (name, value)| action.with_header(name, value),
        )
    }
}

impl RuleConfig {
    /// Append this rule to `rule_set`, returning its index.
    ///
    /// Predicates and the response are built first; nothing is appended
    /// when any of them is invalid.
    pub fn apply(&self, rule_set: &RuleSet) -> Result<usize, RuleError> {
        let mut predicates = Vec::new();
        if let Some(ref method) = self.method {
            predicates.push(method_is(method.clone()));
        }
        if let Some(ref pattern) = self.url {
            predicates.push(url_matches(pattern)?);
        }
        for header in &self.headers {
            predicates.push(header_matches(&header.name, header.value.clone())?);
        }
        if let Some(ref token) = self.authorization {
            predicates.push(authorization_matches(token.clone())?);
        }
        let action = self.response.to_action()?;

        predicates
            .into_iter()
            .fold(rule_set.create_rule(), |builder, p| builder.add_predicate(p))
            .set_action(action)
            .set_max_match_count(self.max_match_count)
            .finish()
    }
}
