//! Fluent rule configuration.

use super::set::RuleSet;
use crate::action::{Action, SharedAction, StaticResponse, DEFAULT_BAD_REQUEST_BODY};
use crate::error::RuleError;
use crate::predicate::{self, Predicate};
use bytes::Bytes;
use hyper::StatusCode;
use std::sync::Arc;

/// Handle to one rule of a [`RuleSet`].
///
/// Holds a plain borrow of the owning set plus the rule's index; the set
/// keeps ownership of the rule. Every call applies immediately, so a chain
/// can be abandoned at any point and the configured parts still stand.
#[derive(Debug, Clone, Copy)]
pub struct RuleBuilder<'a> {
    rule_set: &'a RuleSet,
    index: usize,
}

impl<'a> RuleBuilder<'a> {
    pub(crate) fn new(rule_set: &'a RuleSet, index: usize) -> Self {
        Self { rule_set, index }
    }

    /// Position of this rule in its set (its match priority).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn add_predicate(self, predicate: Predicate) -> Self {
        self.rule_set
            .with_rule_mut(self.index, |rule| rule.push_predicate(predicate));
        self
    }

    pub fn when_method(self, method: impl Into<String>) -> Self {
        self.add_predicate(predicate::method_is(method))
    }

    pub fn when_get(self) -> Self {
        self.when_method("GET")
    }

    pub fn when_post(self) -> Self {
        self.when_method("POST")
    }

    /// Match when the display URL contains a match for `pattern`.
    pub fn when_url_match(self, pattern: &str) -> Result<Self, RuleError> {
        Ok(self.add_predicate(predicate::url_matches(pattern)?))
    }

    pub fn when_header_match(self, name: &str, value: impl Into<String>) -> Result<Self, RuleError> {
        Ok(self.add_predicate(predicate::header_matches(name, value)?))
    }

    /// Match an exact `Authorization` value, scheme included.
    pub fn when_authorization_match(self, token: impl Into<String>) -> Result<Self, RuleError> {
        Ok(self.add_predicate(predicate::authorization_matches(token)?))
    }

    /// Replace the rule's action.
    pub fn set_action(self, action: impl Action + 'static) -> Self {
        self.set_shared_action(Arc::new(action))
    }

    pub fn set_shared_action(self, action: SharedAction) -> Self {
        self.rule_set
            .with_rule_mut(self.index, |rule| rule.set_action(action));
        self
    }

    /// Respond `200 OK` with `body`.
    pub fn set_ok_response(self, body: impl Into<Bytes>) -> Self {
        self.set_action(StaticResponse::ok(body))
    }

    /// Respond `400 Bad Request` with `message`.
    pub fn set_bad_request(self, message: impl Into<Bytes>) -> Self {
        self.set_action(StaticResponse::bad_request(message))
    }

    /// Respond `400 Bad Request` with the body `"Bad Request"`.
    pub fn set_bad_request_default(self) -> Self {
        self.set_bad_request(DEFAULT_BAD_REQUEST_BODY)
    }

    pub fn set_response(self, status: u16, body: impl Into<Bytes>) -> Result<Self, RuleError> {
        let status = StatusCode::from_u16(status).map_err(|_| RuleError::InvalidStatus(status))?;
        Ok(self.set_action(StaticResponse::new(status, body)))
    }

    /// Cap how many requests this rule may answer; `None` removes the cap.
    pub fn set_max_match_count(self, max: impl Into<Option<u32>>) -> Self {
        let max = max.into();
        self.rule_set
            .with_rule_mut(self.index, |rule| rule.set_max_match_count(max));
        self
    }

    /// Complete this rule and start the next one on the same set.
    ///
    /// Fails with [`RuleError::IncompleteRule`] if no action was set.
    pub fn add_rule(self) -> Result<RuleBuilder<'a>, RuleError> {
        self.validate()?;
        Ok(self.rule_set.create_rule())
    }

    /// Complete this rule and end the chain, returning its index.
    pub fn finish(self) -> Result<usize, RuleError> {
        self.validate()?;
        Ok(self.index)
    }

    fn validate(&self) -> Result<(), RuleError> {
        let complete = self
            .rule_set
            .with_rule(self.index, |rule| rule.has_action())
            .unwrap_or(false);
        if complete {
            Ok(())
        } else {
            Err(RuleError::IncompleteRule { index: self.index })
        }
    }
}
