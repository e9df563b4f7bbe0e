//! Ordered rule collection with a fallback action.

use super::builder::RuleBuilder;
use super::{Rule, RuleSnapshot};
use crate::action::{default_not_found, Action, SharedAction, StaticResponse};
use crate::error::RuleError;
use bytes::Bytes;
use hyper::StatusCode;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use tracing::debug;

/// Rules in registration order plus the action used when none match.
///
/// Rules are append-only for the lifetime of the set. The set is shared
/// between the test body (writers, via [`RuleBuilder`]) and concurrent
/// dispatches (readers).
pub struct RuleSet {
    rules: RwLock<Vec<Rule>>,
    default_action: RwLock<SharedAction>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl RuleSet {
    /// Empty set answering every request with `404 Simon says Not Match`.
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            default_action: RwLock::new(default_not_found()),
        }
    }

    /// Append a new, empty rule and return its builder.
    pub fn create_rule(&self) -> RuleBuilder<'_> {
        let index = {
            let mut rules = self.rules.write();
            rules.push(Rule::new());
            rules.len() - 1
        };
        debug!("Created rule {}", index);
        RuleBuilder::new(self, index)
    }

    /// Replace the fallback action.
    pub fn set_default_action(&self, action: impl Action + 'static) -> &Self {
        self.set_shared_default_action(Arc::new(action))
    }

    pub fn set_shared_default_action(&self, action: SharedAction) -> &Self {
        *self.default_action.write() = action;
        self
    }

    /// Fallback with a fixed status and body.
    pub fn set_default_response(
        &self,
        status: u16,
        body: impl Into<Bytes>,
    ) -> Result<&Self, RuleError> {
        let status = StatusCode::from_u16(status).map_err(|_| RuleError::InvalidStatus(status))?;
        Ok(self.set_default_action(StaticResponse::new(status, body)))
    }

    pub fn default_action(&self) -> SharedAction {
        self.default_action.read().clone()
    }

    /// Read access to the rules in priority order.
    ///
    /// Builders block while the guard is held, so keep it short-lived.
    pub fn rules(&self) -> RwLockReadGuard<'_, Vec<Rule>> {
        self.rules.read()
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    pub fn rule(&self, index: usize) -> Option<RuleSnapshot> {
        self.with_rule(index, |rule| rule.snapshot(index))
    }

    pub fn match_count(&self, index: usize) -> Option<u32> {
        self.with_rule(index, Rule::match_count)
    }

    pub fn snapshot(&self) -> Vec<RuleSnapshot> {
        self.rules
            .read()
            .iter()
            .enumerate()
            .map(|(index, rule)| rule.snapshot(index))
            .collect()
    }

    pub(crate) fn with_rule<R>(&self, index: usize, f: impl FnOnce(&Rule) -> R) -> Option<R> {
        self.rules.read().get(index).map(f)
    }

    pub(crate) fn with_rule_mut(&self, index: usize, f: impl FnOnce(&mut Rule)) {
        if let Some(rule) = self.rules.write().get_mut(index) {
            f(rule);
        }
    }
}
