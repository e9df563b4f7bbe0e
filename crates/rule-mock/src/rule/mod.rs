//! Rules and rule sets.
//!
//! A [`Rule`] is an ordered predicate chain, one response action and an
//! optional cap on how often it may fire. Rules live in a [`RuleSet`] in
//! registration order, which is also their match priority.
//!
//! ## Module Structure
//!
//! - `builder`: fluent [`RuleBuilder`] returned by `RuleSet::create_rule`
//! - `set`: the [`RuleSet`] collection and its fallback action

mod builder;
mod set;


pub use builder::RuleBuilder;
pub use set::RuleSet;

use crate::action::SharedAction;
use crate::predicate::{all_match, Predicate};
use crate::request::RequestView;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// One entry of a [`RuleSet`].
///
/// Configuration is only reachable through [`RuleBuilder`]; the match
/// counter is only advanced through [`Rule::try_claim`].
#[derive(Default)]
pub struct Rule {
    predicates: Vec<Predicate>,
    action: Option<SharedAction>,
    max_match_count: Option<u32>,
    match_count: AtomicU32,
}

impl Rule {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn max_match_count(&self) -> Option<u32> {
        self.max_match_count
    }

    pub fn match_count(&self) -> u32 {
        self.match_count.load(Ordering::Acquire)
    }

    /// Has an action and has not reached its cap.
    pub fn is_active(&self) -> bool {
        self.action.is_some()
            && self
                .max_match_count
                .map_or(true, |max| self.match_count() < max)
    }

    /// Every predicate passes; vacuously true with no predicates.
    pub fn matches(&self, request: &RequestView) -> bool {
        all_match(&self.predicates, request)
    }

    /// Atomically check activity and record one match.
    ///
    /// Returns the action to run when the claim succeeds. A claim fails when
    /// the rule has no action or when the cap was reached, including when a
    /// concurrent request took the last slot between `is_active` and here.
    pub fn try_claim(&self) -> Option<SharedAction> {
        let action = self.action.as_ref()?;
        let max = self.max_match_count;
        self.match_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| match max {
                Some(max) if count >= max => None,
                _ => Some(count.saturating_add(1)),
            })
            .ok()?;
        Some(Arc::clone(action))
    }

    pub fn snapshot(&self, index: usize) -> RuleSnapshot {
        RuleSnapshot {
            index,
            predicates: self
                .predicates
                .iter()
                .map(|p| p.description().to_string())
                .collect(),
            has_action: self.has_action(),
            match_count: self.match_count(),
            max_match_count: self.max_match_count,
            active: self.is_active(),
        }
    }

    pub(crate) fn push_predicate(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub(crate) fn set_action(&mut self, action: SharedAction) {
        self.action = Some(action);
    }

    pub(crate) fn set_max_match_count(&mut self, max: Option<u32>) {
        self.max_match_count = max;
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("predicates", &self.predicates)
            .field("has_action", &self.has_action())
            .field("max_match_count", &self.max_match_count)
            .field("match_count", &self.match_count())
            .finish()
    }
}

/// Read-only view of a rule for inspection and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSnapshot {
    pub index: usize,
    pub predicates: Vec<String>,
    pub has_action: bool,
    pub match_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_match_count: Option<u32>,
    pub active: bool,
}
