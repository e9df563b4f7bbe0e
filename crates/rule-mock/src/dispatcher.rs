//! First-match rule dispatch.
//!
//! For each request the rules are walked in registration order. The first
//! rule that is active, whose predicates all pass and that can still be
//! claimed answers the request; otherwise the rule set's default action does.
//! Exactly one action runs per request.

use crate::action::SharedAction;
use crate::request::RequestView;
use crate::response::ResponseSink;
use crate::rule::RuleSet;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Which action answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Dispatch {
    /// The rule at this index matched and was claimed.
    Rule(usize),
    /// No rule matched; the default action ran.
    Default,
}

/// Routes requests through a shared [`RuleSet`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    rule_set: Arc<RuleSet>,
}

impl Dispatcher {
    pub fn new(rule_set: Arc<RuleSet>) -> Self {
        Self { rule_set }
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rule_set
    }

    /// Pick the action for `request`, recording the match on the chosen rule.
    ///
    /// A rule whose predicates pass but whose claim fails (its cap was taken
    /// by a concurrent request) is skipped like any inactive rule.
    pub fn select(&self, request: &RequestView) -> (Dispatch, SharedAction) {
        {
            let rules = self.rule_set.rules();
            for (index, rule) in rules.iter().enumerate() {
                if !rule.is_active() || !rule.matches(request) {
                    continue;
                }
                if let Some(action) = rule.try_claim() {
                    return (Dispatch::Rule(index), action);
                }
                debug!("Rule {} matched but its match count is exhausted", index);
            }
        }
        (Dispatch::Default, self.rule_set.default_action())
    }

    /// Select an action and run it to completion against `response`.
    ///
    /// The rule list is not locked while the action runs. Action errors are
    /// returned as-is; the match has already been recorded at that point.
    pub async fn dispatch(
        &self,
        request: &RequestView,
        response: &mut ResponseSink,
    ) -> anyhow::Result<Dispatch> {
        let (outcome, action) = self.select(request);
        match outcome {
            Dispatch::Rule(index) => {
                debug!("{} {} matched rule {}", request.method(), request.url(), index)
            }
            Dispatch::Default => debug!(
                "{} {} matched no rule, using default action",
                request.method(),
                request.url()
            ),
        }
        action.respond(response).await?;
        Ok(outcome)
    }
}
