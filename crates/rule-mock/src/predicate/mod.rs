//! Request predicates.
//!
//! A [`Predicate`] is a pure boolean test over a [`RequestView`]. Rules hold
//! an ordered list of them and match only when every one passes; there is no
//! OR combinator, alternation is expressed by registering several rules.
//!
//! # Module Structure
//!
//! - `builtin` - method, URL regex, header and authorization predicates

mod builtin;

use crate::request::RequestView;
use std::fmt;
use std::sync::Arc;

pub use builtin::{authorization_matches, header_matches, method_is, url_matches};

type CheckFn = dyn Fn(&RequestView) -> bool + Send + Sync;

/// A named, stateless test over a request snapshot.
#[derive(Clone)]
pub struct Predicate {
    description: String,
    check: Arc<CheckFn>,
}

impl Predicate {
    /// Wrap an arbitrary check. The description is used in logs and rule
    /// snapshots only.
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&RequestView) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    pub fn evaluate(&self, request: &RequestView) -> bool {
        (self.check)(request)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.description).finish()
    }
}

/// Evaluate predicates in order with short-circuit AND.
///
/// An empty list matches every request.
pub fn all_match(predicates: &[Predicate], request: &RequestView) -> bool {
    predicates.iter().all(|p| p.evaluate(request))
}
