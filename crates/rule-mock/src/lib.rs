//! Programmable in-process HTTP mock endpoint.
//!
//! Tests register an ordered list of rules on a [`RuleSet`]. Each rule is a
//! chain of request predicates plus a response action; the first active rule
//! whose predicates all pass answers the request, otherwise the set's
//! default action does.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use rule_mock::TestServer;
//!
//! let server = TestServer::new();
//! server
//!     .rule_set()
//!     .create_rule()
//!     .when_url_match(r"\?id=1")?
//!     .set_ok_response("first rule matched")
//!     .set_max_match_count(1)
//!     .add_rule()?
//!     .when_get()
//!     .set_bad_request_default();
//!
//! let client = server.create_client().await?;
//! let response = client.get("?id=1").send().await?;
//! assert_eq!(response.text().await?, "first rule matched");
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod predicate;
pub mod request;
pub mod response;
pub mod rule;
pub mod server;

pub use action::{Action, FnAction, SharedAction, StaticResponse};
pub use client::TestClient;
pub use config::Config;
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{RuleError, ServerError};
pub use predicate::Predicate;
pub use request::RequestView;
pub use response::ResponseSink;
pub use rule::{Rule, RuleBuilder, RuleSet, RuleSnapshot};
pub use server::{ServerHandle, TestServer};
