//! In-process hosting of a [`RuleSet`](crate::rule::RuleSet).
//!
//! This module provides:
//! - `TestServer`: owns the shared rule set and spawns listeners serving it
//! - `ServerHandle`: a running listener; stops when dropped
//!
//! Every spawned listener dispatches through the same rule set, so rules
//! added after a spawn are visible to it immediately.
//!
//! ## Module Structure
//!
//! - `handler`: per-request HTTP handling
//! - `core`: `TestServer` and `ServerHandle`

mod core;
mod handler;

pub use self::core::{ServerHandle, TestServer};
pub use self::handler::MAX_REQUEST_BODY_BYTES;
