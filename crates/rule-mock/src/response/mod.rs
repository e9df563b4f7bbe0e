//! Outgoing response types.
//!
//! - `sink` - the buffered [`ResponseSink`] actions write into
//! - `builder` - conversion helpers into hyper responses

mod builder;
mod sink;

pub use builder::{build_response, build_response_with_headers};
pub use sink::ResponseSink;
