//! Request handling for a spawned listener.

use crate::dispatcher::{Dispatch, Dispatcher};
use crate::request::RequestView;
use crate::response::{build_response, build_response_with_headers, ResponseSink};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, warn};

/// Largest request body a listener reads before answering 413.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// State shared by every connection of one listener.
#[derive(Debug)]
pub(crate) struct ServeState {
    pub dispatcher: Dispatcher,
    pub local_addr: SocketAddr,
    pub catch_all: bool,
    pub request_count: AtomicU64,
}

/// Dispatch one request through the rule set.
///
/// Bodies over [`MAX_REQUEST_BODY_BYTES`] are refused with a 413 before any
/// rule is consulted. Only `/` is routed to the rules unless `catch_all` is set; other paths get
/// a bare 404. A failing action is reported as a 500.
pub(crate) async fn handle_request(
    req: Request<Incoming>,
    state: &ServeState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let (parts, body) = req.into_parts();

    // Drain the body so keep-alive connections stay usable
    if let Err(e) = Limited::new(body, MAX_REQUEST_BODY_BYTES).collect().await {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            warn!(
                "Request body for {} {} exceeds {} bytes",
                parts.method, parts.uri, MAX_REQUEST_BODY_BYTES
            );
            return Ok(build_response(StatusCode::PAYLOAD_TOO_LARGE, Bytes::new()));
        }
        debug!("Failed to read request body: {}", e);
    }

    if !state.catch_all && parts.uri.path() != "/" {
        debug!("No route for {} {}", parts.method, parts.uri);
        return Ok(build_response(StatusCode::NOT_FOUND, Bytes::new()));
    }

    let request = RequestView::from_parts(&parts, state.local_addr);
    let mut sink = ResponseSink::new();

    match state.dispatcher.dispatch(&request, &mut sink).await {
        Ok(Dispatch::Rule(index)) => {
            debug!("Rule {} answered with {}", index, sink.status());
            Ok(sink.into_response())
        }
        Ok(Dispatch::Default) => Ok(sink.into_response()),
        Err(e) => {
            error!("Action for {} {} failed: {:#}", request.method(), request.url(), e);
            Ok(build_response_with_headers(
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("Action failed: {e}"),
            ))
        }
    }
}
