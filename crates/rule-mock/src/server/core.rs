//! TestServer and ServerHandle.

use super::handler::{handle_request, ServeState};
use crate::client::TestClient;
use crate::config::{Config, ListenConfig};
use crate::dispatcher::Dispatcher;
use crate::error::{RuleError, ServerError};
use crate::rule::RuleSet;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

/// Owns a [`RuleSet`] and serves it on demand.
///
/// ```no_run
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use rule_mock::TestServer;
///
/// let server = TestServer::new();
/// server.rule_set().create_rule().when_get().set_ok_response("[1,2]");
///
/// let client = server.create_client().await?;
/// let body = client.get("/").send().await?.text().await?;
/// assert_eq!(body, "[1,2]");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TestServer {
    rule_set: Arc<RuleSet>,
    listen: ListenConfig,
    catch_all: bool,
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServer {
    /// Empty rule set, loopback, ephemeral port, root path only.
    pub fn new() -> Self {
        Self {
            rule_set: Arc::new(RuleSet::new()),
            listen: ListenConfig::default(),
            catch_all: false,
        }
    }

    /// Build a server from a config, compiling its rules.
    pub fn from_config(config: &Config) -> Result<Self, RuleError> {
        Ok(Self {
            rule_set: Arc::new(config.build_rule_set()?),
            listen: config.listen.clone(),
            catch_all: config.catch_all,
        })
    }

    /// Dispatch requests for every path, not only `/`.
    pub fn with_catch_all(mut self, catch_all: bool) -> Self {
        self.catch_all = catch_all;
        self
    }

    /// The rule set every spawned listener dispatches through.
    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rule_set
    }

    /// Bind the configured address and start serving in the background.
    pub async fn spawn(&self) -> Result<ServerHandle, ServerError> {
        let addr = self.listen.socket_addr().await?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(addr, e))?;

        info!("Rule mock listening on http://{}", local_addr);

        let state = Arc::new(ServeState {
            dispatcher: Dispatcher::new(Arc::clone(&self.rule_set)),
            local_addr,
            catch_all: self.catch_all,
            request_count: AtomicU64::new(0),
        });

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let serve_state = Arc::clone(&state);

        let task = tokio::spawn(async move {
            let mut connections = JoinSet::new();
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                connections.spawn(serve_connection(
                                    stream,
                                    Arc::clone(&serve_state),
                                    shutdown_rx.clone(),
                                ));
                            }
                            Err(e) => {
                                error!("Accept error on {}: {}", local_addr, e);
                            }
                        }
                    }
                    Some(_) = connections.join_next(), if !connections.is_empty() => {}
                    _ = shutdown_rx.changed() => {
                        info!("Rule mock on {} shutting down", local_addr);
                        break;
                    }
                }
            }
            drop(listener);
            // Connections see the same signal and close once idle
            while connections.join_next().await.is_some() {}
        });

        Ok(ServerHandle {
            addr: local_addr,
            state,
            shutdown_tx,
            task: Some(task),
        })
    }

    /// Spawn a listener and return a client bound to it.
    ///
    /// The listener lives as long as the client.
    pub async fn create_client(&self) -> Result<TestClient, ServerError> {
        TestClient::new(self.spawn().await?)
    }
}

/// Serve one connection until it ends or shutdown is signalled.
///
/// On shutdown an in-flight request is allowed to finish; an idle keep-alive
/// connection is closed right away.
async fn serve_connection(
    stream: TcpStream,
    state: Arc<ServeState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let local_addr = state.local_addr;
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| {
        let state = Arc::clone(&state);
        async move { handle_request(req, &state).await }
    });
    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = async { let _ = shutdown_rx.wait_for(|stopped| *stopped).await; } => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(e) = result {
        debug!("Connection error on {}: {}", local_addr, e);
    }
}

/// A running listener. Dropping it stops accepting new connections and
/// closes open connections once their current request is answered.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    state: Arc<ServeState>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://{addr}` without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received by this listener, routed or not.
    pub fn request_count(&self) -> u64 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        self.state.dispatcher.rule_set()
    }

    /// Stop accepting connections and wait until every open connection has
    /// been closed.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Accept loop on {} ended abnormally: {}", self.addr, e);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
