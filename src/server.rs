//! HTTP server and graceful shutdown.
//!
//! Each accepted connection is served on its own task and registered with a
//! shutdown watcher. On SIGTERM or Ctrl-C the server:
//! 1. stops accepting,
//! 2. tells every open connection to finish its current request and close
//!    (idle keep-alive connections close at once),
//! 3. waits for them, up to the drain timeout, then returns from
//!    [`Server::serve`].
//!
//! Keep the drain timeout below the orchestrator's grace period
//! (Kubernetes' `terminationGracePeriodSeconds`, 30 s by default).

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(25);

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    drain_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use wayfarer::Server;
    ///
    /// let server = Server::bind("0.0.0.0:3000").drain_timeout(Duration::from_secs(10));
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    /// How long shutdown waits for open connections before dropping them.
    /// Defaults to 25 s.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns after a shutdown signal once every connection has closed or
    /// the drain timeout has elapsed.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);
        let http = ConnBuilder::new(TokioExecutor::new());
        let watcher = GracefulShutdown::new();
        let open = Arc::new(AtomicUsize::new(0));

        info!(addr = %self.addr, drain_timeout = ?self.drain_timeout, "wayfarer listening");

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                biased;
                () = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("accept error: {e}");
                        continue;
                    }
                },
            };

            let svc = service_fn({
                let router = Arc::clone(&router);
                move |req| dispatch(Arc::clone(&router), req, peer)
            });
            let conn = watcher.watch(http.serve_connection(TokioIo::new(stream), svc).into_owned());
            let tracked = OpenConnection::track(&open);

            tokio::spawn(async move {
                debug!(%peer, open = tracked.count(), "connection opened");
                if let Err(e) = conn.await {
                    warn!(%peer, "connection error: {e}");
                }
                drop(tracked);
                debug!(%peer, "connection closed");
            });
        }

        drop(listener);
        info!(open = open.load(Ordering::Relaxed), "shutdown signal received, draining connections");

        tokio::select! {
            () = watcher.shutdown() => info!("all connections drained"),
            () = tokio::time::sleep(self.drain_timeout) => {
                warn!(abandoned = open.load(Ordering::Relaxed), "drain timeout elapsed, dropping connections");
            }
        }

        info!("wayfarer stopped");
        Ok(())
    }
}

/// Counts a connection as open until dropped.
struct OpenConnection(Arc<AtomicUsize>);

impl OpenConnection {
    fn track(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(open))
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

impl Drop for OpenConnection {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads one request off the wire and runs it through the router.
///
/// Never fails towards hyper: an unreadable body answers `400`.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let response = match read_request(req).await {
        Ok(req) => router.call(req).await,
        Err(e) => {
            warn!(peer = %remote_addr, "{e}");
            Response::status(StatusCode::BAD_REQUEST)
        }
    };
    Ok(response.into_inner())
}

async fn read_request(req: hyper::Request<Incoming>) -> Result<Request, Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();
    Ok(Request::from_parts(parts, body))
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
