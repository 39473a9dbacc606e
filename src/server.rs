//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()` — no new connections are made.
//! 2. Letting every in-flight connection task run to completion, for at most
//!    [`ServerConfig::shutdown_timeout`].
//! 3. Returning from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::Error;
use crate::request::Request;
use crate::response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called. An unparsable address is reported by `serve`.
    ///
    /// ```rust,no_run
    /// use tsu_typed::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        Self::with_config(ServerConfig::builder().addr(addr).build())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by in-flight requests completing or timing out).
    pub async fn serve(self, router: impl Into<Router>) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `shutdown` resolves
    /// instead of on a process signal.
    pub async fn serve_with_shutdown(
        self,
        router: impl Into<Router>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        let router = Arc::new(router.into());

        info!(addr = %addr, "tsu listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting at once,
                // even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req).await }
                        });

                        // HTTP/1.1 or HTTP/2, whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        let drained = tokio::time::timeout(self.config.shutdown_timeout(), async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(abandoned = tasks.len(), "shutdown timeout reached, aborting connections");
            tasks.abort_all();
        }

        info!("tsu stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: decodes one request, routes it, produces one response.
///
/// Infallible: every failure becomes a response, so hyper never sees one.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let res = match decode(req).await {
        Ok(req) => router.handle(req).await,
        Err(e) => response::bad_request(&e),
    };
    Ok(res.into_http())
}

async fn decode(req: hyper::Request<Incoming>) -> Result<Request, Error> {
    let (parts, body) = req.into_parts();
    let bytes = body.collect().await?.to_bytes();
    let path = parts.uri.path().to_owned();
    Request::from_parts(parts.method, path, parts.uri.query(), parts.headers, bytes)
}


// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. A handler that cannot be installed
/// is logged and never fires.
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
            Ok(mut signal) => {
                signal.recv().await;
            }
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
