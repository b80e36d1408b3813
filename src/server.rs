//! HTTP server collaborator and graceful shutdown.
//!
//! The routing core never touches a socket; this module is the transport
//! collaborator that feeds it. hyper parses the wire, this module shapes a
//! [`Request`], [`Router::dispatch`] decides, and the outcome maps onto
//! status codes: `Unhandled` → 404, an unrecovered handler error → 500, an
//! unknown method → 405 before dispatch is ever consulted.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before SIGKILL. The
//! server reacts by:
//! 1. Immediately stopping `listener.accept()` — no new connections.
//! 2. Letting every in-flight connection task run to completion.
//! 3. Returning from [`Server::serve`], which lets `main` exit cleanly.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::router::{Dispatch, Router};

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Arc so concurrent connection tasks share one routing table.
        // Registrations are sealed the moment serving begins — dispatch is
        // read-only, so no locking.
        let router = Arc::new(router);

        info!(addr = %self.addr, "ruta listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        // Futures must not move in memory after the first poll; tokio::pin!
        // pins the shutdown future on the stack so the loop can re-poll it.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a SIGTERM immediately
                // stops accepting, even with connections queued.
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
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the
                    // hyper IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // The closure runs once per request on the
                        // connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { handle(router, req).await }
                        });

                        // `auto::Builder` handles both HTTP/1.1 and HTTP/2,
                        // whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not
                // grow without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("ruta stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Shapes one hyper request, dispatches it, maps the outcome.
///
/// The error type is [`Infallible`](std::convert::Infallible) — every
/// failure becomes a status code here, hyper never sees an error.
async fn handle(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    // Unknown methods never reach a handler.
    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        return Ok(empty(StatusCode::METHOD_NOT_ALLOWED));
    };

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("body read error: {e}");
            return Ok(empty(StatusCode::BAD_REQUEST));
        }
    };

    let mut request =
        Request::new(method, parts.uri.path().to_owned()).with_body(body.to_vec());
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    let response = match router.dispatch(request).await {
        Ok(Dispatch::Response(res)) => res.into_http(),
        Ok(Dispatch::Unhandled) => empty(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("dispatch error: {e}");
            empty(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response)
}

fn empty(status: StatusCode) -> http::Response<Full<Bytes>> {
    let mut res = http::Response::new(Full::new(Bytes::new()));
    *res.status_mut() = status;
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by the Kubernetes
/// control plane) and **SIGINT** (Ctrl-C, for local dev). On Windows only
/// Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves — on non-Unix platforms the SIGTERM arm
    // is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
