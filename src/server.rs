//! HTTP server and graceful shutdown.
//!
//! The server is a thin host adapter: it decodes each hyper request into a
//! [`Request`], runs it through the [`Router`] and encodes the [`Response`].
//! Route trees are synchronous, so a dispatch runs to completion on the
//! connection task once the body has been read.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server:
//! 1. stops calling `listener.accept()`,
//! 2. lets every in-flight connection task run to completion,
//! 3. returns from [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use sendero::Server;
    /// let server = Server::bind(([127, 0, 0, 1], 3000).into());
    /// ```
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of waiting for a process signal.
    pub async fn serve_with_shutdown<S>(self, router: Router, signal: S) -> Result<(), Error>
    where
        S: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;
        run(listener, router, signal).await;
        Ok(())
    }
}

async fn run<S>(listener: TcpListener, router: Router, signal: S)
where
    S: Future<Output = ()>,
{
    let router = Arc::new(router);
    match listener.local_addr() {
        Ok(addr) => info!(%addr, "sendero listening"),
        Err(e) => warn!("listening on an unknown address: {e}"),
    }

    let mut tasks = tokio::task::JoinSet::new();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Shutdown first, so a signal stops accepting even with
            // connections still queued.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
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
                        async move { dispatch(&router, req).await }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        error!(%peer, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
    info!("sendero stopped");
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one hyper request. Every failure becomes a status code, so hyper
/// never sees an error.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let response = match into_request(req).await {
        Ok(request) => respond(router, &request),
        Err(status) => Response::with_status(status),
    };
    Ok(response.into_inner())
}

async fn into_request(req: hyper::Request<Incoming>) -> Result<Request, StatusCode> {
    let (parts, body) = req.into_parts();

    let method = Method::try_from(&parts.method).map_err(|()| {
        info!(method = %parts.method, "unsupported method, answering 405");
        StatusCode::METHOD_NOT_ALLOWED
    })?;
    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let mut request = Request::new(method, target);

    for (name, value) in &parts.headers {
        match value.to_str() {
            Ok(value) => request.headers.push((name.as_str().to_owned(), value.to_owned())),
            Err(_) => warn!(header = %name, "skipping header that is not visible ASCII"),
        }
    }
    // HTTP/2 carries the host in the `:authority` pseudo-header instead.
    if request.header("host").is_none() {
        if let Some(authority) = parts.uri.authority() {
            request.headers.push(("host".to_owned(), authority.as_str().to_owned()));
        }
    }

    request.body = body
        .collect()
        .await
        .map_err(|e| {
            warn!("failed to read request body: {e}");
            StatusCode::BAD_REQUEST
        })?
        .to_bytes();

    Ok(request)
}

/// Runs the router and turns a failed dispatch into a 500.
fn respond(router: &Router, request: &Request) -> Response {
    match router.call(request) {
        Ok(res) => res,
        Err(e) if e.is_config() => {
            error!(method = %request.method(), path = request.path(), "route tree misconfigured: {e}");
            Response::with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            error!(method = %request.method(), path = request.path(), "route failed: {e}");
            Response::with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C the process receives.
///
/// A handler that cannot be installed is logged and that arm never fires.
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
            Ok(mut sig) => {
                sig.recv().await;
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
