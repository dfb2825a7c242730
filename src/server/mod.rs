//! Async TCP server using Tokio, the transport adapter in front of [`Router`].
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler function,
//! usually [`Router::handle`] via [`Server::serve`]. Requests on one connection are
//! dispatched one after another on that connection's task, so the request context
//! bound for one request is gone before the next one is read.
//! Supports HTTP/1.1 persistent connections (keep-alive) out of the box.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigError};
use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};
use crate::router::Router;

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The waymark HTTP server.
///
/// Binds to a TCP address and dispatches incoming HTTP/1.1 requests to a
/// handler function.
///
/// # Examples
///
/// ```rust,no_run
/// use waymark::Router;
/// use waymark::router::Effect;
/// use waymark::server::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let router = Router::new();
///     router.get("/", |_ctx| async { Ok(Effect::body("Hello!")) })?;
///
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.serve(router).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<Config>,
}

impl Server {
    /// Binds the server to the given TCP address with the default [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        Self::bind_with(addr, Config::default()).await
    }

    /// Binds the server with explicit limits.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `config` fails validation, or
    /// [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind_with(addr: impl AsRef<str>, config: Config) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            config: Arc::new(config),
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves `router` until the listener fails.
    ///
    /// Every request goes through [`Router::handle`]: unmatched requests get
    /// `404 Not Found`, failed dispatches `500 Internal Server Error`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn serve(self, router: Router) -> Result<(), ServerError> {
        self.run(move |request| {
            let router = router.clone();
            async move { router.handle(request).await }
        })
        .await
    }

    /// Starts accepting connections and dispatching requests to `handler`.
    ///
    /// The handler receives a [`Request`] and must return a [`Future`] that
    /// resolves to a [`Response`]. The handler is wrapped in an [`Arc`] and
    /// shared across all spawned Tokio tasks, so it must be `Send + Sync + 'static`.
    ///
    /// This method runs until the process is terminated or an unrecoverable
    /// listener error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "waymark listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);
            let config = Arc::clone(&self.config);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler, &config).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Handles a single TCP connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: we loop, serving every
/// complete request already buffered before reading more, until the peer
/// closes the connection or signals `Connection: close`.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
    config: &Config,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(config.initial_buffer_size);

    loop {
        // Guard against excessively large requests.
        if buf.len() > config.max_request_size {
            warn!(peer = %peer_addr, "request too large — sending 413");
            return reject_too_large(&mut stream).await;
        }

        // Attempt to parse the buffered data as an HTTP request.
        let parsed = if buf.is_empty() {
            Err(RequestError::Incomplete)
        } else {
            Request::parse(&buf)
        };

        let (request, body_offset) = match parsed {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => {
                // Headers not yet fully received — read more data.
                if stream.read_buf(&mut buf).await? == 0 {
                    debug!(peer = %peer_addr, "connection closed by peer");
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request — sending 400");
                let response = Response::new(StatusCode::BadRequest)
                    .body(format!("Bad Request: {e}"))
                    .keep_alive(false);
                stream.write_all(&response.into_bytes()).await?;
                break;
            }
        };

        // Wait for the full body to arrive if Content-Length is set.
        let content_length = request.content_length().unwrap_or(0);
        let total_needed = body_offset.saturating_add(content_length);
        if total_needed > config.max_request_size {
            warn!(peer = %peer_addr, content_length, "declared body too large — sending 413");
            return reject_too_large(&mut stream).await;
        }
        if buf.len() < total_needed {
            if stream.read_buf(&mut buf).await? == 0 {
                debug!(peer = %peer_addr, "connection closed mid-body");
                break;
            }
            continue;
        }

        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = handler(request).await;
        stream
            .write_all(&response.keep_alive(keep_alive).into_bytes())
            .await?;
        stream.flush().await?;

        // Drop the consumed request bytes from the buffer.
        let _ = buf.split_to(total_needed);

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close — shutting down");
            break;
        }
    }

    Ok(())
}

async fn reject_too_large(stream: &mut TcpStream) -> Result<(), std::io::Error> {
    let response = Response::new(StatusCode::PayloadTooLarge)
        .body("Request entity too large")
        .keep_alive(false);
    stream.write_all(&response.into_bytes()).await
}
