//! The accept loop and per-connection HTTP/1.1 framing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};

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
}

/// Largest request (head plus body) a connection will buffer.
const MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

const INITIAL_BUF_SIZE: usize = 4096;

/// A bound listener that hands each request to a handler.
///
/// ```rust,no_run
/// use quiz_server::server::Server;
/// use quiz_server::http::{Response, StatusCode};
///
/// # async fn serve() -> Result<(), quiz_server::ServerError> {
/// let server = Server::bind("127.0.0.1:0").await?;
/// println!("listening on {}", server.local_addr());
/// server
///     .run(|req| async move {
///         let status = if req.path() == "/quiz" { StatusCode::Ok } else { StatusCode::NotFound };
///         Response::new(status)
///     })
///     .await
/// # }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds `addr`; port `0` picks a free port, see [`local_addr`](Self::local_addr).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
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
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves forever. Each connection runs on its own task.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        self.run_until(handler, std::future::pending()).await
    }

    /// Serves until `shutdown` resolves. Open connections are left to finish.
    pub async fn run_until<H, F, S>(self, handler: H, shutdown: S) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
        S: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "quiz server listening");

        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                () = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

// Serves requests off one connection until the peer closes it or a response
// goes out with `Connection: close`. Pipelined requests already in `buf` are
// served before the next read.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        if buf.is_empty() || !has_complete_request(&buf) {
            let bytes_read = stream.read_buf(&mut buf).await?;
            if bytes_read == 0 {
                debug!(peer = %peer_addr, "connection closed by peer");
                break;
            }
        }

        if buf.len() > MAX_REQUEST_SIZE {
            warn!(peer = %peer_addr, buffered = buf.len(), "request too large, sending 413");
            reject(&mut stream, StatusCode::PayloadTooLarge, "Request entity too large").await?;
            break;
        }

        let (request, body_offset) = match Request::parse(&buf) {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => continue,
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request, sending 400");
                reject(&mut stream, StatusCode::BadRequest, format!("Bad Request: {e}")).await?;
                break;
            }
        };

        let Some(total_needed) = request_end(&request, body_offset) else {
            warn!(
                peer = %peer_addr,
                content_length = ?request.content_length(),
                "declared body too large, sending 413"
            );
            reject(&mut stream, StatusCode::PayloadTooLarge, "Request entity too large").await?;
            break;
        };

        if buf.len() < total_needed {
            continue;
        }

        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = handler(request).await.keep_alive(keep_alive);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        let _ = buf.split_to(total_needed);

        if !keep_alive {
            debug!(peer = %peer_addr, "client asked to close");
            break;
        }
    }

    Ok(())
}

async fn reject(stream: &mut TcpStream, status: StatusCode, reason: impl Into<String>) -> std::io::Result<()> {
    let response = Response::new(status).body(reason).keep_alive(false);
    stream.write_all(&response.into_bytes()).await
}

// Offset one past the request's body, or `None` when the declared length
// cannot fit in `MAX_REQUEST_SIZE`.
fn request_end(request: &Request, body_offset: usize) -> Option<usize> {
    body_offset
        .checked_add(request.content_length().unwrap_or(0))
        .filter(|end| *end <= MAX_REQUEST_SIZE)
}

// True when `buf` starts with a request whose headers and body are fully buffered.
fn has_complete_request(buf: &[u8]) -> bool {
    match Request::parse(buf) {
        // An oversized declaration is rejected without reading the body.
        Ok((request, body_offset)) => {
            request_end(&request, body_offset).is_none_or(|end| buf.len() >= end)
        }
        // Malformed input is complete enough to be rejected without reading more.
        Err(RequestError::Incomplete) => false,
        Err(_) => true,
    }
}
