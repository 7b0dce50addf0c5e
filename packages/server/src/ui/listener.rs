//! TCP listener that keeps serving through accept failures.

use std::{io, net::SocketAddr, time::Duration};

use axum::serve::Listener;
use tokio::net::{TcpListener, TcpStream};

/// Pause before retrying after a resource error such as running out of file
/// descriptors, so the accept loop does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Wraps a [`TcpListener`] for `axum::serve`.
///
/// A failed accept is logged and retried. It never ends the server and never
/// touches connections that are already registered.
#[derive(Debug)]
pub struct RelayListener {
    inner: TcpListener,
}

impl RelayListener {
    pub fn new(inner: TcpListener) -> Self {
        Self { inner }
    }

    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self::new(TcpListener::bind(addr).await?))
    }
}

impl Listener for RelayListener {
    type Io = TcpStream;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.inner.accept().await {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!(peer = %peer, "failed to set TCP_NODELAY: {}", e);
                    }
                    return (stream, peer);
                }
                Err(e) if is_connection_error(&e) => {
                    tracing::warn!(error = %e, "accept failed; peer went away during handshake");
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed; retrying");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
