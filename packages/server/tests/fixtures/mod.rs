//! Test fixtures: an in-process relay on an ephemeral port and a small
//! WebSocket client wrapper.

#![allow(dead_code)]

use std::{net::SocketAddr, num::NonZeroUsize, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use solace_server::ui::{RelayListener, ServerError, serve, state::AppState};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    addr: SocketAddr,
    pub state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_capacity(64).await
    }

    pub async fn with_capacity(outbound_capacity: usize) -> Self {
        let listener = RelayListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .expect("Failed to bind test listener");
        let addr = axum::serve::Listener::local_addr(&listener).expect("Failed to get local addr");
        let capacity = NonZeroUsize::new(outbound_capacity).expect("capacity must be at least 1");
        let state = Arc::new(AppState::in_memory(capacity));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(serve(listener, state.clone(), async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Connect a client and wait until the relay has registered it.
    pub async fn connect(&self) -> TestClient {
        let before = self.state.registry.count().await;
        let (ws, _) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect");
        self.wait_for_connections(before + 1).await;
        TestClient { ws }
    }

    pub async fn wait_for_connections(&self, expected: usize) {
        tokio::time::timeout(TIMEOUT, async {
            while self.state.registry.count().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("registry never reached {expected} connections"));
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let handle = self.handle.take().expect("server already stopped");
        tokio::time::timeout(TIMEOUT, handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .expect("Failed to send text");
    }

    /// Send a text frame, reporting whether the transport accepted it.
    pub async fn try_send_text(&mut self, text: &str) -> bool {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .is_ok()
    }

    /// Keep writing until the relay's side of the connection is gone.
    /// Returns `false` if every write still succeeds at the timeout.
    pub async fn wait_write_rejected(&mut self) -> bool {
        tokio::time::timeout(TIMEOUT, async {
            while self.try_send_text("are you there?").await {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .is_ok()
    }

    pub async fn send_binary(&mut self, data: &[u8]) {
        self.ws
            .send(Message::Binary(data.to_vec().into()))
            .await
            .expect("Failed to send binary");
    }

    /// Next text frame, skipping control frames.
    pub async fn recv_text(&mut self) -> String {
        tokio::time::timeout(TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    other => panic!("expected text frame, got {other:?}"),
                }
            }
        })
        .await
        .expect("timed out waiting for text frame")
    }

    /// Read until the stream ends, returning any text frames seen on the way.
    pub async fn recv_until_closed(&mut self) -> Vec<String> {
        let mut texts = Vec::new();
        let _ = tokio::time::timeout(TIMEOUT, async {
            while let Some(frame) = self.ws.next().await {
                match frame {
                    Ok(Message::Text(text)) => texts.push(text.as_str().to_string()),
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        texts
    }

    /// Whether a Close frame (or end of stream) arrives before the timeout.
    pub async fn wait_closed(&mut self) -> bool {
        tokio::time::timeout(TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await
        .unwrap_or(false)
    }

    pub async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
