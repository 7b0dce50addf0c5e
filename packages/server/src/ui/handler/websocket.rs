//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, ConnectionId, ConnectionIdFactory, Payload, Timestamp},
    ui::state::AppState,
    usecase::{BroadcastMessageUseCase, ConnectPeerUseCase, DisconnectPeerUseCase},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();

    // Bounded outbound queue; the registry entry owns the only sender
    let (tx, mut rx) = mpsc::channel::<Payload>(state.outbound_capacity.get());
    let connection = Connection::new(connection_id.clone(), tx, Timestamp::now());
    let close_signal = connection.close_signal();

    let connect_usecase = ConnectPeerUseCase::new(state.registry.clone(), state.events.clone());
    if let Err(e) = connect_usecase.execute(connection).await {
        // Identities are generated per accept, so this is a bug, not a peer error
        tracing::warn!(connection_id = %connection_id, "ignoring connection: {}", e);
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    let recv_connection_id = connection_id.clone();
    let recv_state = state.clone();

    // Spawn a task to receive messages from this peer
    let mut recv_task = tokio::spawn(async move {
        let broadcast_usecase = BroadcastMessageUseCase::new(
            recv_state.registry.clone(),
            recv_state.events.clone(),
        );

        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(connection_id = %recv_connection_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!(
                        connection_id = %recv_connection_id,
                        bytes = text.as_str().len(),
                        "received text"
                    );
                    broadcast_usecase
                        .execute(&recv_connection_id, Payload::from(text.as_str()))
                        .await;
                }
                Message::Binary(data) => {
                    tracing::debug!(
                        connection_id = %recv_connection_id,
                        bytes = data.len(),
                        "ignoring binary frame"
                    );
                }
                Message::Close(_) => {
                    tracing::info!(connection_id = %recv_connection_id, "peer requested close");
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // Spawn a task to forward queued payloads to this peer
    let send_connection_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(payload.as_str().to_owned().into())).await {
                tracing::debug!(connection_id = %send_connection_id, "send failed: {}", e);
                return;
            }
        }
        // Every sender is gone: drained for shutdown
        let _ = sender.send(Message::Close(None)).await;
    });

    // If any one of the tasks completes, abort the other. Removal from the
    // registry aborts both, dropping the socket without flushing the backlog.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
        _ = close_signal.wait() => {
            tracing::info!(connection_id = %connection_id, "connection removed, dropping socket");
            recv_task.abort();
            send_task.abort();
        }
    };

    on_transport_closed(&state, &connection_id).await;
}

/// Remove the connection after its transport closed. Safe to reach more than
/// once for the same connection.
async fn on_transport_closed(state: &AppState, connection_id: &ConnectionId) {
    let disconnect_usecase =
        DisconnectPeerUseCase::new(state.registry.clone(), state.events.clone());
    disconnect_usecase.execute(connection_id).await;
}
