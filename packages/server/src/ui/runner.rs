//! Server startup and shutdown.

use std::{future::Future, io, sync::Arc};

use axum::{Router, routing::get};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::usecase::DisconnectPeerUseCase;

use super::{
    config::ServerConfig, handler::websocket_handler, listener::RelayListener,
    signal::shutdown_signal, state::AppState,
};

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The server loop exited with an I/O error
    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Build the router: the WebSocket upgrade on `/` is the only surface.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to the configured address and serve until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.socket_addr();
    let listener = RelayListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let state = Arc::new(AppState::in_memory(config.outbound_capacity));
    serve(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// New connections stop being accepted once `shutdown` resolves; the
/// registry is then drained so every open connection receives a Close frame.
pub async fn serve<F>(
    listener: RelayListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = axum::serve::Listener::local_addr(&listener) {
        tracing::info!(
            "relay listening on ws://{} (outbound capacity {})",
            addr,
            state.outbound_capacity
        );
    }

    // Upgraded sockets are closed by draining, so graceful shutdown has
    // nothing left to wait on
    let drain_state = state.clone();
    let shutdown = async move {
        shutdown.await;
        disconnect_all(&drain_state).await;
    };

    let app = build_app(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // Catch connections accepted while the first drain was running
    disconnect_all(&state).await;

    tracing::info!("relay stopped");
    Ok(())
}

async fn disconnect_all(state: &AppState) {
    let disconnect_usecase =
        DisconnectPeerUseCase::new(state.registry.clone(), state.events.clone());
    disconnect_usecase.drain().await;
}
