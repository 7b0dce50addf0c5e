//! Lifecycle events observable by collaborators of the relay.

use serde::Serialize;

use super::value_object::{ConnectionId, Payload, Timestamp};

/// Why a connection left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseReason {
    /// The peer closed the transport, or the transport failed
    PeerClosed,
    /// A send during a broadcast found the connection torn down
    SendFailed,
    /// The bounded outbound queue overflowed
    QueueOverflow,
    /// The relay is shutting down
    Shutdown,
}

/// Event emitted by the relay for each lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelayEvent {
    ConnectionOpened {
        connection_id: ConnectionId,
        connected_at: Timestamp,
    },
    MessageReceived {
        originator: ConnectionId,
        payload: Payload,
    },
    ConnectionClosed {
        connection_id: ConnectionId,
        reason: CloseReason,
    },
}
