//! Domain layer error definitions.

use thiserror::Error;

use super::{entity::ConnectionState, value_object::ConnectionId};

/// Rejected lifecycle transition
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid connection state transition: {from} -> {to}")]
pub struct ConnectionStateError {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Errors related to the connection registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The identity is already registered
    #[error("connection '{0}' is already registered")]
    DuplicateIdentity(ConnectionId),

    /// The connection cannot be opened from its current state
    #[error(transparent)]
    InvalidState(#[from] ConnectionStateError),
}

/// Per-connection send failure during a broadcast
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The outbound side of the connection has been torn down
    #[error("connection is closed")]
    Closed,

    /// The bounded outbound queue is full
    #[error("outbound queue is full")]
    QueueFull,
}
