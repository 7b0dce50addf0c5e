//! Core domain models for the relay.

use std::{fmt, sync::Arc};

use tokio::sync::{
    Notify,
    mpsc::{self, error::TrySendError},
};

use super::{
    error::{ConnectionStateError, SendFailure},
    value_object::{ConnectionId, Payload, Timestamp},
};

/// Lifecycle state of a peer connection.
///
/// `Connecting -> Open -> Closing -> Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Open)
                | (Connecting, Closed)
                | (Open, Closing)
                | (Open, Closed)
                | (Closing, Closed)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Fired when the relay removes a connection from the registry.
///
/// The socket handler waits on it so a connection evicted by a broadcast is
/// torn down at once, without flushing its backlog. A signal fired before
/// anyone waits is kept until the next [`CloseSignal::wait`].
#[derive(Debug, Clone, Default)]
pub struct CloseSignal(Arc<Notify>);

impl CloseSignal {
    /// Resolve once the connection has been closed by the relay.
    pub async fn wait(&self) {
        self.0.notified().await;
    }

    fn fire(&self) {
        self.0.notify_one();
    }
}

/// One peer's transport session as seen by the relay.
///
/// Holds the sending half of the connection's bounded outbound queue. The
/// socket writer owns the receiving half and stops once every sender is
/// gone; [`Connection::close`] additionally fires the [`CloseSignal`].
#[derive(Debug, Clone)]
pub struct Connection {
    /// Identity assigned at accept time
    pub id: ConnectionId,
    /// Timestamp when the transport was accepted
    pub connected_at: Timestamp,
    state: ConnectionState,
    outbound: mpsc::Sender<Payload>,
    closed: CloseSignal,
}

impl Connection {
    /// Create a connection in the `Connecting` state.
    pub fn new(id: ConnectionId, outbound: mpsc::Sender<Payload>, connected_at: Timestamp) -> Self {
        Self {
            id,
            connected_at,
            state: ConnectionState::Connecting,
            outbound,
            closed: CloseSignal::default(),
        }
    }

    /// Handle for the socket side to learn that the relay closed this connection.
    pub fn close_signal(&self) -> CloseSignal {
        self.closed.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Only open connections receive broadcasts.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: ConnectionState) -> Result<(), ConnectionStateError> {
        if !self.state.can_transition_to(next) {
            return Err(ConnectionStateError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Mark the connection open. Already open connections are left as is.
    pub fn open(&mut self) -> Result<(), ConnectionStateError> {
        if self.is_open() {
            return Ok(());
        }
        self.transition(ConnectionState::Open)
    }

    /// Mark the connection closed and fire its [`CloseSignal`].
    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
        self.closed.fire();
    }

    /// Push a payload onto the outbound queue without waiting.
    ///
    /// A full queue is reported as [`SendFailure::QueueFull`] rather than
    /// blocking the caller; a dropped writer as [`SendFailure::Closed`].
    pub fn try_send(&self, payload: Payload) -> Result<(), SendFailure> {
        self.outbound.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => SendFailure::QueueFull,
            TrySendError::Closed(_) => SendFailure::Closed,
        })
    }
}
