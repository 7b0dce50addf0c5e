//! Domain layer for the relay.
//!
//! This module contains the connection model and the registry contract,
//! independent of the WebSocket transport and of how the registry is stored.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{CloseSignal, Connection, ConnectionState};
pub use error::{ConnectionStateError, RegistryError, SendFailure};
pub use event::{CloseReason, RelayEvent};
pub use factory::ConnectionIdFactory;
pub use repository::ConnectionRegistry;
#[cfg(test)]
pub use repository::MockConnectionRegistry;
pub use value_object::{ConnectionId, Payload, Timestamp};
