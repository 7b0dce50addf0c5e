//! WebSocket broadcast relay library.
//!
//! Every text frame received from a connected peer is fanned out to every
//! open connection, the sender included. Nothing is persisted.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use ui::{ServerConfig, run};
