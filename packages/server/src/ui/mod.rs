//! WebSocket relay server implementation.

pub mod config;
mod handler;
mod listener;
mod runner;
mod signal;
pub mod state;

pub use config::ServerConfig;
pub use listener::RelayListener;
pub use runner::{ServerError, build_app, run, serve};
pub use signal::shutdown_signal;
