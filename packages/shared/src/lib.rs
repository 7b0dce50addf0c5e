//! Shared utilities for the Solace workspace.

pub mod logger;
pub mod time;
