//! InMemory 実装

mod connection;

pub use connection::InMemoryConnectionRegistry;
