//! Infrastructure layer: concrete registry storage and event delivery.

pub mod event_bus;
pub mod repository;

pub use event_bus::EventBus;
pub use repository::InMemoryConnectionRegistry;
