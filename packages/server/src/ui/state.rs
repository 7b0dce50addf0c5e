//! Server state shared by every connection handler.

use std::{num::NonZeroUsize, sync::Arc};

use crate::{
    domain::ConnectionRegistry,
    infrastructure::{EventBus, InMemoryConnectionRegistry},
};

/// Shared application state
pub struct AppState {
    /// Registry（データアクセス層の抽象化）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// Lifecycle events for external collaborators
    pub events: EventBus,
    /// Bound of each connection's outbound queue
    pub outbound_capacity: NonZeroUsize,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        events: EventBus,
        outbound_capacity: NonZeroUsize,
    ) -> Self {
        Self {
            registry,
            events,
            outbound_capacity,
        }
    }

    /// State backed by an empty in-memory registry.
    pub fn in_memory(outbound_capacity: NonZeroUsize) -> Self {
        Self::new(
            Arc::new(InMemoryConnectionRegistry::new()),
            EventBus::default(),
            outbound_capacity,
        )
    }
}
