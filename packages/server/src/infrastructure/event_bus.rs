//! In-process fan-out of relay lifecycle events.
//!
//! Uses a tokio broadcast channel so any number of collaborators can observe
//! opened/received/closed events without the relay knowing about them.

use tokio::sync::broadcast;

use crate::domain::RelayEvent;

/// Default number of events buffered before slow subscribers start lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Publisher side of the relay event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RelayEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: RelayEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("no event subscribers");
        }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
