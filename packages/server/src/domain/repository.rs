//! Registry contract.
//!
//! The domain owns the trait; storage lives in the infrastructure layer and
//! use cases depend only on this abstraction.

use async_trait::async_trait;

use super::{entity::Connection, error::RegistryError, value_object::ConnectionId};

/// The authoritative set of currently active peer connections.
///
/// Every operation is atomic with respect to the others: a snapshot never
/// observes a half-inserted or half-removed entry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Insert a connection, moving it to `Open`.
    ///
    /// Fails with [`RegistryError::DuplicateIdentity`] if the identity is
    /// already present.
    async fn add(&self, connection: Connection) -> Result<(), RegistryError>;

    /// Remove a connection, returning it in the `Closed` state.
    ///
    /// Returns `None` if the identity is absent, so repeated removal is a no-op.
    async fn remove(&self, id: &ConnectionId) -> Option<Connection>;

    /// Copy of the current entries for one broadcast pass.
    async fn snapshot(&self) -> Vec<Connection>;

    /// Number of registered connections.
    async fn count(&self) -> usize;

    /// Remove every connection, moving each to `Closing`.
    async fn drain(&self) -> Vec<Connection>;
}
