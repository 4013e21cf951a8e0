//! Principal lookup trait.
//!
//! Principals are owned by the identity/admin subsystem; the broker only
//! reads them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::HandoffResult;
use crate::types::Principal;

/// Read-only access to principals.
#[async_trait]
pub trait PrincipalStorage: Send + Sync {
    /// Finds a principal by id, including inactive and soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> HandoffResult<Option<Principal>>;
}
