//! Arc-owning storage adapters.
//!
//! These adapters wrap the lifetime-based storage types and own an
//! `Arc<PgPool>`, so they can be handed to the broker as
//! `Arc<dyn SsoTokenStorage>` / `Arc<dyn PrincipalStorage>`.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use handoff_auth::storage::{
    ConsumedToken, PrincipalStorage as PrincipalStorageTrait,
    SsoTokenStorage as SsoTokenStorageTrait,
};
use handoff_auth::types::{Principal, SsoToken};
use handoff_auth::{HandoffError, HandoffResult};

use crate::principal::PrincipalStorage;
use crate::token::TokenStorage;
use crate::{PgPool, StorageError};

/// Maps a storage error into the broker's error type.
///
/// Unique violations become [`HandoffError::TokenCollision`]; everything
/// else is an opaque storage failure.
fn to_handoff_error(e: StorageError) -> HandoffError {
    if e.is_conflict() {
        HandoffError::TokenCollision
    } else {
        HandoffError::storage(e.to_string())
    }
}

// =============================================================================
// Arc-Owning Token Storage
// =============================================================================

/// Arc-owning PostgreSQL SSO token storage adapter.
#[derive(Clone)]
pub struct ArcSsoTokenStorage {
    pool: Arc<PgPool>,
}

impl ArcSsoTokenStorage {
    /// Create a new Arc-owning token storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SsoTokenStorageTrait for ArcSsoTokenStorage {
    async fn create(&self, token: &SsoToken) -> HandoffResult<()> {
        let storage = TokenStorage::new(&self.pool);
        storage.create(token).await.map_err(to_handoff_error)
    }

    async fn find_by_token(&self, token: &str) -> HandoffResult<Option<SsoToken>> {
        let storage = TokenStorage::new(&self.pool);
        storage.find_by_token(token).await.map_err(to_handoff_error)
    }

    async fn consume(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> HandoffResult<Option<ConsumedToken>> {
        let storage = TokenStorage::new(&self.pool);
        storage.consume(token, now).await.map_err(to_handoff_error)
    }
}

// =============================================================================
// Arc-Owning Principal Storage
// =============================================================================

/// Arc-owning PostgreSQL principal storage adapter.
#[derive(Clone)]
pub struct ArcPrincipalStorage {
    pool: Arc<PgPool>,
}

impl ArcPrincipalStorage {
    /// Create a new Arc-owning principal storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Insert or update a principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn upsert(&self, principal: &Principal) -> HandoffResult<()> {
        let storage = PrincipalStorage::new(&self.pool);
        storage.upsert(principal).await.map_err(to_handoff_error)
    }
}

#[async_trait]
impl PrincipalStorageTrait for ArcPrincipalStorage {
    async fn find_by_id(&self, id: Uuid) -> HandoffResult<Option<Principal>> {
        let storage = PrincipalStorage::new(&self.pool);
        storage.find_by_id(id).await.map_err(to_handoff_error)
    }
}
