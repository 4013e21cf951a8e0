//! In-process storage backend.
//!
//! Backs both [`SsoTokenStorage`] and [`PrincipalStorage`] with concurrent
//! hash maps. `consume` runs its check and its update while holding the
//! entry's shard lock, so two concurrent redeemers of the same token are
//! serialized and only the first one wins.
//!
//! Nothing is persisted; a restart forgets every token.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{ConsumedToken, PrincipalStorage, SsoTokenStorage};
use crate::HandoffResult;
use crate::error::HandoffError;
use crate::types::{Principal, SsoToken};

/// In-memory token and principal store.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tokens: DashMap<String, SsoToken>,
    principals: DashMap<Uuid, Principal>,
}

impl InMemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a principal.
    pub fn upsert_principal(&self, principal: Principal) {
        self.principals.insert(principal.id, principal);
    }

    /// Returns the number of stored tokens, used or not.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl SsoTokenStorage for InMemoryStorage {
    async fn create(&self, token: &SsoToken) -> HandoffResult<()> {
        match self.tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(HandoffError::TokenCollision),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_by_token(&self, token: &str) -> HandoffResult<Option<SsoToken>> {
        Ok(self.tokens.get(token).map(|entry| entry.value().clone()))
    }

    async fn consume(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> HandoffResult<Option<ConsumedToken>> {
        let Some(mut entry) = self.tokens.get_mut(token) else {
            return Ok(None);
        };

        if !entry.is_valid_at(now) {
            return Ok(None);
        }

        let principal = match self.principals.get(&entry.principal_id) {
            Some(p) if p.is_active() => p.view(),
            _ => return Ok(None),
        };

        entry.used_at = Some(now);
        Ok(Some(ConsumedToken {
            token: entry.value().clone(),
            principal,
        }))
    }
}

#[async_trait]
impl PrincipalStorage for InMemoryStorage {
    async fn find_by_id(&self, id: Uuid) -> HandoffResult<Option<Principal>> {
        Ok(self.principals.get(&id).map(|p| p.value().clone()))
    }
}
