//! SSO token storage trait.
//!
//! # Implementation Notes
//!
//! Implementations should:
//!
//! - Enforce uniqueness of the token string (the authoritative collision guard)
//! - Support efficient lookup by token string
//! - Implement `consume` as a single conditional update
//!
//! # Security Considerations
//!
//! - Never log token strings; log the row id instead
//! - A read followed by a separate write is not an acceptable `consume`:
//!   two concurrent redeemers could both observe `used_at IS NULL`

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::HandoffResult;
use crate::types::{PrincipalView, SsoToken};

/// A token that was just consumed, with the principal it was issued for.
#[derive(Debug, Clone)]
pub struct ConsumedToken {
    /// The token row after the update (`used_at` is set).
    pub token: SsoToken,
    /// Projection of the owning principal at redemption time.
    pub principal: PrincipalView,
}

/// Storage trait for SSO tokens.
///
/// # Example Implementation
///
/// ```ignore
/// use handoff_auth::storage::{ConsumedToken, SsoTokenStorage};
/// use handoff_auth::types::SsoToken;
/// use handoff_auth::HandoffResult;
///
/// struct LoggingStorage<S> {
///     inner: S,
/// }
///
/// #[async_trait::async_trait]
/// impl<S: SsoTokenStorage> SsoTokenStorage for LoggingStorage<S> {
///     async fn create(&self, token: &SsoToken) -> HandoffResult<()> {
///         tracing::debug!(token_id = %token.id, "storing token");
///         self.inner.create(token).await
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait SsoTokenStorage: Send + Sync {
    /// Persists a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::TokenCollision`](crate::HandoffError::TokenCollision)
    /// if the token string already exists. The existing row must be left
    /// untouched. Any other failure is a storage error.
    async fn create(&self, token: &SsoToken) -> HandoffResult<()>;

    /// Finds a token by its exact string, regardless of its state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_token(&self, token: &str) -> HandoffResult<Option<SsoToken>>;

    /// Atomically redeems a token.
    ///
    /// Sets `used_at = now` only if all of the following hold at the moment
    /// of the update:
    ///
    /// - a row with this exact token string exists
    /// - `used_at` is null
    /// - `now < expires_at`
    /// - the owning principal is active and not soft-deleted
    ///
    /// Returns `None` if any condition fails; in that case nothing is
    /// modified.
    ///
    /// # Atomicity
    ///
    /// The check and the mark must be one step. In SQL:
    ///
    /// ```sql
    /// UPDATE sso_token t
    /// SET used_at = $2
    /// FROM principal p
    /// WHERE t.token = $1 AND t.used_at IS NULL AND t.expires_at > $2
    ///   AND p.id = t.principal_id AND p.status = 'active' AND p.deleted_at IS NULL
    /// RETURNING ...
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage operation itself fails.
    async fn consume(&self, token: &str, now: OffsetDateTime)
    -> HandoffResult<Option<ConsumedToken>>;
}
