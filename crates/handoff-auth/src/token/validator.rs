//! Token redemption.
//!
//! Redemption is a single atomic consume in the store. The validator adds a
//! shape check in front of it and collapses every rejection reason into
//! [`RedeemOutcome::Invalid`].

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::HandoffResult;
use crate::config::SsoConfig;
use crate::storage::{SsoTokenStorage, with_timeout};
use crate::types::{PrincipalView, is_well_formed_token};

/// Result of a redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The token was valid and is now used.
    Redeemed(PrincipalView),
    /// Unknown, malformed, used, expired, or issued to an inactive principal.
    Invalid,
}

impl RedeemOutcome {
    /// Returns the principal projection on success.
    #[must_use]
    pub fn principal(self) -> Option<PrincipalView> {
        match self {
            Self::Redeemed(view) => Some(view),
            Self::Invalid => None,
        }
    }
}

/// Redeems tokens presented by downstream applications.
pub struct TokenValidator {
    storage: Arc<dyn SsoTokenStorage>,
    store_timeout: Duration,
}

impl TokenValidator {
    pub fn new(storage: Arc<dyn SsoTokenStorage>, config: &SsoConfig) -> Self {
        Self {
            storage,
            store_timeout: config.store_timeout,
        }
    }

    /// Redeems `token` now.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store failed or timed out. Rejections
    /// are [`RedeemOutcome::Invalid`].
    pub async fn redeem(&self, token: &str) -> HandoffResult<RedeemOutcome> {
        self.redeem_at(token, OffsetDateTime::now_utc()).await
    }

    /// Redeems `token` as of `now`.
    ///
    /// # Errors
    ///
    /// See [`redeem`](Self::redeem).
    pub async fn redeem_at(&self, token: &str, now: OffsetDateTime) -> HandoffResult<RedeemOutcome> {
        if !is_well_formed_token(token) {
            tracing::debug!(length = token.len(), "Rejected malformed SSO token");
            return Ok(RedeemOutcome::Invalid);
        }

        let consumed = with_timeout(
            self.store_timeout,
            "consume",
            self.storage.consume(token, now),
        )
        .await?;

        match consumed {
            Some(consumed) => {
                tracing::info!(
                    token_id = %consumed.token.id,
                    app = %consumed.token.app,
                    principal_id = %consumed.principal.id,
                    "SSO token redeemed"
                );
                Ok(RedeemOutcome::Redeemed(consumed.principal))
            }
            None => {
                tracing::debug!("SSO token rejected");
                Ok(RedeemOutcome::Invalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::HandoffError;
    use crate::registry::ConfigAppRegistry;
    use crate::storage::{ConsumedToken, InMemoryStorage};
    use crate::token::{IssueOutcome, TokenIssuer};
    use crate::types::{AppDescriptor, Principal, PrincipalStatus, SsoToken};

    struct Fixture {
        storage: Arc<InMemoryStorage>,
        issuer: TokenIssuer,
        validator: TokenValidator,
        principal: Principal,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let registry = Arc::new(ConfigAppRegistry::new([AppDescriptor::new(
            "cobit",
            "http://cobit.local/sso/callback",
        )]));
        let config = SsoConfig::default();
        let principal = Principal::new("fb-1", "Ayu", "ayu@example.com", "user");
        storage.upsert_principal(principal.clone());

        Fixture {
            issuer: TokenIssuer::new(registry, storage.clone(), &config),
            validator: TokenValidator::new(storage.clone(), &config),
            storage,
            principal,
        }
    }

    async fn issue(f: &Fixture, now: OffsetDateTime) -> String {
        match f.issuer.issue_at(&f.principal, "cobit", now).await.unwrap() {
            IssueOutcome::Issued(issued) => issued.token,
            IssueOutcome::Unavailable => panic!("cobit should be available"),
        }
    }

    #[tokio::test]
    async fn test_redeem_once() {
        let f = fixture();
        let token = issue(&f, OffsetDateTime::now_utc()).await;

        let view = f.validator.redeem(&token).await.unwrap().principal().unwrap();
        assert_eq!(view, f.principal.view());

        assert_eq!(f.validator.redeem(&token).await.unwrap(), RedeemOutcome::Invalid);
    }

    #[tokio::test]
    async fn test_redeem_at_expiry_boundary() {
        let f = fixture();
        let issued_at = OffsetDateTime::now_utc();
        let token = issue(&f, issued_at).await;
        let expiry = issued_at + time::Duration::minutes(5);

        assert_eq!(
            f.validator.redeem_at(&token, expiry).await.unwrap(),
            RedeemOutcome::Invalid
        );
        assert_eq!(
            f.validator
                .redeem_at(&token, expiry + time::Duration::seconds(1))
                .await
                .unwrap(),
            RedeemOutcome::Invalid
        );

        // A rejected attempt leaves the token untouched.
        let stored = f.storage.find_by_token(&token).await.unwrap().unwrap();
        assert!(stored.used_at.is_none());

        let just_before = expiry - time::Duration::seconds(1);
        assert!(matches!(
            f.validator.redeem_at(&token, just_before).await.unwrap(),
            RedeemOutcome::Redeemed(_)
        ));
    }

    #[tokio::test]
    async fn test_redeem_token_created_already_expired() {
        let f = fixture();
        let token = issue(&f, OffsetDateTime::now_utc() - time::Duration::minutes(6)).await;
        assert_eq!(f.validator.redeem(&token).await.unwrap(), RedeemOutcome::Invalid);
    }

    #[tokio::test]
    async fn test_redeem_after_principal_suspended() {
        let f = fixture();
        let token = issue(&f, OffsetDateTime::now_utc()).await;

        let mut suspended = f.principal.clone();
        suspended.status = PrincipalStatus::Suspended;
        f.storage.upsert_principal(suspended);

        assert_eq!(f.validator.redeem(&token).await.unwrap(), RedeemOutcome::Invalid);
    }

    #[tokio::test]
    async fn test_malformed_tokens_are_invalid() {
        let f = fixture();
        let long = "a".repeat(65);
        let non_hex = "g".repeat(64);
        for token in ["", "short", long.as_str(), non_hex.as_str()] {
            assert_eq!(
                f.validator.redeem(token).await.unwrap(),
                RedeemOutcome::Invalid
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let f = fixture();
        let unknown = crate::types::generate_token();
        assert_eq!(f.validator.redeem(&unknown).await.unwrap(), RedeemOutcome::Invalid);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeem_single_success() {
        let f = fixture();
        let token = issue(&f, OffsetDateTime::now_utc()).await;
        let validator = Arc::new(f.validator);

        let (a, b) = tokio::join!(
            {
                let validator = validator.clone();
                let token = token.clone();
                tokio::spawn(async move { validator.redeem(&token).await.unwrap() })
            },
            {
                let validator = validator.clone();
                let token = token.clone();
                tokio::spawn(async move { validator.redeem(&token).await.unwrap() })
            }
        );

        let successes = [a.unwrap(), b.unwrap()]
            .into_iter()
            .filter(|outcome| matches!(outcome, RedeemOutcome::Redeemed(_)))
            .count();
        assert_eq!(successes, 1);
    }

    struct UnreachableStorage;

    #[async_trait]
    impl SsoTokenStorage for UnreachableStorage {
        async fn create(&self, _token: &SsoToken) -> HandoffResult<()> {
            Err(HandoffError::storage("connection reset"))
        }

        async fn find_by_token(&self, _token: &str) -> HandoffResult<Option<SsoToken>> {
            Err(HandoffError::storage("connection reset"))
        }

        async fn consume(
            &self,
            _token: &str,
            _now: OffsetDateTime,
        ) -> HandoffResult<Option<ConsumedToken>> {
            Err(HandoffError::storage("connection reset"))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_not_invalid() {
        let validator = TokenValidator::new(Arc::new(UnreachableStorage), &SsoConfig::default());
        let token = crate::types::generate_token();

        let err = validator.redeem(&token).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_token_skips_store() {
        let validator = TokenValidator::new(Arc::new(UnreachableStorage), &SsoConfig::default());
        assert_eq!(
            validator.redeem("not-a-token").await.unwrap(),
            RedeemOutcome::Invalid
        );
    }
}
