//! Token issuance.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::HandoffResult;
use crate::config::{MAX_APP_KEY_LENGTH, SsoConfig};
use crate::registry::AppRegistry;
use crate::storage::{SsoTokenStorage, with_timeout};
use crate::types::{Principal, SsoToken};

/// A freshly issued token and where to send the browser with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The token string. Single use.
    pub token: String,
    /// Callback URL with the token attached as a query parameter.
    pub redirect_url: String,
    pub expires_at: OffsetDateTime,
}

/// Result of a handoff request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Issued(IssuedToken),
    /// The app is unknown or disabled. Nothing was written.
    Unavailable,
}

impl IssueOutcome {
    /// Returns the issued token, if any.
    #[must_use]
    pub fn issued(self) -> Option<IssuedToken> {
        match self {
            Self::Issued(token) => Some(token),
            Self::Unavailable => None,
        }
    }
}

/// Mints single-use tokens for enabled downstream applications.
pub struct TokenIssuer {
    registry: Arc<dyn AppRegistry>,
    storage: Arc<dyn SsoTokenStorage>,
    ttl: time::Duration,
    store_timeout: Duration,
}

impl TokenIssuer {
    /// Creates an issuer with the TTL and store timeout from `config`.
    pub fn new(
        registry: Arc<dyn AppRegistry>,
        storage: Arc<dyn SsoTokenStorage>,
        config: &SsoConfig,
    ) -> Self {
        Self {
            registry,
            storage,
            ttl: config.token_ttl(),
            store_timeout: config.store_timeout,
        }
    }

    /// Issues a token for `principal` to hand off to `app_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token could not be persisted (store failure,
    /// timeout, or a token collision). An unavailable app is not an error.
    pub async fn issue(&self, principal: &Principal, app_key: &str) -> HandoffResult<IssueOutcome> {
        self.issue_at(principal, app_key, OffsetDateTime::now_utc())
            .await
    }

    /// Same as [`issue`](Self::issue) with an explicit issuance time.
    ///
    /// # Errors
    ///
    /// See [`issue`](Self::issue).
    pub async fn issue_at(
        &self,
        principal: &Principal,
        app_key: &str,
        now: OffsetDateTime,
    ) -> HandoffResult<IssueOutcome> {
        if app_key.is_empty() || app_key.len() > MAX_APP_KEY_LENGTH {
            return Ok(IssueOutcome::Unavailable);
        }

        let Some(app) = self.registry.lookup(app_key).filter(|app| app.enabled) else {
            tracing::debug!(app = %app_key, principal_id = %principal.id, "App unavailable for handoff");
            return Ok(IssueOutcome::Unavailable);
        };

        let record = SsoToken::issue(principal.id, &app.key, &app.callback_url, now, self.ttl);

        with_timeout(self.store_timeout, "create", self.storage.create(&record)).await?;

        tracing::info!(
            token_id = %record.id,
            app = %app.key,
            principal_id = %principal.id,
            expires_at = %record.expires_at,
            "SSO token issued"
        );

        Ok(IssueOutcome::Issued(IssuedToken {
            redirect_url: app.redirect_url(&record.token),
            token: record.token,
            expires_at: record.expires_at,
        }))
    }
}
