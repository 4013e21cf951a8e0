//! Broker facade.
//!
//! [`SsoBroker`] is the only entry point transports use. It wires the
//! registry, the issuer and the validator over one token store.

use std::sync::Arc;

use crate::HandoffResult;
use crate::config::SsoConfig;
use crate::registry::AppRegistry;
use crate::storage::SsoTokenStorage;
use crate::token::{IssueOutcome, RedeemOutcome, TokenIssuer, TokenValidator};
use crate::types::{AppDescriptor, Principal};

/// Portal-to-application handoff broker.
pub struct SsoBroker {
    registry: Arc<dyn AppRegistry>,
    issuer: TokenIssuer,
    validator: TokenValidator,
}

impl SsoBroker {
    /// Creates a broker over `registry` and `storage`.
    pub fn new(
        registry: Arc<dyn AppRegistry>,
        storage: Arc<dyn SsoTokenStorage>,
        config: &SsoConfig,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(registry.clone(), storage.clone(), config),
            validator: TokenValidator::new(storage, config),
            registry,
        }
    }

    /// Requests a handoff of `principal` to the app named `app_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store failed; see [`TokenIssuer::issue`].
    pub async fn request_handoff(
        &self,
        principal: &Principal,
        app_key: &str,
    ) -> HandoffResult<IssueOutcome> {
        self.issuer.issue(principal, app_key).await
    }

    /// Completes a handoff by redeeming `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store failed; see [`TokenValidator::redeem`].
    pub async fn complete_handoff(&self, token: &str) -> HandoffResult<RedeemOutcome> {
        self.validator.redeem(token).await
    }

    /// Read access to the application registry.
    #[must_use]
    pub fn registry(&self) -> &dyn AppRegistry {
        self.registry.as_ref()
    }

    /// Enabled applications in configuration order.
    #[must_use]
    pub fn enabled_apps(&self) -> Vec<AppDescriptor> {
        self.registry.enabled_apps()
    }
}
