//! # handoff-auth
//!
//! Single-sign-on token broker for handing an authenticated portal user off
//! to a downstream application.
//!
//! This crate provides:
//! - A registry of downstream applications built from configuration
//! - Issuance of short-lived, single-use handoff tokens
//! - Atomic one-time redemption of those tokens
//! - Axum handlers and extractors for the SSO endpoints
//!
//! ## Overview
//!
//! The portal calls [`SsoBroker::request_handoff`] for the logged-in
//! principal and sends the browser to the returned URL. The downstream
//! app's backend then calls [`SsoBroker::complete_handoff`] with the token
//! it received and gets the principal's identity back, at most once.
//!
//! ## Modules
//!
//! - [`config`] - SSO configuration (TTL, store timeout, app table)
//! - [`registry`] - Downstream application lookup
//! - [`token`] - Token issuer and validator
//! - [`broker`] - Facade combining the two
//! - [`storage`] - Storage traits and the in-memory backend
//! - [`middleware`] - Principal extractor and error responses
//! - [`http`] - Axum handlers for the SSO endpoints

pub mod broker;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod registry;
pub mod storage;
pub mod token;
pub mod types;

pub use broker::SsoBroker;
pub use config::{AppEntry, ConfigError, SsoConfig};
pub use error::{ErrorCategory, HandoffError};
pub use http::{SsoState, redemption_routes, session_routes, sso_routes};
pub use middleware::{AuthenticatedPrincipal, Unauthenticated};
pub use registry::{AppRegistry, ConfigAppRegistry};
pub use storage::{ConsumedToken, InMemoryStorage, PrincipalStorage, SsoTokenStorage};
pub use token::{IssueOutcome, IssuedToken, RedeemOutcome, TokenIssuer, TokenValidator};
pub use types::{AppDescriptor, Principal, PrincipalStatus, PrincipalView, SsoToken};

/// Type alias for broker results.
pub type HandoffResult<T> = Result<T, HandoffError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use handoff_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::HandoffResult;
    pub use crate::broker::SsoBroker;
    pub use crate::config::{AppEntry, ConfigError, SsoConfig};
    pub use crate::error::{ErrorCategory, HandoffError};
    pub use crate::http::{SsoState, sso_routes};
    pub use crate::middleware::AuthenticatedPrincipal;
    pub use crate::registry::{AppRegistry, ConfigAppRegistry};
    pub use crate::storage::{
        ConsumedToken, InMemoryStorage, PrincipalStorage, SsoTokenStorage,
    };
    pub use crate::token::{IssueOutcome, IssuedToken, RedeemOutcome};
    pub use crate::types::{AppDescriptor, Principal, PrincipalStatus, PrincipalView, SsoToken};
}
