//! HTTP handlers for the SSO endpoints.
//!
//! # Available Handlers
//!
//! - [`generate`] - `POST /sso/generate`, issue a token for the session principal
//! - [`validate`] - `POST /sso/validate`, redeem a token (called by downstream apps)
//! - [`redirect`] - `GET /sso/redirect/{app}`, issue and 303 to the app
//! - [`apps`] - `GET /sso/apps`, enabled apps for the portal dashboard
//!
//! # Usage
//!
//! ```ignore
//! use handoff_auth::http::{SsoState, sso_routes};
//!
//! let app = axum::Router::new()
//!     .merge(sso_routes())
//!     .with_state(SsoState::new(broker, "/dashboard"));
//! ```

pub mod apps;
pub mod generate;
pub mod redirect;
pub mod validate;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::broker::SsoBroker;

pub use apps::apps_handler;
pub use generate::generate_handler;
pub use redirect::redirect_handler;
pub use validate::validate_handler;

/// Shared state for the SSO handlers.
#[derive(Clone)]
pub struct SsoState {
    /// The broker all handlers delegate to.
    pub broker: Arc<SsoBroker>,
    /// Portal page to return to when a redirect handoff is unavailable.
    pub portal_url: Arc<str>,
}

impl SsoState {
    /// Creates a new SSO state.
    pub fn new(broker: Arc<SsoBroker>, portal_url: impl Into<Arc<str>>) -> Self {
        Self {
            broker,
            portal_url: portal_url.into(),
        }
    }
}

/// Router with all SSO endpoints, including the `/app/{app}` alias.
pub fn sso_routes() -> Router<SsoState> {
    session_routes().merge(redemption_routes())
}

/// Endpoints that act for the logged-in portal principal.
pub fn session_routes() -> Router<SsoState> {
    Router::new()
        .route("/sso/generate", post(generate_handler))
        .route("/sso/redirect/{app}", get(redirect_handler))
        .route("/app/{app}", get(redirect_handler))
        .route("/sso/apps", get(apps_handler))
}

/// Server-to-server redemption; needs no portal session.
pub fn redemption_routes() -> Router<SsoState> {
    Router::new().route("/sso/validate", post(validate_handler))
}
