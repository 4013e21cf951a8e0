//! HTTP middleware glue.
//!
//! - [`AuthenticatedPrincipal`] extracts the principal an upstream layer
//!   attached to the request
//! - `IntoResponse` for [`HandoffError`](crate::HandoffError) renders the
//!   opaque infrastructure error body
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use handoff_auth::middleware::AuthenticatedPrincipal;
//!
//! async fn whoami(AuthenticatedPrincipal(principal): AuthenticatedPrincipal) -> String {
//!     principal.email
//! }
//!
//! let app = Router::new().route("/whoami", get(whoami));
//! ```

pub mod auth;
pub mod error;

pub use auth::{AuthenticatedPrincipal, Unauthenticated};
pub use error::error_json;
