//! Core data model for the SSO broker.

pub mod app;
pub mod principal;
pub mod token;

pub use app::{AppDescriptor, append_query_param};
pub use principal::{Principal, PrincipalStatus, PrincipalView};
pub use token::{SsoToken, TOKEN_BYTES, TOKEN_LENGTH, generate_token, is_well_formed_token};
