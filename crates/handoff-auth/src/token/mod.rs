//! Token issuance and redemption.
//!
//! - [`TokenIssuer`] mints a token for an enabled app and persists it
//! - [`TokenValidator`] redeems a token exactly once
//!
//! Both return business outcomes as enum variants and reserve
//! [`HandoffError`](crate::HandoffError) for infrastructure failures.

pub mod issuer;
pub mod validator;

pub use issuer::{IssueOutcome, IssuedToken, TokenIssuer};
pub use validator::{RedeemOutcome, TokenValidator};
