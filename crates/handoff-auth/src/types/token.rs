//! SSO token records.
//!
//! # Lifecycle
//!
//! 1. Created by the issuer when a handoff to an enabled app is requested
//! 2. Handed to the browser as `callback_url?token=...`
//! 3. Redeemed once by the downstream app's backend (`used_at` set)
//!
//! Tokens are never deleted by the broker; retention is a housekeeping
//! concern outside this crate.
//!
//! # Security
//!
//! - Token strings are 256 bits from the thread-local CSPRNG, hex-encoded
//! - Expiry is fixed at issuance and never extended
//! - `used_at` moves from `None` to `Some` exactly once

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Number of random bytes in a token.
pub const TOKEN_BYTES: usize = 32;

/// Length of the encoded token string.
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// A single-use handoff token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoToken {
    /// Row identifier. Safe to log, unlike `token`.
    pub id: Uuid,

    /// Principal the token was issued for.
    pub principal_id: Uuid,

    /// Opaque token string (`TOKEN_LENGTH` lowercase hex characters).
    pub token: String,

    /// Key of the app the token was issued for.
    pub app: String,

    /// Callback URL captured at issuance. Later configuration changes do not
    /// affect already issued tokens.
    pub callback_url: String,

    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Redemption timestamp. `None` until the token is consumed.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub used_at: Option<OffsetDateTime>,
}

impl SsoToken {
    /// Builds a fresh, unused token for `principal_id` and `app`.
    ///
    /// `issued_at` is `now` and `expires_at` is `now + ttl`.
    #[must_use]
    pub fn issue(
        principal_id: Uuid,
        app: impl Into<String>,
        callback_url: impl Into<String>,
        now: OffsetDateTime,
        ttl: time::Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal_id,
            token: generate_token(),
            app: app.into(),
            callback_url: callback_url.into(),
            issued_at: now,
            expires_at: now + ttl,
            used_at: None,
        }
    }

    /// Returns `true` if the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the token has been redeemed.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Returns `true` if the token can still be redeemed at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        !self.is_used() && !self.is_expired_at(now)
    }
}

/// Generates a new token string.
///
/// 32 bytes from `rand::thread_rng()` (a CSPRNG reseeded from the OS),
/// hex-encoded to 64 characters.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    hex::encode(bytes)
}

/// Returns `true` if `token` has the shape of a token this broker issues.
///
/// Used to reject malformed input before it reaches the store.
#[must_use]
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_hexdigit())
}
