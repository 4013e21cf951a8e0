//! SSO token storage.
//!
//! Tokens live in the `sso_token` table. The token string carries a unique
//! constraint, which is the authoritative collision guard.

use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use handoff_auth::storage::ConsumedToken;
use handoff_auth::types::{PrincipalView, SsoToken};

use crate::{PgPool, StorageError, StorageResult};

// =============================================================================
// Types
// =============================================================================

type TokenTuple = (
    Uuid,
    Uuid,
    String,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
);

type ConsumedTuple = (
    Uuid,
    Uuid,
    String,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    String,
    String,
    String,
    String,
);

fn token_from_tuple(row: TokenTuple) -> SsoToken {
    SsoToken {
        id: row.0,
        principal_id: row.1,
        token: row.2,
        app: row.3,
        callback_url: row.4,
        issued_at: row.5,
        expires_at: row.6,
        used_at: row.7,
    }
}

fn consumed_from_tuple(row: ConsumedTuple) -> ConsumedToken {
    let principal = PrincipalView {
        id: row.1,
        external_id: row.8,
        name: row.9,
        email: row.10,
        role: row.11,
    };
    ConsumedToken {
        token: token_from_tuple((row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7)),
        principal,
    }
}

// =============================================================================
// Token Storage
// =============================================================================

/// SSO token storage operations.
pub struct TokenStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenStorage<'a> {
    /// Create a new token storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if the token string already exists,
    /// or a database error if the insert fails.
    pub async fn create(&self, token: &SsoToken) -> StorageResult<()> {
        query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO sso_token (id, principal_id, token, app, callback_url, issued_at, expires_at, used_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(token.id)
        .bind(token.principal_id)
        .bind(&token.token)
        .bind(&token.app)
        .bind(&token.callback_url)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.used_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict(format!("SSO token '{}' collides", token.id));
            }
            StorageError::from(e)
        })?;

        Ok(())
    }

    /// Find a token by its exact string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(&self, token: &str) -> StorageResult<Option<SsoToken>> {
        let row: Option<TokenTuple> = query_as(
            r#"
            SELECT id, principal_id, token, app, callback_url, issued_at, expires_at, used_at
            FROM sso_token
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(token_from_tuple))
    }

    /// Atomically mark a token as used.
    ///
    /// A single conditional `UPDATE` checks that the token is unused and
    /// unexpired and that its principal is active, then sets `used_at`.
    /// Concurrent callers block on the row lock; the predicate is
    /// re-evaluated for the loser, which then matches no row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn consume(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StorageResult<Option<ConsumedToken>> {
        let row: Option<ConsumedTuple> = query_as(
            r#"
            UPDATE sso_token t
            SET used_at = $2
            FROM principal p
            WHERE t.token = $1
              AND t.used_at IS NULL
              AND t.expires_at > $2
              AND p.id = t.principal_id
              AND p.status = 'active'
              AND p.deleted_at IS NULL
            RETURNING t.id, t.principal_id, t.token, t.app, t.callback_url,
                      t.issued_at, t.expires_at, t.used_at,
                      p.external_id, p.name, p.email, p.role
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(consumed_from_tuple))
    }

    /// Count tokens issued for an app.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_for_app(&self, app: &str) -> StorageResult<i64> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM sso_token WHERE app = $1")
            .bind(app)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
