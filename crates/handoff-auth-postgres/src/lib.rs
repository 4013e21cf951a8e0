//! PostgreSQL storage backend for handoff-auth
//!
//! Provides persistent storage for:
//!
//! - SSO tokens (`sso_token` table)
//! - Principals (`principal` table, read by the broker and seeded by tooling)
//!
//! The schema is created by the embedded migrations in [`migrations`].
//!
//! # Example
//!
//! ```ignore
//! use handoff_auth_postgres::PostgresSsoStorage;
//!
//! let storage = PostgresSsoStorage::connect("postgres://localhost/handoff").await?;
//! storage.migrate().await?;
//!
//! let token = storage.tokens().find_by_token(&value).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod principal;
pub mod storage_adapters;
pub mod token;

use std::sync::Arc;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use pool::{create_pool, mask_password};
pub use principal::PrincipalStorage;
pub use storage_adapters::{ArcPrincipalStorage, ArcSsoTokenStorage};
pub use token::TokenStorage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during SSO storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Resource already exists (conflict).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Applying the embedded migrations failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a `Migration` error.
    #[must_use]
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if this is a database error.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns `true` if this is a server error (5xx equivalent).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_conflict()
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// PostgreSQL SSO Storage
// =============================================================================

/// PostgreSQL storage backend for broker data.
///
/// Holds a connection pool and hands out the table-specific storages.
#[derive(Debug, Clone)]
pub struct PostgresSsoStorage {
    pool: Arc<PgPool>,
}

impl PostgresSsoStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create new storage by connecting to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        use sqlx_core::pool::PoolOptions;
        let pool = PoolOptions::<Postgres>::new().connect(database_url).await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        migrations::run(&self.pool).await
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the Arc-wrapped pool.
    #[must_use]
    pub fn pool_arc(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// Get token storage operations.
    #[must_use]
    pub fn tokens(&self) -> TokenStorage<'_> {
        TokenStorage::new(&self.pool)
    }

    /// Get principal storage operations.
    #[must_use]
    pub fn principals(&self) -> PrincipalStorage<'_> {
        PrincipalStorage::new(&self.pool)
    }

    /// Arc-owning token store for `Arc<dyn SsoTokenStorage>` consumers.
    #[must_use]
    pub fn token_store(&self) -> ArcSsoTokenStorage {
        ArcSsoTokenStorage::new(self.pool_arc())
    }

    /// Arc-owning principal store for `Arc<dyn PrincipalStorage>` consumers.
    #[must_use]
    pub fn principal_store(&self) -> ArcPrincipalStorage {
        ArcPrincipalStorage::new(self.pool_arc())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_conflict() {
        let err = StorageError::conflict("token already exists");
        assert!(err.is_conflict());
        assert!(!err.is_server_error());
        assert_eq!(err.to_string(), "Conflict: token already exists");
    }

    #[test]
    fn test_storage_error_migration() {
        let err = StorageError::migration("relation exists");
        assert!(!err.is_conflict());
        assert!(err.is_server_error());
        assert!(!err.is_database_error());
    }

    #[test]
    fn test_storage_error_from_sqlx() {
        let err: StorageError = sqlx_core::Error::PoolTimedOut.into();
        assert!(err.is_database_error());
        assert!(err.is_server_error());
    }
}
